//! Shared server-side validation error state.
//!
//! Backends reject malformed payment sources with field-level details, and
//! the surrounding field-rendering layer displays the rejected fields until
//! the next attempt. That pending state is process-wide from the renderer's
//! point of view, but it is held behind an explicit cloneable handle rather
//! than a global: the orchestrator resets it at the start of every
//! submission, and the API layer records into it on failure responses.

use std::sync::{Arc, Mutex};

/// Handle to the pending validation errors recorded by the most recent
/// submission attempt.
///
/// Cloning the handle shares the underlying state. The handle assumes a
/// single writer: concurrent submissions sharing one handle are undefined
/// and must be serialized by the caller.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    fields: Arc<Mutex<Vec<String>>>,
}

impl ValidationErrors {
    /// Creates an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears any errors recorded by a previous attempt.
    ///
    /// Called unconditionally at the start of every submission, before the
    /// flow branches and regardless of whether a later step fails.
    pub fn reset(&self) {
        self.fields.lock().expect("validation error state should not be poisoned").clear();
    }

    /// Records field names rejected by the backend.
    pub fn record<I>(&self, fields: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.fields
            .lock()
            .expect("validation error state should not be poisoned")
            .extend(fields);
    }

    /// Returns the currently recorded field names.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.fields.lock().expect("validation error state should not be poisoned").clone()
    }
}
