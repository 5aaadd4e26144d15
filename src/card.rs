//! Card payment-source normalization.
//!
//! Converts the raw field values captured by the field-collection layer into
//! the normalized payment-source record the backend protocols consume.
//! Normalization is a pure function of the input snapshot; the snake_case
//! transport projection lives in [`crate::api::models`] and is applied only
//! at the order-confirmation boundary.

use serde::Serialize;

use crate::error::{Result, SubmitError};

/// Card field values captured for one submission attempt.
///
/// The snapshot is taken once per attempt by the field-collection
/// collaborator and is not re-read or re-validated by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInput {
    /// Card number as entered.
    pub number: String,
    /// Expiry as entered, e.g. `"12/27"` or `"2027-12"`.
    pub expiry: String,
    /// CVV/CVC as entered.
    pub security_code: String,
    /// Cardholder name, when the name field was rendered and valid.
    pub name: Option<String>,
    /// Billing postal code, when the postal field was rendered and valid.
    pub postal_code: Option<String>,
}

/// Billing address attached to a normalized card.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    /// Postal code, present only when collected and non-blank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Normalized card record with a `YYYY-MM` expiry.
///
/// Serializes with camelCase keys, the input naming the vault attach
/// mutation expects.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCard {
    /// Card number.
    pub number: String,
    /// Expiry in `YYYY-MM` form.
    pub expiry: String,
    /// CVV/CVC.
    pub security_code: String,
    /// Cardholder name, present only when collected and non-blank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Billing address, present only when a postal code was collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<BillingAddress>,
}

/// Normalized payment source: the funding instrument in the shape the
/// order and vault protocols consume.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NormalizedPaymentSource {
    /// The normalized card.
    pub card: NormalizedCard,
}

/// Converts a captured card snapshot into a normalized payment source.
///
/// Optional fields are included only when present and non-blank; the record
/// never carries empty-string placeholders.
///
/// # Errors
///
/// Returns [`SubmitError::InvalidExpiry`] when the expiry matches none of
/// the accepted shapes. The error message embeds the offending input
/// verbatim.
pub fn normalize(card: &CardInput) -> Result<NormalizedPaymentSource> {
    let expiry = normalize_expiry(&card.expiry)?;

    let name = card.name.as_deref().filter(|v| !v.trim().is_empty()).map(str::to_owned);
    let billing_address = card
        .postal_code
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|postal_code| BillingAddress { postal_code: Some(postal_code.to_owned()) });

    Ok(NormalizedPaymentSource {
        card: NormalizedCard {
            number: card.number.clone(),
            expiry,
            security_code: card.security_code.clone(),
            name,
            billing_address,
        },
    })
}

/// Normalizes a user-entered expiry into `YYYY-MM`.
///
/// Accepted shapes:
/// - `YYYY-MM` (also `YYYY-M`): returned unchanged
/// - `MM/YYYY`, `MM/YY`, `M/YY`, `M/YYYY`: converted; 2-digit years are
///   prefixed with `20`, single-digit months are zero-padded
///
/// # Errors
///
/// Returns [`SubmitError::InvalidExpiry`] for any other shape, with the
/// original input embedded verbatim in the message.
pub fn normalize_expiry(raw: &str) -> Result<String> {
    if is_year_month(raw) {
        return Ok(raw.to_owned());
    }

    if let Some((month, year)) = split_month_year(raw) {
        let year = if year.len() == 2 { format!("20{year}") } else { year.to_owned() };
        // month is validated as 1..=12, so parsing cannot fail
        let month: u8 = month.parse().map_err(|_| SubmitError::InvalidExpiry(raw.to_owned()))?;
        return Ok(format!("{year}-{month:02}"));
    }

    Err(SubmitError::InvalidExpiry(raw.to_owned()))
}

/// Recognizes the already-normalized `YYYY-M[M]` shape.
fn is_year_month(value: &str) -> bool {
    let Some((year, month)) = value.split_once('-') else {
        return false;
    };
    year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) && is_month(month)
}

/// Splits `M[M]/YY[YY]` into its month and year parts.
fn split_month_year(value: &str) -> Option<(&str, &str)> {
    let (month, year) = value.split_once('/')?;
    if !is_month(month) {
        return None;
    }
    if !(year.len() == 2 || year.len() == 4) || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((month, year))
}

/// Accepts `1`-`9`, `01`-`09` and `10`-`12`.
fn is_month(value: &str) -> bool {
    if value.is_empty() || value.len() > 2 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    matches!(value.parse::<u8>(), Ok(1..=12))
}
