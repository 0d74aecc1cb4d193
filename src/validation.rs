use bigdecimal::{BigDecimal, Zero};

use crate::error::AppError;

pub const RECIPIENT_MIN_DIGITS: usize = 9;
pub const RECIPIENT_MAX_DIGITS: usize = 15;

pub fn validate_amount(amount: &BigDecimal) -> Result<(), AppError> {
    if amount <= &BigDecimal::zero() {
        return Err(AppError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

/// Recipient phone numbers: digits only after an optional leading '+',
/// within the international length range.
pub fn validate_recipient_phone(recipient: &str) -> Result<(), AppError> {
    let trimmed = recipient.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("recipient is required".to_string()));
    }

    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "recipient must be a phone number, got {:?}",
            recipient
        )));
    }
    if digits.len() < RECIPIENT_MIN_DIGITS || digits.len() > RECIPIENT_MAX_DIGITS {
        return Err(AppError::Validation(format!(
            "recipient must be {} to {} digits",
            RECIPIENT_MIN_DIGITS, RECIPIENT_MAX_DIGITS
        )));
    }

    Ok(())
}
