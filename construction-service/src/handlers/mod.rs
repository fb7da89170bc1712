//! REST handlers for construction-service.

pub mod customers;
pub mod dashboard;
pub mod estimates;
pub mod invoices;
pub mod jobs;
pub mod materials;
pub mod payments;
pub mod reports;
pub mod suppliers;
pub mod workers;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Default page size for list endpoints.
pub(crate) const DEFAULT_LIMIT: i32 = 50;

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("must not be negative"));
    }
    Ok(())
}

pub(crate) fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must be greater than zero"));
    }
    Ok(())
}

pub(crate) fn validate_tax_rate(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || *value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_rate_bounds() {
        assert!(validate_tax_rate(&Decimal::ZERO).is_ok());
        assert!(validate_tax_rate(&Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_tax_rate(&Decimal::from_str_exact("16.5").unwrap()).is_ok());
        assert!(validate_tax_rate(&Decimal::from_str_exact("-0.01").unwrap()).is_err());
        assert!(validate_tax_rate(&Decimal::from_str_exact("100.01").unwrap()).is_err());
    }

    #[test]
    fn amount_signs() {
        assert!(validate_non_negative(&Decimal::ZERO).is_ok());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&Decimal::ONE).is_ok());
        assert!(validate_non_negative(&Decimal::from_str_exact("-1").unwrap()).is_err());
    }
}
