use bigdecimal::{BigDecimal, RoundingMode, Zero};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::models::{CommissionModel, CommissionSetting};
use crate::db::queries;
use crate::error::AppError;

pub const DEFAULT_RATE: &str = "0.02";
/// Upper bound for fractional models. FLAT rates are currency amounts and
/// are only required to be non-negative.
pub const MAX_FRACTIONAL_RATE: &str = "0.5";

/// A vendor's effective commission terms, configured or defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionTerms {
    pub rate: BigDecimal,
    pub model: CommissionModel,
}

impl CommissionTerms {
    pub fn default_terms() -> Self {
        Self {
            rate: BigDecimal::from_str(DEFAULT_RATE).unwrap_or_else(|_| BigDecimal::zero()),
            model: CommissionModel::Discount,
        }
    }
}

impl From<CommissionSetting> for CommissionTerms {
    fn from(setting: CommissionSetting) -> Self {
        Self {
            rate: setting.rate,
            model: setting.model,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostSplit {
    pub vendor_pays: BigDecimal,
    pub commission: BigDecimal,
}

fn round_minor(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Computes what the vendor pays and what the platform earns.
///
/// The commission is rounded to minor-unit precision first and vendor_pays is
/// derived from the rounded value. Rounding the two legs independently can
/// lose a cent between them, which the reconciliation invariants would catch
/// as a discrepancy.
pub fn compute_vendor_cost(
    terms: &CommissionTerms,
    base_amount: &BigDecimal,
) -> Result<CostSplit, AppError> {
    if base_amount <= &BigDecimal::zero() {
        return Err(AppError::InvalidAmount(format!(
            "base amount must be positive, got {}",
            base_amount
        )));
    }

    let (commission, vendor_pays) = match terms.model {
        CommissionModel::Discount => {
            let commission = round_minor(&(base_amount * &terms.rate));
            (commission.clone(), round_minor(&(base_amount - &commission)))
        }
        CommissionModel::Markup => {
            let commission = round_minor(&(base_amount * &terms.rate));
            (commission.clone(), round_minor(&(base_amount + &commission)))
        }
        CommissionModel::Flat => {
            // The rate is a flat currency amount under this model.
            let commission = round_minor(&terms.rate);
            (commission.clone(), round_minor(&(base_amount - &commission)))
        }
    };

    if vendor_pays <= BigDecimal::zero() {
        return Err(AppError::InvalidAmount(format!(
            "commission {} leaves nothing to pay on base {}",
            commission, base_amount
        )));
    }

    Ok(CostSplit {
        vendor_pays,
        commission,
    })
}

#[derive(Clone)]
pub struct CommissionService {
    pool: PgPool,
}

impl CommissionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loaded terms, or the platform default when the vendor has none, so
    /// every purchase has a defined cost before explicit configuration.
    pub async fn terms_for(&self, vendor_id: Uuid) -> Result<CommissionTerms, AppError> {
        let setting = queries::get_commission_setting(&self.pool, vendor_id).await?;
        Ok(setting
            .map(CommissionTerms::from)
            .unwrap_or_else(CommissionTerms::default_terms))
    }

    pub async fn cost_for(
        &self,
        vendor_id: Uuid,
        base_amount: &BigDecimal,
    ) -> Result<CostSplit, AppError> {
        let terms = self.terms_for(vendor_id).await?;
        compute_vendor_cost(&terms, base_amount)
    }

    pub async fn set_terms(
        &self,
        vendor_id: Uuid,
        rate: &BigDecimal,
        model: CommissionModel,
    ) -> Result<CommissionSetting, AppError> {
        validate_rate(rate, model)?;
        queries::upsert_commission_setting(&self.pool, vendor_id, rate, model).await
    }

    pub async fn get_setting(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<CommissionSetting>, AppError> {
        queries::get_commission_setting(&self.pool, vendor_id).await
    }
}

pub fn validate_rate(rate: &BigDecimal, model: CommissionModel) -> Result<(), AppError> {
    if rate < &BigDecimal::zero() {
        return Err(AppError::Validation("rate must not be negative".to_string()));
    }
    let max = BigDecimal::from_str(MAX_FRACTIONAL_RATE)
        .unwrap_or_else(|_| BigDecimal::zero());
    if model != CommissionModel::Flat && rate > &max {
        return Err(AppError::Validation(format!(
            "rate must be between 0 and {} for {:?} commissions",
            MAX_FRACTIONAL_RATE, model
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(rate: &str, model: CommissionModel) -> CommissionTerms {
        CommissionTerms {
            rate: BigDecimal::from_str(rate).unwrap(),
            model,
        }
    }

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_discount_splits_base() {
        let split =
            compute_vendor_cost(&terms("0.02", CommissionModel::Discount), &dec("100.00")).unwrap();
        assert_eq!(split.commission, dec("2.00"));
        assert_eq!(split.vendor_pays, dec("98.00"));
    }

    #[test]
    fn test_markup_adds_on_top() {
        let split =
            compute_vendor_cost(&terms("0.05", CommissionModel::Markup), &dec("100.00")).unwrap();
        assert_eq!(split.commission, dec("5.00"));
        assert_eq!(split.vendor_pays, dec("105.00"));
    }

    #[test]
    fn test_flat_rate_is_a_currency_amount() {
        let split =
            compute_vendor_cost(&terms("3.50", CommissionModel::Flat), &dec("100.00")).unwrap();
        assert_eq!(split.commission, dec("3.50"));
        assert_eq!(split.vendor_pays, dec("96.50"));
    }

    #[test]
    fn test_vendor_pays_derives_from_rounded_commission() {
        // Raw commission is 0.005: rounds to 0.01 half-away-from-zero, and
        // vendor_pays must be base minus that, not an independently rounded
        // 0.495 -> 0.50 which would lose a cent between the legs.
        let split =
            compute_vendor_cost(&terms("0.01", CommissionModel::Discount), &dec("0.50")).unwrap();
        assert_eq!(split.commission, dec("0.01"));
        assert_eq!(split.vendor_pays, dec("0.49"));
        assert_eq!(&split.vendor_pays + &split.commission, dec("0.50"));
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        let split =
            compute_vendor_cost(&terms("0.015", CommissionModel::Discount), &dec("10.05")).unwrap();
        // 10.05 * 0.015 = 0.150750
        assert_eq!(split.commission, dec("0.15"));
        assert_eq!(split.vendor_pays, dec("9.90"));

        let split =
            compute_vendor_cost(&terms("0.025", CommissionModel::Markup), &dec("9.90")).unwrap();
        // 9.90 * 0.025 = 0.2475 -> 0.25
        assert_eq!(split.commission, dec("0.25"));
        assert_eq!(split.vendor_pays, dec("10.15"));
    }

    #[test]
    fn test_zero_rate_means_free() {
        let split =
            compute_vendor_cost(&terms("0", CommissionModel::Discount), &dec("50.00")).unwrap();
        assert_eq!(split.commission, dec("0.00"));
        assert_eq!(split.vendor_pays, dec("50.00"));
    }

    #[test]
    fn test_rejects_non_positive_base() {
        let result = compute_vendor_cost(&terms("0.02", CommissionModel::Discount), &dec("0"));
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));

        let result = compute_vendor_cost(&terms("0.02", CommissionModel::Discount), &dec("-10"));
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    }

    #[test]
    fn test_rejects_flat_fee_swallowing_the_base() {
        let result = compute_vendor_cost(&terms("5.00", CommissionModel::Flat), &dec("4.00"));
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    }

    #[test]
    fn test_default_terms() {
        let terms = CommissionTerms::default_terms();
        assert_eq!(terms.model, CommissionModel::Discount);
        assert_eq!(terms.rate, dec("0.02"));
    }

    #[test]
    fn test_validate_rate_bounds() {
        assert!(validate_rate(&dec("0.5"), CommissionModel::Discount).is_ok());
        assert!(validate_rate(&dec("0.51"), CommissionModel::Discount).is_err());
        assert!(validate_rate(&dec("-0.1"), CommissionModel::Markup).is_err());
        // Flat rates are currency amounts and may exceed the fractional cap.
        assert!(validate_rate(&dec("3.50"), CommissionModel::Flat).is_ok());
    }
}
