use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "party_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Vendor,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_direction", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementDirection {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "commission_model", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CommissionModel {
    Discount,
    Markup,
    Flat,
}

impl CommissionModel {
    /// Parses admin input. Unknown values are a configuration error and are
    /// rejected rather than silently defaulted.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DISCOUNT" => Ok(CommissionModel::Discount),
            "MARKUP" => Ok(CommissionModel::Markup),
            "FLAT" => Ok(CommissionModel::Flat),
            other => Err(AppError::UnknownCommissionModel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "trxn_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrxnType {
    Airtime,
    Databundle,
    FundTransfer,
}

impl TrxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrxnType::Airtime => "AIRTIME",
            TrxnType::Databundle => "DATABUNDLE",
            TrxnType::FundTransfer => "FUND_TRANSFER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "trxn_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TrxnStatus {
    Pending,
    Success,
    Failed,
}

impl TrxnStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrxnStatus::Success | TrxnStatus::Failed)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Party {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub party_id: Uuid,
    pub balance: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WalletMovement {
    pub id: Uuid,
    pub party_id: Uuid,
    pub direction: MovementDirection,
    pub amount: BigDecimal,
    pub balance_after: BigDecimal,
    pub metadata: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CommissionSetting {
    pub party_id: Uuid,
    pub rate: BigDecimal,
    pub model: CommissionModel,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub reference: String,
    pub party_id: Uuid,
    pub trxn_type: TrxnType,
    pub amount: BigDecimal,
    pub commission: Option<BigDecimal>,
    pub vendor_cost: Option<BigDecimal>,
    pub recipient: Option<String>,
    pub network_id: Option<i32>,
    pub bundle_plan_id: Option<String>,
    pub status: TrxnStatus,
    pub provider_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        party_id: Uuid,
        trxn_type: TrxnType,
        amount: BigDecimal,
        commission: Option<BigDecimal>,
        vendor_cost: Option<BigDecimal>,
        recipient: Option<String>,
        network_id: Option<i32>,
        bundle_plan_id: Option<String>,
        status: TrxnStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference: new_reference(trxn_type),
            party_id,
            trxn_type,
            amount,
            commission,
            vendor_cost,
            recipient,
            network_id,
            bundle_plan_id,
            status,
            provider_response: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// References look like `AIRTIME_1730000000000_a1b2c3`. The random suffix
/// keeps concurrent creations within one millisecond apart; the unique index
/// on the column is the hard guarantee.
pub fn new_reference(trxn_type: TrxnType) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        trxn_type.as_str(),
        Utc::now().timestamp_millis(),
        &suffix[..6]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_carries_type_prefix() {
        let reference = new_reference(TrxnType::Airtime);
        assert!(reference.starts_with("AIRTIME_"));

        let reference = new_reference(TrxnType::FundTransfer);
        assert!(reference.starts_with("FUND_TRANSFER_"));
    }

    #[test]
    fn test_reference_shape() {
        let reference = new_reference(TrxnType::Databundle);
        let parts: Vec<&str> = reference.rsplitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 6);
        assert!(parts[1].parse::<i64>().is_ok());
    }

    #[test]
    fn test_references_do_not_collide_in_a_burst() {
        let refs: HashSet<String> = (0..1000).map(|_| new_reference(TrxnType::Airtime)).collect();
        assert_eq!(refs.len(), 1000);
    }

    #[test]
    fn test_only_terminal_statuses_freeze() {
        assert!(!TrxnStatus::Pending.is_terminal());
        assert!(TrxnStatus::Success.is_terminal());
        assert!(TrxnStatus::Failed.is_terminal());
    }

    #[test]
    fn test_commission_model_parse() {
        assert_eq!(
            CommissionModel::parse("discount").unwrap(),
            CommissionModel::Discount
        );
        assert_eq!(
            CommissionModel::parse("MARKUP").unwrap(),
            CommissionModel::Markup
        );
        assert_eq!(
            CommissionModel::parse(" flat ").unwrap(),
            CommissionModel::Flat
        );
    }

    #[test]
    fn test_commission_model_parse_rejects_unknown() {
        let err = CommissionModel::parse("COMMISSION").unwrap_err();
        assert!(matches!(err, AppError::UnknownCommissionModel(_)));
    }

    #[test]
    fn test_new_transaction_defaults() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            TrxnType::Airtime,
            BigDecimal::from(10),
            None,
            None,
            Some("0244000000".to_string()),
            Some(4),
            None,
            TrxnStatus::Pending,
        );
        assert_eq!(tx.status, TrxnStatus::Pending);
        assert!(tx.provider_response.is_none());
        assert!(tx.reference.starts_with("AIRTIME_"));
    }
}
