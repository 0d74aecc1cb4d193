use bigdecimal::BigDecimal;
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog;
use crate::db::models::{
    CommissionModel, CommissionSetting, Party, Role, Transaction, TrxnStatus, TrxnType,
};
use crate::db::queries;
use crate::error::AppError;
use crate::provider::TppClient;
use crate::services::commission::CommissionService;
use crate::services::ledger::{NewTransaction, TransactionLedger};
use crate::services::settlement;
use crate::services::wallet::WalletService;
use crate::validation;

#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub party_id: Uuid,
    pub network_id: i32,
    pub recipient: String,
    pub amount: BigDecimal,
    pub bundle_plan_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseOutcome {
    pub reference: String,
    pub status: TrxnStatus,
}

/// The purchase orchestrator. Funds are taken before the provider call: a
/// crash between delivery and debit would otherwise leave a delivered top-up
/// with no corresponding charge. An ambiguous provider answer leaves the
/// transaction PENDING for the reconciler; it is never failed on the spot.
#[derive(Clone)]
pub struct PurchaseService {
    pool: PgPool,
    provider: TppClient,
    wallets: WalletService,
    commissions: CommissionService,
    ledger: TransactionLedger,
    sms_sender_id: String,
}

impl PurchaseService {
    pub fn new(
        pool: PgPool,
        provider: TppClient,
        wallets: WalletService,
        commissions: CommissionService,
        ledger: TransactionLedger,
        sms_sender_id: String,
    ) -> Self {
        Self {
            pool,
            provider,
            wallets,
            commissions,
            ledger,
            sms_sender_id,
        }
    }

    pub async fn purchase_airtime(
        &self,
        request: PurchaseRequest,
    ) -> Result<PurchaseOutcome, AppError> {
        self.purchase(TrxnType::Airtime, request).await
    }

    pub async fn purchase_data_bundle(
        &self,
        request: PurchaseRequest,
    ) -> Result<PurchaseOutcome, AppError> {
        let plan_id = request
            .bundle_plan_id
            .as_deref()
            .ok_or_else(|| AppError::Validation("bundle_plan_id is required".to_string()))?;
        if catalog::find_plan(request.network_id, plan_id).is_none() {
            return Err(AppError::Validation(format!(
                "unknown bundle plan {} for network {}",
                plan_id, request.network_id
            )));
        }

        self.purchase(TrxnType::Databundle, request).await
    }

    async fn purchase(
        &self,
        kind: TrxnType,
        request: PurchaseRequest,
    ) -> Result<PurchaseOutcome, AppError> {
        let party = self.require_party(request.party_id).await?;
        if party.role == Role::Admin {
            return Err(AppError::Forbidden(
                "admins fund wallets, they do not purchase".to_string(),
            ));
        }
        validation::validate_recipient_phone(&request.recipient)?;
        validation::validate_amount(&request.amount)?;

        let split = self.commissions.cost_for(party.id, &request.amount).await?;

        // Fail fast before touching the provider. The debit below repeats
        // this check atomically; this read only avoids a pointless call.
        let balance = self.wallets.balance(party.id).await?;
        if balance < split.vendor_pays {
            return Err(AppError::InsufficientFunds);
        }

        self.wallets
            .debit(
                party.id,
                &split.vendor_pays,
                &format!("{} purchase for {}", kind.as_str(), request.recipient),
            )
            .await?;

        let trx = self
            .ledger
            .create(NewTransaction {
                party_id: party.id,
                trxn_type: kind,
                amount: request.amount.clone(),
                commission: Some(split.commission.clone()),
                vendor_cost: Some(split.vendor_pays.clone()),
                recipient: Some(request.recipient.clone()),
                network_id: Some(request.network_id),
                bundle_plan_id: request.bundle_plan_id.clone(),
                status: TrxnStatus::Pending,
            })
            .await?;

        let call = match kind {
            TrxnType::Airtime => {
                self.provider
                    .airtime_topup(
                        &request.recipient,
                        &request.amount,
                        request.network_id,
                        &trx.reference,
                    )
                    .await
            }
            TrxnType::Databundle => {
                self.provider
                    .data_bundle(
                        &request.recipient,
                        request.bundle_plan_id.as_deref().unwrap_or_default(),
                        request.network_id,
                        &request.amount,
                        &trx.reference,
                    )
                    .await
            }
            TrxnType::FundTransfer => {
                return Err(AppError::Internal(
                    "fund transfers do not go through the provider".to_string(),
                ))
            }
        };

        let response = match call {
            Ok(response) => response,
            Err(err) => {
                // The debit stands. Rolling back on an ambiguous transport
                // error risks double-spending if the provider did process
                // the request; the reconciler will learn the truth.
                tracing::warn!(
                    reference = %trx.reference,
                    error = %err,
                    "provider call failed, leaving transaction PENDING"
                );
                return Ok(PurchaseOutcome {
                    reference: trx.reference,
                    status: TrxnStatus::Pending,
                });
            }
        };

        if response.is_success() {
            settlement::settle_success(&self.pool, &trx.reference, &response.raw).await?;
            self.notify_success(kind, &request, &trx.reference);
            Ok(PurchaseOutcome {
                reference: trx.reference,
                status: TrxnStatus::Success,
            })
        } else {
            tracing::info!(
                reference = %trx.reference,
                status_code = ?response.status_code(),
                "provider response not conclusive, transaction stays PENDING"
            );
            self.ledger
                .record_provider_response(&trx.reference, &response.raw)
                .await?;
            Ok(PurchaseOutcome {
                reference: trx.reference,
                status: TrxnStatus::Pending,
            })
        }
    }

    fn notify_success(&self, kind: TrxnType, request: &PurchaseRequest, reference: &str) {
        let provider = self.provider.clone();
        let sender_id = self.sms_sender_id.clone();
        let recipient = request.recipient.clone();
        let message = format!(
            "{} top-up of GHS {} for {} completed. Ref: {}",
            kind.as_str(),
            request.amount,
            request.recipient,
            reference
        );
        let reference = reference.to_string();

        tokio::spawn(async move {
            if let Err(err) = provider.send_sms(&recipient, &message, &sender_id).await {
                tracing::warn!(%reference, error = %err, "purchase SMS not delivered");
            }
        });
    }

    /// Direct admin-to-vendor ledger transfer. One database transaction:
    /// admin debit, vendor credit, FUND_TRANSFER record. The provider float
    /// is not consulted; provider balance sync is a separate job.
    pub async fn fund_vendor(
        &self,
        admin_id: Uuid,
        vendor_id: Uuid,
        amount: &BigDecimal,
    ) -> Result<Transaction, AppError> {
        let admin = self.require_party(admin_id).await?;
        if admin.role != Role::Admin {
            return Err(AppError::Forbidden(
                "only an admin can fund vendors".to_string(),
            ));
        }
        let vendor = self.require_party(vendor_id).await?;
        if vendor.role != Role::Vendor {
            return Err(AppError::Validation(format!(
                "party {} is not a vendor",
                vendor_id
            )));
        }
        validation::validate_amount(amount)?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        queries::get_or_create_wallet(&mut tx, admin.id).await?;
        WalletService::debit_on(
            &mut tx,
            admin.id,
            amount,
            &format!("Fund vendor {}", vendor.id),
        )
        .await?;

        queries::get_or_create_wallet(&mut tx, vendor.id).await?;
        WalletService::credit_on(
            &mut tx,
            vendor.id,
            amount,
            &format!("Funded by admin {}", admin.id),
        )
        .await?;

        let mut record = Transaction::new(
            admin.id,
            TrxnType::FundTransfer,
            amount.clone(),
            None,
            None,
            Some(vendor.id.to_string()),
            None,
            None,
            TrxnStatus::Success,
        );
        record.provider_response = Some(json!({ "note": "Admin funded vendor" }));
        let record = queries::insert_transaction(&mut tx, &record).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            admin = %admin.id,
            vendor = %vendor.id,
            amount = %amount,
            reference = %record.reference,
            "vendor funded"
        );
        Ok(record)
    }

    pub async fn set_commission(
        &self,
        admin_id: Uuid,
        vendor_id: Uuid,
        rate: &BigDecimal,
        model: &str,
    ) -> Result<CommissionSetting, AppError> {
        let admin = self.require_party(admin_id).await?;
        if admin.role != Role::Admin {
            return Err(AppError::Forbidden(
                "only an admin can change commission terms".to_string(),
            ));
        }
        let vendor = self.require_party(vendor_id).await?;
        if vendor.role != Role::Vendor {
            return Err(AppError::Validation(format!(
                "party {} is not a vendor",
                vendor_id
            )));
        }

        let model = CommissionModel::parse(model)?;
        self.commissions.set_terms(vendor.id, rate, model).await
    }

    pub async fn get_commission(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<CommissionSetting>, AppError> {
        self.commissions.get_setting(vendor_id).await
    }

    async fn require_party(&self, party_id: Uuid) -> Result<Party, AppError> {
        queries::find_party(&self.pool, party_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("party {} not found", party_id)))
    }
}
