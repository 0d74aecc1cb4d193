pub mod balance_sync;
pub mod commission;
pub mod ledger;
pub mod purchase;
pub mod reconciler;
pub mod settlement;
pub mod wallet;

pub use balance_sync::BalanceSyncJob;
pub use commission::{CommissionService, CommissionTerms, CostSplit};
pub use ledger::{NewTransaction, TransactionLedger};
pub use purchase::{PurchaseOutcome, PurchaseRequest, PurchaseService};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use settlement::SettleResult;
pub use wallet::WalletService;
