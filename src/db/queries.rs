use bigdecimal::BigDecimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::models::{
    CommissionModel, CommissionSetting, MovementDirection, Party, Role, Transaction, TrxnStatus,
    Wallet, WalletMovement,
};
use crate::error::AppError;

// --- Party queries ---

pub async fn insert_party(
    conn: &mut PgConnection,
    name: &str,
    email: &str,
    role: Role,
) -> Result<Party, AppError> {
    let party = sqlx::query_as::<_, Party>(
        r#"
        INSERT INTO parties (id, name, email, role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, email, role, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(role)
    .fetch_one(&mut *conn)
    .await?;

    Ok(party)
}

pub async fn find_party(pool: &PgPool, id: Uuid) -> Result<Option<Party>, AppError> {
    let party = sqlx::query_as::<_, Party>("SELECT * FROM parties WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(party)
}

pub async fn find_party_by_email(pool: &PgPool, email: &str) -> Result<Option<Party>, AppError> {
    let party = sqlx::query_as::<_, Party>("SELECT * FROM parties WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(party)
}

/// The platform account that collects commissions: the oldest ADMIN party.
pub async fn find_platform_account(conn: &mut PgConnection) -> Result<Option<Party>, AppError> {
    let party = sqlx::query_as::<_, Party>(
        "SELECT * FROM parties WHERE role = 'ADMIN' ORDER BY created_at ASC LIMIT 1",
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(party)
}

// --- Wallet queries ---

pub async fn get_wallet(pool: &PgPool, party_id: Uuid) -> Result<Option<Wallet>, AppError> {
    let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE party_id = $1")
        .bind(party_id)
        .fetch_optional(pool)
        .await?;

    Ok(wallet)
}

pub async fn get_or_create_wallet(
    conn: &mut PgConnection,
    party_id: Uuid,
) -> Result<Wallet, AppError> {
    sqlx::query("INSERT INTO wallets (party_id) VALUES ($1) ON CONFLICT (party_id) DO NOTHING")
        .bind(party_id)
        .execute(&mut *conn)
        .await?;

    let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE party_id = $1")
        .bind(party_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(wallet)
}

/// Atomically increments the balance and appends the paired CREDIT movement.
/// Run inside a caller-owned transaction so both writes commit together.
pub async fn credit_wallet(
    conn: &mut PgConnection,
    party_id: Uuid,
    amount: &BigDecimal,
    metadata: &str,
) -> Result<Wallet, AppError> {
    let updated = sqlx::query_as::<_, Wallet>(
        r#"
        UPDATE wallets
        SET balance = balance + $2, updated_at = NOW()
        WHERE party_id = $1
        RETURNING party_id, balance, updated_at
        "#,
    )
    .bind(party_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::WalletNotFound(party_id))?;

    insert_movement(
        conn,
        party_id,
        MovementDirection::Credit,
        amount,
        &updated.balance,
        metadata,
    )
    .await?;

    Ok(updated)
}

/// Atomically decrements the balance and appends the paired DEBIT movement.
/// The balance guard lives in the UPDATE itself so two concurrent debits can
/// never both pass a stale balance check and overdraw together.
pub async fn debit_wallet(
    conn: &mut PgConnection,
    party_id: Uuid,
    amount: &BigDecimal,
    metadata: &str,
) -> Result<Wallet, AppError> {
    let updated = sqlx::query_as::<_, Wallet>(
        r#"
        UPDATE wallets
        SET balance = balance - $2, updated_at = NOW()
        WHERE party_id = $1 AND balance >= $2
        RETURNING party_id, balance, updated_at
        "#,
    )
    .bind(party_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    let updated = match updated {
        Some(wallet) => wallet,
        None => {
            let exists: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM wallets WHERE party_id = $1")
                    .bind(party_id)
                    .fetch_one(&mut *conn)
                    .await?;
            if exists == 0 {
                return Err(AppError::WalletNotFound(party_id));
            }
            return Err(AppError::InsufficientFunds);
        }
    };

    insert_movement(
        conn,
        party_id,
        MovementDirection::Debit,
        amount,
        &updated.balance,
        metadata,
    )
    .await?;

    Ok(updated)
}

async fn insert_movement(
    conn: &mut PgConnection,
    party_id: Uuid,
    direction: MovementDirection,
    amount: &BigDecimal,
    balance_after: &BigDecimal,
    metadata: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO wallet_movements (id, party_id, direction, amount, balance_after, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(party_id)
    .bind(direction)
    .bind(amount)
    .bind(balance_after)
    .bind(metadata)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn list_movements(
    pool: &PgPool,
    party_id: Uuid,
    limit: i64,
) -> Result<Vec<WalletMovement>, AppError> {
    let movements = sqlx::query_as::<_, WalletMovement>(
        "SELECT * FROM wallet_movements WHERE party_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(party_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(movements)
}

// --- Commission queries ---

pub async fn get_commission_setting(
    pool: &PgPool,
    party_id: Uuid,
) -> Result<Option<CommissionSetting>, AppError> {
    let setting =
        sqlx::query_as::<_, CommissionSetting>("SELECT * FROM commission_settings WHERE party_id = $1")
            .bind(party_id)
            .fetch_optional(pool)
            .await?;

    Ok(setting)
}

pub async fn upsert_commission_setting(
    pool: &PgPool,
    party_id: Uuid,
    rate: &BigDecimal,
    model: CommissionModel,
) -> Result<CommissionSetting, AppError> {
    let setting = sqlx::query_as::<_, CommissionSetting>(
        r#"
        INSERT INTO commission_settings (party_id, rate, model, updated_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (party_id) DO UPDATE SET rate = $2, model = $3, updated_at = NOW()
        RETURNING party_id, rate, model, updated_at
        "#,
    )
    .bind(party_id)
    .bind(rate)
    .bind(model)
    .fetch_one(pool)
    .await?;

    Ok(setting)
}

// --- Transaction queries ---

pub async fn insert_transaction(
    conn: &mut PgConnection,
    tx: &Transaction,
) -> Result<Transaction, AppError> {
    let inserted = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            id, reference, party_id, trxn_type, amount, commission, vendor_cost,
            recipient, network_id, bundle_plan_id, status, provider_response,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(tx.id)
    .bind(&tx.reference)
    .bind(tx.party_id)
    .bind(tx.trxn_type)
    .bind(&tx.amount)
    .bind(&tx.commission)
    .bind(&tx.vendor_cost)
    .bind(&tx.recipient)
    .bind(tx.network_id)
    .bind(&tx.bundle_plan_id)
    .bind(tx.status)
    .bind(&tx.provider_response)
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(inserted)
}

pub async fn find_transaction_by_reference(
    pool: &PgPool,
    reference: &str,
) -> Result<Option<Transaction>, AppError> {
    let tx = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE reference = $1")
        .bind(reference)
        .fetch_optional(pool)
        .await?;

    Ok(tx)
}

/// Row-locked fetch for settlement. The lock plus the status re-check is what
/// keeps the orchestrator and a concurrent reconciliation pass from both
/// settling the same reference.
pub async fn lock_transaction_by_reference(
    conn: &mut PgConnection,
    reference: &str,
) -> Result<Option<Transaction>, AppError> {
    let tx = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE reference = $1 FOR UPDATE",
    )
    .bind(reference)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(tx)
}

/// Guarded terminal transition. Returns None when the row is missing or
/// already terminal; terminal rows are never touched again.
pub async fn mark_transaction_if_pending(
    conn: &mut PgConnection,
    reference: &str,
    status: TrxnStatus,
    provider_response: Option<&serde_json::Value>,
) -> Result<Option<Transaction>, AppError> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = $2,
            provider_response = COALESCE($3, provider_response),
            updated_at = NOW()
        WHERE reference = $1 AND status = 'PENDING'
        RETURNING *
        "#,
    )
    .bind(reference)
    .bind(status)
    .bind(provider_response)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(tx)
}

/// Persists the latest raw provider payload without changing status. Used for
/// "still processing" answers so the audit trail keeps the freshest response.
pub async fn record_provider_response(
    pool: &PgPool,
    reference: &str,
    provider_response: &serde_json::Value,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE transactions SET provider_response = $2, updated_at = NOW() WHERE reference = $1",
    )
    .bind(reference)
    .bind(provider_response)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_transactions_for_party(
    pool: &PgPool,
    party_id: Uuid,
    limit: i64,
) -> Result<Vec<Transaction>, AppError> {
    let rows = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE party_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(party_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Oldest first so the reconciler drains the backlog fairly.
pub async fn list_pending_transactions(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<Transaction>, AppError> {
    let rows = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE status = 'PENDING' ORDER BY created_at ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn list_transactions(
    pool: &PgPool,
    status: Option<TrxnStatus>,
    party_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<Transaction>, AppError> {
    let rows = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE ($1::trxn_status IS NULL OR status = $1)
          AND ($2::uuid IS NULL OR party_id = $2)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(status)
    .bind(party_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
