//! # Transaction Repository
//!
//! Persists settled tickets: one header row, its lines and its payments.
//!
//! ## Settlement Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   record(request), one SQLite transaction               │
//! │                                                                         │
//! │  1. BEGIN                                                              │
//! │  2. bump transaction_sequences (business_date, branch) → NNNN          │
//! │  3. INSERT transactions        code = YYYYMMDD-<branch>-NNNN           │
//! │  4. INSERT transaction_lines   (position order)                        │
//! │  5. INSERT transaction_payments (position order)                       │
//! │  6. COMMIT                                                             │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is written,   │
//! │  and the sequence value is not consumed.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money columns are TEXT decimals. They are parsed back into [`Money`] on
//! read; a value that no longer parses surfaces as [`DbError::Internal`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_checkout::{SettlementLine, SettlementRequest, SettlementResponse};
use till_core::validation::validate_payment_amount;
use till_core::{
    Balance, ItemType, Money, PaymentMethod, TaxRate, DEFAULT_TENANT_ID,
};

/// Branch segment used in codes when the ticket has no branch.
pub const DEFAULT_BRANCH_KEY: &str = "MAIN";

// =============================================================================
// Stored Records
// =============================================================================

/// A recorded transaction header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTransaction {
    pub id: String,
    pub transaction_code: String,
    /// `YYYYMMDD` of `transaction_date`.
    pub business_date: String,
    pub branch_id: Option<String>,
    pub customer_id: String,
    pub appointment_id: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub tax_rate: TaxRate,
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub tip_total: Money,
    pub total: Money,
    pub paid_total: Money,
    pub change_total: Money,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recorded tender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPayment {
    pub id: String,
    pub method: PaymentMethod,
    pub amount: Money,
    pub reference: Option<String>,
}

// Raw rows, decimals still as TEXT.

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    transaction_code: String,
    business_date: String,
    branch_id: Option<String>,
    customer_id: String,
    appointment_id: Option<String>,
    transaction_date: DateTime<Utc>,
    tax_rate: String,
    subtotal: String,
    discount_total: String,
    tax_total: String,
    tip_total: String,
    total: String,
    paid_total: String,
    change_total: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: String,
    entity_id: String,
    item_type: ItemType,
    name: String,
    quantity: i64,
    unit_price: String,
    discount: String,
    line_total: String,
    staff_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    method: PaymentMethod,
    amount: String,
    reference: Option<String>,
}

fn parse_money(column: &str, raw: &str) -> DbResult<Money> {
    Decimal::from_str(raw)
        .map(Money::new)
        .map_err(|e| DbError::Internal(format!("{column} holds '{raw}': {e}")))
}

impl TryFrom<TransactionRow> for StoredTransaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> DbResult<Self> {
        let tax_rate = TaxRate::from_str(&row.tax_rate)
            .map_err(|e| DbError::Internal(format!("tax_rate holds '{}': {e}", row.tax_rate)))?;

        Ok(StoredTransaction {
            subtotal: parse_money("subtotal", &row.subtotal)?,
            discount_total: parse_money("discount_total", &row.discount_total)?,
            tax_total: parse_money("tax_total", &row.tax_total)?,
            tip_total: parse_money("tip_total", &row.tip_total)?,
            total: parse_money("total", &row.total)?,
            paid_total: parse_money("paid_total", &row.paid_total)?,
            change_total: parse_money("change_total", &row.change_total)?,
            tax_rate,
            id: row.id,
            transaction_code: row.transaction_code,
            business_date: row.business_date,
            branch_id: row.branch_id,
            customer_id: row.customer_id,
            appointment_id: row.appointment_id,
            transaction_date: row.transaction_date,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<LineRow> for SettlementLine {
    type Error = DbError;

    fn try_from(row: LineRow) -> DbResult<Self> {
        Ok(SettlementLine {
            unit_price: parse_money("unit_price", &row.unit_price)?,
            discount: parse_money("discount", &row.discount)?,
            line_total: parse_money("line_total", &row.line_total)?,
            id: row.id,
            entity_id: row.entity_id,
            item_type: row.item_type,
            name: row.name,
            quantity: row.quantity,
            staff_id: row.staff_id,
        })
    }
}

impl TryFrom<PaymentRow> for StoredPayment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> DbResult<Self> {
        Ok(StoredPayment {
            amount: parse_money("amount", &row.amount)?,
            id: row.id,
            method: row.method,
            reference: row.reference,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for settled transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Records a settled ticket atomically and returns what was stored.
    ///
    /// ## Refused Before Writing
    /// - no items
    /// - blank customer
    /// - a payment that is not positive
    pub async fn record(&self, request: &SettlementRequest) -> DbResult<SettlementResponse> {
        check_request(request)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let transaction_date = request.transaction_date.unwrap_or(now);
        let business_date = transaction_date.format("%Y%m%d").to_string();
        let branch_key = branch_key(request.branch_id.as_deref());

        let paid = request.paid_total();
        let change = Balance::from_paid(request.total, paid).change;

        let mut tx = self.pool.begin().await?;

        let sequence = next_sequence(&mut tx, &business_date, &branch_key).await?;
        let transaction_code = format!("{business_date}-{branch_key}-{sequence:04}");

        debug!(
            id = %id,
            code = %transaction_code,
            items = request.items.len(),
            payments = request.payments.len(),
            "Recording transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, tenant_id, transaction_code, business_date,
                branch_id, customer_id, appointment_id, transaction_date,
                tax_rate, subtotal, discount_total, tax_total, tip_total, total,
                paid_total, change_total, notes, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18
            )
            "#,
        )
        .bind(&id)
        .bind(DEFAULT_TENANT_ID)
        .bind(&transaction_code)
        .bind(&business_date)
        .bind(&request.branch_id)
        .bind(request.customer_id.trim())
        .bind(&request.appointment_id)
        .bind(transaction_date)
        .bind(request.tax_rate.fraction().to_string())
        .bind(request.subtotal.amount().to_string())
        .bind(request.discount_total.amount().to_string())
        .bind(request.tax_total.amount().to_string())
        .bind(request.tip_total.amount().to_string())
        .bind(request.total.amount().to_string())
        .bind(paid.amount().to_string())
        .bind(change.amount().to_string())
        .bind(&request.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(request.items.len());
        for (position, item) in request.items.iter().enumerate() {
            let line = SettlementLine {
                id: Uuid::new_v4().to_string(),
                entity_id: item.entity_id.clone(),
                item_type: item.item_type,
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount: item.discount,
                line_total: item.unit_price.multiply_quantity(item.quantity) - item.discount,
                staff_id: item.staff_id.clone(),
            };

            sqlx::query(
                r#"
                INSERT INTO transaction_lines (
                    id, transaction_id, position, entity_id, item_type, name,
                    quantity, unit_price, discount, line_total, staff_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&line.id)
            .bind(&id)
            .bind(position as i64)
            .bind(&line.entity_id)
            .bind(line.item_type)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price.amount().to_string())
            .bind(line.discount.amount().to_string())
            .bind(line.line_total.amount().to_string())
            .bind(&line.staff_id)
            .execute(&mut *tx)
            .await?;

            lines.push(line);
        }

        for (position, payment) in request.payments.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_payments (
                    id, transaction_id, position, method, amount, reference
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(position as i64)
            .bind(payment.method)
            .bind(payment.amount.amount().to_string())
            .bind(&payment.reference)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, code = %transaction_code, total = %request.total, "Transaction recorded");

        Ok(SettlementResponse {
            transaction_id: id,
            transaction_code,
            transaction_date,
            lines,
        })
    }

    /// Gets a transaction header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StoredTransaction>> {
        let row: Option<TransactionRow> =
            sqlx::query_as(&format!("{SELECT_TRANSACTION} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(StoredTransaction::try_from).transpose()
    }

    /// Gets a transaction header by its printed code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<StoredTransaction>> {
        let row: Option<TransactionRow> =
            sqlx::query_as(&format!("{SELECT_TRANSACTION} WHERE transaction_code = ?1"))
                .bind(code.trim())
                .fetch_optional(&self.pool)
                .await?;

        row.map(StoredTransaction::try_from).transpose()
    }

    /// Lines of a transaction, in ticket order.
    pub async fn get_lines(&self, transaction_id: &str) -> DbResult<Vec<SettlementLine>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT id, entity_id, item_type, name, quantity,
                   unit_price, discount, line_total, staff_id
            FROM transaction_lines
            WHERE transaction_id = ?1
            ORDER BY position
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SettlementLine::try_from).collect()
    }

    /// Payments of a transaction, in tender order.
    pub async fn get_payments(&self, transaction_id: &str) -> DbResult<Vec<StoredPayment>> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, method, amount, reference
            FROM transaction_payments
            WHERE transaction_id = ?1
            ORDER BY position
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredPayment::try_from).collect()
    }

    /// Number of recorded transactions.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

const SELECT_TRANSACTION: &str = r#"
    SELECT id, transaction_code, business_date, branch_id, customer_id,
           appointment_id, transaction_date, tax_rate, subtotal, discount_total,
           tax_total, tip_total, total, paid_total, change_total, notes, created_at
    FROM transactions
"#;

// =============================================================================
// Helpers
// =============================================================================

fn check_request(request: &SettlementRequest) -> DbResult<()> {
    if request.items.is_empty() {
        return Err(DbError::InvalidData(
            "a transaction needs at least one item".to_string(),
        ));
    }
    if request.customer_id.trim().is_empty() {
        return Err(DbError::InvalidData("customer is required".to_string()));
    }
    for payment in &request.payments {
        validate_payment_amount(payment.amount).map_err(|e| {
            DbError::InvalidData(format!("{} payment of {}: {}", payment.method, payment.amount, e))
        })?;
    }
    Ok(())
}

fn branch_key(branch_id: Option<&str>) -> String {
    match branch_id.map(str::trim) {
        Some(branch) if !branch.is_empty() => branch.to_uppercase(),
        _ => DEFAULT_BRANCH_KEY.to_string(),
    }
}

/// Claims the next value of the per-day, per-branch counter.
async fn next_sequence(
    tx: &mut Transaction<'_, Sqlite>,
    business_date: &str,
    branch_key: &str,
) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO transaction_sequences (business_date, branch_key, last_value)
        VALUES (?1, ?2, 1)
        ON CONFLICT (business_date, branch_key)
        DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(business_date)
    .bind(branch_key)
    .fetch_one(&mut **tx)
    .await?;

    Ok(value)
}
