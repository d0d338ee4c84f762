//! # Checkout Session
//!
//! Owns one ticket and its payment ledger, re-derives totals and balance on
//! every read, and drives the settlement gate.
//!
//! ## Thread Safety
//! State lives behind `Arc<tokio::sync::Mutex<..>>`, so the session is
//! `Clone + Send + Sync` and can be shared with the UI shell. The lock is
//! released before the settlement call is awaited; while that call is in
//! flight the gate is `Settling` and every mutation is refused.
//!
//! ## Settle Flow
//! ```text
//! settle()
//!   │
//!   ├── Settling?                 → Ok(InProgress)          (no second call)
//!   ├── policy issues?            → Ok(Blocked(issues))     (all at once)
//!   ├── remaining > 0.01?         → Ok(AwaitingPayment)
//!   ├── change not coverable?     → Ok(Blocked([payment]))
//!   │
//!   ├── Ready → Settling, unlock, call TransactionApi (with timeout)
//!   │
//!   ├── Ok(response)  → clear ticket + ledger, Settled, Ok(Settled(receipt))
//!   └── Err / timeout / task panic → Failed → Ready, ticket intact, Err(Settlement)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use till_core::{
    check_tenders, check_ticket, Balance, LineItem, LineUpdate, Money, Payment, PaymentLedger,
    PaymentMethod, Ticket, Totals, ValidationIssue,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::api::{SettlementError, SettlementRequest, SettlementResponse, TransactionApi};
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};
use crate::gate::{Gate, GateState};
use crate::receipt::Receipt;

// =============================================================================
// Public DTOs
// =============================================================================

/// Result of a settle attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum SettleOutcome {
    /// The transaction was recorded.
    Settled(Receipt),
    /// Policy checks failed. Every failing condition is listed.
    Blocked(Vec<ValidationIssue>),
    /// The ticket is complete but not fully paid.
    AwaitingPayment { remaining: Money },
    /// Another settle call is in flight. Nothing was done.
    InProgress,
}

/// Everything the payment dialog renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutSnapshot {
    pub ticket: Ticket,
    pub payments: Vec<Payment>,
    pub totals: Totals,
    pub balance: Balance,
    pub state: GateState,
    pub issues: Vec<ValidationIssue>,
    pub last_failure: Option<String>,
    pub last_receipt: Option<Receipt>,
}

// =============================================================================
// Session State
// =============================================================================

#[derive(Debug, Default)]
struct SessionState {
    ticket: Ticket,
    ledger: PaymentLedger,
    gate: Gate,
    last_failure: Option<String>,
    last_receipt: Option<Receipt>,
}

impl SessionState {
    fn totals(&self, config: &CheckoutConfig) -> Totals {
        self.ticket
            .totals(config.tax_rate(), config.rounding_mode())
    }

    fn balance(&self, config: &CheckoutConfig) -> Balance {
        Balance::resolve(self.totals(config).total, &self.ledger)
    }

    fn issues(&self, config: &CheckoutConfig) -> Vec<ValidationIssue> {
        let mut issues = check_ticket(&self.ticket);
        let balance = self.balance(config);
        if let Some(issue) = check_tenders(
            &balance,
            &self.ledger,
            config.settlement.allow_non_cash_overpayment,
        ) {
            issues.push(issue);
        }
        issues
    }

    fn refresh_gate(&mut self) {
        let checks_pass = check_ticket(&self.ticket).is_empty();
        self.gate.refresh(checks_pass);
    }

    /// The sale after a settled one. Ticket and ledger were emptied at
    /// settlement; the receipt and gate state are left behind.
    fn next_sale(&self) -> SessionState {
        SessionState {
            ticket: self.ticket.clone(),
            ledger: self.ledger.clone(),
            ..SessionState::default()
        }
    }
}

// =============================================================================
// Checkout Session
// =============================================================================

/// A checkout session for one till.
#[derive(Clone)]
pub struct CheckoutSession {
    state: Arc<Mutex<SessionState>>,
    api: Arc<dyn TransactionApi>,
    config: Arc<CheckoutConfig>,
}

impl std::fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CheckoutSession {
    /// Creates a session with an empty ticket.
    pub fn new(api: Arc<dyn TransactionApi>, config: CheckoutConfig) -> Self {
        CheckoutSession {
            state: Arc::new(Mutex::new(SessionState::default())),
            api,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Runs a mutation under the lock.
    ///
    /// Refused while settling. After a settlement the edit is applied to
    /// the next sale, which replaces the settled one only when the edit
    /// succeeds and changes something; until then the receipt stays up.
    /// A successful edit clears the last failure message.
    async fn edit<F, R>(&self, f: F) -> CheckoutResult<R>
    where
        F: FnOnce(&mut SessionState) -> CheckoutResult<R>,
    {
        let mut state = self.state.lock().await;
        match state.gate.state() {
            GateState::Settling => return Err(CheckoutError::SettlementInProgress),
            GateState::Settled => {
                let mut next = state.next_sale();
                let result = f(&mut next)?;
                if next.ticket != state.ticket || next.ledger != state.ledger {
                    info!("Starting new ticket after settlement");
                    next.refresh_gate();
                    *state = next;
                }
                return Ok(result);
            }
            _ => {}
        }

        let result = f(&mut state)?;
        state.last_failure = None;
        state.refresh_gate();
        Ok(result)
    }

    // =========================================================================
    // Ticket Edits
    // =========================================================================

    /// Adds a line and returns its id.
    pub async fn add_line(&self, line: LineItem) -> CheckoutResult<String> {
        self.edit(|s| {
            let entity_id = line.entity_id.clone();
            let id = s.ticket.add_line(line)?;
            debug!(line_id = %id, entity_id = %entity_id, "Line added");
            Ok(id)
        })
        .await
    }

    pub async fn update_line(&self, line_id: &str, update: LineUpdate) -> CheckoutResult<()> {
        self.edit(|s| {
            s.ticket.update_line(line_id, update)?;
            debug!(line_id = %line_id, "Line updated");
            Ok(())
        })
        .await
    }

    pub async fn remove_line(&self, line_id: &str) -> CheckoutResult<LineItem> {
        self.edit(|s| {
            let line = s.ticket.remove_line(line_id)?;
            debug!(line_id = %line_id, "Line removed");
            Ok(line)
        })
        .await
    }

    pub async fn set_customer(&self, customer_id: Option<String>) -> CheckoutResult<()> {
        self.edit(|s| Ok(s.ticket.set_customer(customer_id)?)).await
    }

    pub async fn set_branch(&self, branch_id: Option<String>) -> CheckoutResult<()> {
        self.edit(|s| Ok(s.ticket.set_branch(branch_id)?)).await
    }

    pub async fn set_appointment(&self, appointment_id: Option<String>) -> CheckoutResult<()> {
        self.edit(|s| Ok(s.ticket.set_appointment(appointment_id)?))
            .await
    }

    pub async fn set_notes(&self, notes: Option<String>) -> CheckoutResult<()> {
        self.edit(|s| Ok(s.ticket.set_notes(notes)?)).await
    }

    pub async fn set_transaction_date(&self, date: Option<DateTime<Utc>>) -> CheckoutResult<()> {
        self.edit(|s| {
            s.ticket.set_transaction_date(date);
            Ok(())
        })
        .await
    }

    pub async fn set_ticket_discount(&self, discount: Money) -> CheckoutResult<()> {
        self.edit(|s| {
            s.ticket.set_discount(discount)?;
            debug!(discount = %discount, "Ticket discount set");
            Ok(())
        })
        .await
    }

    pub async fn set_tip(&self, tip: Money) -> CheckoutResult<()> {
        self.edit(|s| {
            s.ticket.set_tip(tip)?;
            debug!(tip = %tip, "Tip set");
            Ok(())
        })
        .await
    }

    /// Discards the ticket and all payments.
    pub async fn reset(&self) -> CheckoutResult<()> {
        self.edit(|s| {
            s.ticket.clear();
            s.ledger.clear();
            info!("Ticket reset");
            Ok(())
        })
        .await
    }

    // =========================================================================
    // Tender Edits
    // =========================================================================

    /// Records a tender. Non-positive or out-of-range amounts are ignored and
    /// return `None`.
    pub async fn add_payment(
        &self,
        method: PaymentMethod,
        amount: Money,
        reference: Option<String>,
    ) -> CheckoutResult<Option<Payment>> {
        self.edit(|s| {
            let payment = s.ledger.add_payment(method, amount, reference);
            match &payment {
                Some(p) => debug!(payment_id = %p.id, method = %method, amount = %amount, "Payment added"),
                None => debug!(method = %method, amount = %amount, "Ignored payment amount"),
            }
            Ok(payment)
        })
        .await
    }

    /// Removes a tender. Unknown ids are a no-op.
    pub async fn remove_payment(&self, payment_id: &str) -> CheckoutResult<Option<Payment>> {
        self.edit(|s| {
            let removed = s.ledger.remove_payment(payment_id);
            if removed.is_some() {
                debug!(payment_id = %payment_id, "Payment removed");
            }
            Ok(removed)
        })
        .await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn snapshot(&self) -> CheckoutSnapshot {
        let state = self.state.lock().await;
        let totals = state.totals(&self.config);
        CheckoutSnapshot {
            ticket: state.ticket.clone(),
            payments: state.ledger.payments().to_vec(),
            totals,
            balance: Balance::resolve(totals.total, &state.ledger),
            state: state.gate.state(),
            issues: state.issues(&self.config),
            last_failure: state.last_failure.clone(),
            last_receipt: state.last_receipt.clone(),
        }
    }

    pub async fn totals(&self) -> Totals {
        self.state.lock().await.totals(&self.config)
    }

    pub async fn balance(&self) -> Balance {
        self.state.lock().await.balance(&self.config)
    }

    /// All conditions currently blocking settlement.
    pub async fn issues(&self) -> Vec<ValidationIssue> {
        self.state.lock().await.issues(&self.config)
    }

    pub async fn state(&self) -> GateState {
        self.state.lock().await.gate.state()
    }

    pub async fn last_failure(&self) -> Option<String> {
        self.state.lock().await.last_failure.clone()
    }

    pub async fn last_receipt(&self) -> Option<Receipt> {
        self.state.lock().await.last_receipt.clone()
    }

    /// Clears the failure message shown after a failed settlement.
    pub async fn dismiss_failure(&self) {
        self.state.lock().await.last_failure = None;
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Attempts to settle the ticket.
    ///
    /// ## Errors
    /// - `Settlement` when the collaborator fails or times out; ticket and
    ///   payments are left exactly as they were
    /// - `AlreadySettled` when called again before the next sale starts
    pub async fn settle(&self) -> CheckoutResult<SettleOutcome> {
        let (request, ticket, payments, totals, balance) = {
            let mut state = self.state.lock().await;

            match state.gate.state() {
                GateState::Settling => {
                    debug!("Settle ignored, settlement already in flight");
                    return Ok(SettleOutcome::InProgress);
                }
                GateState::Settled => {
                    let transaction_code = state
                        .last_receipt
                        .as_ref()
                        .map(|r| r.transaction_code.clone())
                        .unwrap_or_default();
                    return Err(CheckoutError::AlreadySettled { transaction_code });
                }
                _ => {}
            }

            let issues = check_ticket(&state.ticket);
            if !issues.is_empty() {
                state.refresh_gate();
                info!(count = issues.len(), "Settlement blocked by policy checks");
                return Ok(SettleOutcome::Blocked(issues));
            }

            let totals = state.totals(&self.config);
            let balance = Balance::resolve(totals.total, &state.ledger);
            if !balance.is_fully_paid {
                debug!(remaining = %balance.remaining, "Settlement waiting for payment");
                return Ok(SettleOutcome::AwaitingPayment {
                    remaining: balance.remaining,
                });
            }

            if let Some(issue) = check_tenders(
                &balance,
                &state.ledger,
                self.config.settlement.allow_non_cash_overpayment,
            ) {
                info!(change = %balance.change, "Settlement blocked, change exceeds cash tendered");
                return Ok(SettleOutcome::Blocked(vec![issue]));
            }

            let request = SettlementRequest::build(
                &state.ticket,
                &state.ledger,
                &totals,
                self.config.tax_rate(),
            );

            state.refresh_gate();
            state.gate.transition(GateState::Settling);
            state.last_failure = None;

            (
                request,
                state.ticket.clone(),
                state.ledger.payments().to_vec(),
                totals,
                balance,
            )
        };

        info!(
            total = %totals.total,
            paid = %balance.paid,
            lines = request.items.len(),
            "Submitting settlement"
        );

        // The write runs on its own task so a caller that stops waiting
        // cannot strand the gate in Settling.
        let session = self.clone();
        let submission = tokio::spawn(async move {
            let timeout = session.config.settlement.timeout();
            let result = match tokio::time::timeout(timeout, session.api.settle(request)).await {
                Ok(result) => result,
                Err(_) => Err(SettlementError::Timeout {
                    secs: session.config.settlement.timeout_secs,
                }),
            };
            session
                .finish_settlement(result, ticket, payments, totals, balance)
                .await
        });

        match submission.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                error!(error = %join_error, "Settlement task aborted");
                let err = SettlementError::Unavailable(join_error.to_string());

                // the task died before finish_settlement ran
                let mut state = self.state.lock().await;
                if state.gate.state() == GateState::Settling {
                    state.gate.transition(GateState::Failed);
                    state.gate.transition(GateState::Ready);
                    state.last_failure = Some(err.to_string());
                }
                Err(CheckoutError::Settlement(err))
            }
        }
    }

    async fn finish_settlement(
        &self,
        result: Result<SettlementResponse, SettlementError>,
        ticket: Ticket,
        payments: Vec<Payment>,
        totals: Totals,
        balance: Balance,
    ) -> CheckoutResult<SettleOutcome> {
        let mut state = self.state.lock().await;
        match result {
            Ok(response) => {
                let receipt = Receipt::new(response, &ticket, payments, totals, &balance);
                state.ticket.clear();
                state.ledger.clear();
                state.gate.transition(GateState::Settled);
                state.last_receipt = Some(receipt.clone());

                info!(
                    transaction_id = %receipt.transaction_id,
                    transaction_code = %receipt.transaction_code,
                    change = %receipt.change,
                    "Ticket settled"
                );
                Ok(SettleOutcome::Settled(receipt))
            }
            Err(err) => {
                state.gate.transition(GateState::Failed);
                state.gate.transition(GateState::Ready);
                state.last_failure = Some(err.to_string());

                warn!(error = %err, "Settlement failed, ticket kept for retry");
                Err(CheckoutError::Settlement(err))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SettlementLine;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use till_core::{IssueCategory, TaxRate};
    use tokio::sync::Notify;

    fn response_for(request: &SettlementRequest, n: usize) -> SettlementResponse {
        SettlementResponse {
            transaction_id: format!("tx-{}", n),
            transaction_code: format!("20261016-br-1-{:04}", n),
            transaction_date: Utc::now(),
            lines: request
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| SettlementLine {
                    id: format!("line-{}", i),
                    entity_id: item.entity_id.clone(),
                    item_type: item.item_type,
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    discount: item.discount,
                    line_total: item.unit_price * item.quantity - item.discount,
                    staff_id: item.staff_id.clone(),
                })
                .collect(),
        }
    }

    /// Records every request and succeeds.
    #[derive(Default)]
    struct RecordingApi {
        requests: std::sync::Mutex<Vec<SettlementRequest>>,
    }

    #[async_trait]
    impl TransactionApi for RecordingApi {
        async fn settle(
            &self,
            request: SettlementRequest,
        ) -> Result<SettlementResponse, SettlementError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            Ok(response_for(&request, requests.len()))
        }
    }

    /// Always fails.
    struct FailingApi;

    #[async_trait]
    impl TransactionApi for FailingApi {
        async fn settle(
            &self,
            _request: SettlementRequest,
        ) -> Result<SettlementResponse, SettlementError> {
            Err(SettlementError::Unavailable("connection refused".into()))
        }
    }

    /// Blocks until released.
    #[derive(Default)]
    struct BlockingApi {
        started: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TransactionApi for BlockingApi {
        async fn settle(
            &self,
            request: SettlementRequest,
        ) -> Result<SettlementResponse, SettlementError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.started.notify_one();
            self.release.notified().await;
            Ok(response_for(&request, n))
        }
    }

    /// Panics mid-call.
    struct PanickingApi;

    #[async_trait]
    impl TransactionApi for PanickingApi {
        async fn settle(
            &self,
            _request: SettlementRequest,
        ) -> Result<SettlementResponse, SettlementError> {
            panic!("card terminal driver crashed")
        }
    }

    /// Never answers in time.
    struct SlowApi;

    #[async_trait]
    impl TransactionApi for SlowApi {
        async fn settle(
            &self,
            request: SettlementRequest,
        ) -> Result<SettlementResponse, SettlementError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(response_for(&request, 1))
        }
    }

    async fn complete_session(api: Arc<dyn TransactionApi>, config: CheckoutConfig) -> CheckoutSession {
        let session = CheckoutSession::new(api, config);
        session.set_branch(Some("br-1".into())).await.unwrap();
        session.set_customer(Some("cust-1".into())).await.unwrap();
        session
            .add_line(
                LineItem::service("svc-cut", "Haircut", 1, Money::from_cents(5000))
                    .with_staff("st-1"),
            )
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_gate_moves_to_ready_when_checks_pass() {
        let session = CheckoutSession::new(Arc::new(RecordingApi::default()), CheckoutConfig::default());
        assert_eq!(session.state().await, GateState::Incomplete);
        assert_eq!(session.issues().await.len(), 3);

        session.set_branch(Some("br-1".into())).await.unwrap();
        session.set_customer(Some("cust-1".into())).await.unwrap();
        let line_id = session
            .add_line(LineItem::service("svc-cut", "Haircut", 1, Money::from_cents(5000)))
            .await
            .unwrap();
        assert_eq!(session.state().await, GateState::Incomplete);

        session
            .update_line(
                &line_id,
                LineUpdate {
                    staff_id: Some(Some("st-1".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(session.state().await, GateState::Ready);
        assert!(session.issues().await.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_reports_all_issues_at_once() {
        let session = CheckoutSession::new(Arc::new(RecordingApi::default()), CheckoutConfig::default());
        session.set_customer(Some("cust-1".into())).await.unwrap();
        session
            .add_line(LineItem::service("svc-cut", "Haircut", 1, Money::from_cents(5000)))
            .await
            .unwrap();

        match session.settle().await.unwrap() {
            SettleOutcome::Blocked(issues) => {
                let categories: Vec<_> = issues.iter().map(|i| i.category).collect();
                assert_eq!(categories, vec![IssueCategory::Branch, IssueCategory::Staff]);
            }
            other => panic!("expected Blocked, got {:?}", other),
        }
        assert_eq!(session.state().await, GateState::Incomplete);
    }

    #[tokio::test]
    async fn test_awaiting_payment() {
        let api = Arc::new(RecordingApi::default());
        let session = complete_session(api.clone(), CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Card, Money::from_cents(2000), None)
            .await
            .unwrap();

        let outcome = session.settle().await.unwrap();
        assert_eq!(
            outcome,
            SettleOutcome::AwaitingPayment {
                remaining: Money::from_cents(3000)
            }
        );
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_clears_ticket_and_returns_receipt() {
        let api = Arc::new(RecordingApi::default());
        let session = complete_session(api.clone(), CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Cash, Money::from_cents(6000), None)
            .await
            .unwrap();

        let receipt = match session.settle().await.unwrap() {
            SettleOutcome::Settled(receipt) => receipt,
            other => panic!("expected Settled, got {:?}", other),
        };
        assert_eq!(receipt.change, Money::from_cents(1000));
        assert_eq!(receipt.transaction_code, "20261016-br-1-0001");
        assert_eq!(receipt.customer_id.as_deref(), Some("cust-1"));
        assert_eq!(receipt.lines.len(), 1);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.state, GateState::Settled);
        assert!(snapshot.ticket.is_empty());
        assert!(snapshot.payments.is_empty());
        assert_eq!(api.requests.lock().unwrap().len(), 1);

        assert!(matches!(
            session.settle().await,
            Err(CheckoutError::AlreadySettled { .. })
        ));
    }

    #[tokio::test]
    async fn test_edit_after_settlement_starts_new_ticket() {
        let api = Arc::new(RecordingApi::default());
        let session = complete_session(api, CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Cash, Money::from_cents(5000), None)
            .await
            .unwrap();
        session.settle().await.unwrap();

        session.set_customer(Some("cust-2".into())).await.unwrap();
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.state, GateState::Incomplete);
        assert_eq!(snapshot.ticket.customer_id.as_deref(), Some("cust-2"));
        assert!(snapshot.ticket.branch_id.is_none());
        assert!(snapshot.last_receipt.is_none());
    }

    #[tokio::test]
    async fn test_rejected_edit_after_settlement_keeps_receipt() {
        let session = complete_session(Arc::new(RecordingApi::default()), CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Cash, Money::from_cents(5000), None)
            .await
            .unwrap();
        session.settle().await.unwrap();

        assert!(session.remove_line("missing").await.is_err());
        assert!(session
            .add_payment(PaymentMethod::Cash, Money::zero(), None)
            .await
            .unwrap()
            .is_none());
        assert!(session.remove_payment("nope").await.unwrap().is_none());
        assert!(session.set_tip(Money::from_cents(-1)).await.is_err());

        assert_eq!(session.state().await, GateState::Settled);
        assert_eq!(
            session.last_receipt().await.unwrap().transaction_code,
            "20261016-br-1-0001"
        );
        assert!(matches!(
            session.settle().await,
            Err(CheckoutError::AlreadySettled { .. })
        ));

        session
            .add_payment(PaymentMethod::Card, Money::from_cents(1000), None)
            .await
            .unwrap();
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.state, GateState::Incomplete);
        assert_eq!(snapshot.payments.len(), 1);
        assert!(snapshot.last_receipt.is_none());
    }

    #[tokio::test]
    async fn test_failure_leaves_ticket_and_ledger_unchanged() {
        let session = complete_session(Arc::new(FailingApi), CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Card, Money::from_cents(5000), Some("AUTH-9".into()))
            .await
            .unwrap();
        let before = session.snapshot().await;

        let err = session.settle().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Settlement(SettlementError::Unavailable(_))));

        let after = session.snapshot().await;
        assert_eq!(after.ticket, before.ticket);
        assert_eq!(after.payments, before.payments);
        assert_eq!(after.state, GateState::Ready);
        assert!(after.last_failure.unwrap().contains("connection refused"));

        session.dismiss_failure().await;
        assert!(session.last_failure().await.is_none());
    }

    #[tokio::test]
    async fn test_second_settle_while_in_flight_is_noop() {
        let api = Arc::new(BlockingApi::default());
        let session = complete_session(api.clone(), CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Cash, Money::from_cents(5000), None)
            .await
            .unwrap();

        let background = session.clone();
        let handle = tokio::spawn(async move { background.settle().await });

        api.started.notified().await;
        assert_eq!(session.state().await, GateState::Settling);
        assert_eq!(session.settle().await.unwrap(), SettleOutcome::InProgress);
        assert!(matches!(
            session
                .add_payment(PaymentMethod::Cash, Money::from_cents(100), None)
                .await,
            Err(CheckoutError::SettlementInProgress)
        ));
        assert!(matches!(
            session.reset().await,
            Err(CheckoutError::SettlementInProgress)
        ));

        api.release.notify_one();
        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, SettleOutcome::Settled(_)));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abandoned_settle_still_completes() {
        let api = Arc::new(BlockingApi::default());
        let session = complete_session(api.clone(), CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Cash, Money::from_cents(5000), None)
            .await
            .unwrap();

        let background = session.clone();
        let handle = tokio::spawn(async move { background.settle().await });
        api.started.notified().await;
        handle.abort();
        let _ = handle.await;

        api.release.notify_one();
        for _ in 0..100 {
            if session.state().await == GateState::Settled {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(session.state().await, GateState::Settled);
        assert!(session.last_receipt().await.is_some());
    }

    #[tokio::test]
    async fn test_panicking_collaborator_releases_gate() {
        let session = complete_session(Arc::new(PanickingApi), CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Cash, Money::from_cents(5000), None)
            .await
            .unwrap();
        let before = session.snapshot().await;

        let err = session.settle().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Settlement(SettlementError::Unavailable(_))));

        let after = session.snapshot().await;
        assert_eq!(after.state, GateState::Ready);
        assert_eq!(after.ticket, before.ticket);
        assert_eq!(after.payments, before.payments);
        assert!(after.last_failure.is_some());

        session.set_notes(Some("retry".into())).await.unwrap();
        assert!(session.last_failure().await.is_none());
        assert!(matches!(
            session.settle().await,
            Err(CheckoutError::Settlement(_))
        ));
        assert_eq!(session.state().await, GateState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_failure() {
        let mut config = CheckoutConfig::default();
        config.settlement.timeout_secs = 5;
        let session = complete_session(Arc::new(SlowApi), config).await;
        session
            .add_payment(PaymentMethod::Cash, Money::from_cents(5000), None)
            .await
            .unwrap();

        let err = session.settle().await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Settlement(SettlementError::Timeout { secs: 5 })
        ));
        assert_eq!(session.state().await, GateState::Ready);
        assert_eq!(session.snapshot().await.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_card_overpayment_blocked_unless_allowed() {
        let session = complete_session(Arc::new(RecordingApi::default()), CheckoutConfig::default()).await;
        session
            .add_payment(PaymentMethod::Card, Money::from_cents(6000), None)
            .await
            .unwrap();

        match session.settle().await.unwrap() {
            SettleOutcome::Blocked(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].category, IssueCategory::Payment);
            }
            other => panic!("expected Blocked, got {:?}", other),
        }

        let mut config = CheckoutConfig::default();
        config.settlement.allow_non_cash_overpayment = true;
        let lenient = complete_session(Arc::new(RecordingApi::default()), config).await;
        lenient
            .add_payment(PaymentMethod::Card, Money::from_cents(6000), None)
            .await
            .unwrap();
        assert!(matches!(lenient.settle().await.unwrap(), SettleOutcome::Settled(_)));
    }

    #[tokio::test]
    async fn test_sub_cent_tax_settles_on_card() {
        let mut config = CheckoutConfig::default();
        config.pricing.tax_rate = TaxRate::from_bps(500);
        let session = CheckoutSession::new(Arc::new(RecordingApi::default()), config);
        session.set_branch(Some("br-1".into())).await.unwrap();
        session.set_customer(Some("cust-1".into())).await.unwrap();
        session
            .add_line(
                LineItem::service("svc-color", "Colour", 1, Money::from_cents(10010))
                    .with_staff("st-1"),
            )
            .await
            .unwrap();
        assert_eq!(session.totals().await.total, Money::parse("105.105").unwrap());

        session
            .add_payment(PaymentMethod::Card, Money::from_cents(10511), None)
            .await
            .unwrap();
        assert!(session.issues().await.is_empty());
        assert!(matches!(session.settle().await.unwrap(), SettleOutcome::Settled(_)));
    }

    #[tokio::test]
    async fn test_totals_follow_config() {
        let mut config = CheckoutConfig::default();
        config.pricing.tax_rate = TaxRate::from_bps(500);
        let session = complete_session(Arc::new(RecordingApi::default()), config).await;
        session.set_tip(Money::from_cents(1000)).await.unwrap();

        let totals = session.totals().await;
        assert_eq!(totals.tax, Money::from_cents(250));
        assert_eq!(totals.total, Money::from_cents(6250));

        let payment = session
            .add_payment(PaymentMethod::Cash, Money::from_cents(6250), None)
            .await
            .unwrap()
            .unwrap();
        assert!(session.balance().await.is_fully_paid);

        session.remove_payment(&payment.id).await.unwrap();
        assert!(!session.balance().await.is_fully_paid);
    }

    #[tokio::test]
    async fn test_zero_payment_ignored_and_bad_edit_rejected() {
        let session = complete_session(Arc::new(RecordingApi::default()), CheckoutConfig::default()).await;
        assert!(session
            .add_payment(PaymentMethod::Cash, Money::zero(), None)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            session.remove_line("missing").await,
            Err(CheckoutError::Core(_))
        ));
        assert!(session.set_tip(Money::from_cents(-1)).await.is_err());
    }

    #[tokio::test]
    async fn test_extreme_amounts_rejected_without_panic() {
        let session = complete_session(Arc::new(RecordingApi::default()), CheckoutConfig::default()).await;
        let huge = Money::new(rust_decimal::Decimal::MAX);

        assert!(session
            .add_payment(PaymentMethod::Cash, huge, None)
            .await
            .unwrap()
            .is_none());
        assert!(session
            .add_line(LineItem::product("prd-wax", "Wax", 999, huge))
            .await
            .is_err());
        assert!(session.set_tip(huge).await.is_err());
        assert!(session.set_ticket_discount(huge).await.is_err());

        let snapshot = session.snapshot().await;
        assert!(snapshot.payments.is_empty());
        assert_eq!(snapshot.ticket.lines.len(), 1);
        assert_eq!(snapshot.totals.total, Money::from_cents(5000));
    }
}
