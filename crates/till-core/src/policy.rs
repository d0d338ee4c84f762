//! # Enterprise Policy Checks
//!
//! Checks that must pass before a ticket may be settled. Failures are data,
//! not errors: every failing condition is returned at once so the operator
//! sees the whole list.
//!
//! ## Checks
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────────────┐
//! │ Category     │ Condition                                                │
//! ├──────────────┼──────────────────────────────────────────────────────────┤
//! │ branch       │ ticket references a branch                               │
//! │ customer     │ ticket references a customer                             │
//! │ items        │ ticket has at least one line                             │
//! │ staff        │ every service line has a staff member (one issue total)  │
//! │ payment      │ change can be handed back in cash                        │
//! └──────────────┴──────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::balance::Balance;
use crate::ledger::PaymentLedger;
use crate::money::MONEY_TOLERANCE;
use crate::types::{PaymentMethod, Ticket};

/// What a validation issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Branch,
    Customer,
    Staff,
    Items,
    Payment,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueCategory::Branch => "branch",
            IssueCategory::Customer => "customer",
            IssueCategory::Staff => "staff",
            IssueCategory::Items => "items",
            IssueCategory::Payment => "payment",
        };
        f.write_str(s)
    }
}

/// A condition blocking settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationIssue {
    pub category: IssueCategory,
    pub message: String,
    pub suggested_action: Option<String>,
}

impl ValidationIssue {
    pub fn new(category: IssueCategory, message: impl Into<String>) -> Self {
        ValidationIssue {
            category,
            message: message.into(),
            suggested_action: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }
}

/// Runs the ticket completeness checks.
///
/// Returns an empty vec when the ticket may move to `Ready`.
///
/// ## Example
/// ```rust
/// use till_core::{check_ticket, IssueCategory, Ticket};
///
/// let issues = check_ticket(&Ticket::new());
/// let categories: Vec<_> = issues.iter().map(|i| i.category).collect();
/// assert_eq!(
///     categories,
///     vec![IssueCategory::Branch, IssueCategory::Customer, IssueCategory::Items]
/// );
/// ```
pub fn check_ticket(ticket: &Ticket) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if is_blank(ticket.branch_id.as_deref()) {
        issues.push(
            ValidationIssue::new(IssueCategory::Branch, "No branch selected for this sale")
                .with_action("Select the branch where the sale takes place"),
        );
    }

    if is_blank(ticket.customer_id.as_deref()) {
        issues.push(
            ValidationIssue::new(IssueCategory::Customer, "No customer attached to this sale")
                .with_action("Search for the customer or create a walk-in record"),
        );
    }

    if ticket.lines.is_empty() {
        issues.push(
            ValidationIssue::new(IssueCategory::Items, "The ticket has no items")
                .with_action("Add at least one service or product"),
        );
    }

    let unassigned: Vec<&str> = ticket
        .lines
        .iter()
        .filter(|l| l.is_missing_staff())
        .map(|l| l.name.as_str())
        .collect();
    if !unassigned.is_empty() {
        let message = if unassigned.len() == 1 {
            format!("Service '{}' has no staff member assigned", unassigned[0])
        } else {
            format!(
                "{} services have no staff member assigned: {}",
                unassigned.len(),
                unassigned.join(", ")
            )
        };
        issues.push(
            ValidationIssue::new(IssueCategory::Staff, message)
                .with_action("Assign a staff member to each service"),
        );
    }

    issues
}

/// Checks the tender mix once the ticket is fully paid.
///
/// Change can only be handed back in cash, so an overpayment larger than the
/// cash tendered is blocked unless `allow_non_cash_overpayment` is set.
/// A shortfall within [`MONEY_TOLERANCE`] is not an overpayment: totals keep
/// sub-cent tax and a card is charged to the cent.
pub fn check_tenders(
    balance: &Balance,
    ledger: &PaymentLedger,
    allow_non_cash_overpayment: bool,
) -> Option<ValidationIssue> {
    if allow_non_cash_overpayment || !balance.change.is_positive() {
        return None;
    }

    let cash = ledger.paid_by(PaymentMethod::Cash);
    if balance.change - cash <= MONEY_TOLERANCE {
        return None;
    }

    Some(
        ValidationIssue::new(
            IssueCategory::Payment,
            format!(
                "Overpaid by {} but only {} was tendered in cash",
                balance.change, cash
            ),
        )
        .with_action("Remove or reduce the card or voucher payment"),
    )
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::LineItem;

    fn complete_ticket() -> Ticket {
        let mut ticket = Ticket::new();
        ticket.branch_id = Some("branch-1".to_string());
        ticket.customer_id = Some("cust-1".to_string());
        ticket
            .lines
            .push(LineItem::service("s-1", "Haircut", 1, Money::from_cents(3500)).with_staff("st-1"));
        ticket
    }

    #[test]
    fn test_complete_ticket_has_no_issues() {
        assert!(check_ticket(&complete_ticket()).is_empty());
    }

    #[test]
    fn test_missing_branch_and_staff_batched() {
        let mut ticket = complete_ticket();
        ticket.branch_id = None;
        ticket.lines[0].staff_id = None;

        let issues = check_ticket(&ticket);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].category, IssueCategory::Branch);
        assert_eq!(issues[1].category, IssueCategory::Staff);
        assert!(issues.iter().all(|i| i.suggested_action.is_some()));
    }

    #[test]
    fn test_several_unassigned_services_one_issue() {
        let mut ticket = complete_ticket();
        ticket.lines[0].staff_id = None;
        ticket
            .lines
            .push(LineItem::service("s-2", "Colour", 1, Money::from_cents(8000)));
        ticket
            .lines
            .push(LineItem::product("p-1", "Wax", 1, Money::from_cents(1200)));

        let issues = check_ticket(&ticket);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::Staff);
        assert!(issues[0].message.contains("Haircut"));
        assert!(issues[0].message.contains("Colour"));
        assert!(!issues[0].message.contains("Wax"));
    }

    #[test]
    fn test_blank_references_count_as_missing() {
        let mut ticket = complete_ticket();
        ticket.customer_id = Some("  ".to_string());
        let issues = check_ticket(&ticket);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::Customer);
    }

    #[test]
    fn test_card_overpayment_blocked() {
        let mut ledger = PaymentLedger::new();
        ledger.add_payment(PaymentMethod::Card, Money::from_cents(6000), None);
        let balance = Balance::resolve(Money::from_cents(5000), &ledger);

        let issue = check_tenders(&balance, &ledger, false).unwrap();
        assert_eq!(issue.category, IssueCategory::Payment);
        assert!(check_tenders(&balance, &ledger, true).is_none());
    }

    #[test]
    fn test_sub_cent_card_overpayment_allowed() {
        // 100.10 at 5% tax is 105.105; the card is charged 105.11
        let total = Money::parse("105.105").unwrap();
        let mut ledger = PaymentLedger::new();
        ledger.add_payment(PaymentMethod::Card, Money::from_cents(10511), None);
        let balance = Balance::resolve(total, &ledger);

        assert!(balance.change.is_positive());
        assert!(check_tenders(&balance, &ledger, false).is_none());

        ledger.add_payment(PaymentMethod::Card, Money::from_cents(1), None);
        let balance = Balance::resolve(total, &ledger);
        assert!(check_tenders(&balance, &ledger, false).is_some());
    }

    #[test]
    fn test_cash_change_allowed() {
        let mut ledger = PaymentLedger::new();
        ledger.add_payment(PaymentMethod::Card, Money::from_cents(3000), None);
        ledger.add_payment(PaymentMethod::Cash, Money::from_cents(3000), None);
        let balance = Balance::resolve(Money::from_cents(5000), &ledger);

        assert_eq!(balance.change, Money::from_cents(1000));
        assert!(check_tenders(&balance, &ledger, false).is_none());
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&IssueCategory::Items).unwrap();
        assert_eq!(json, "\"items\"");
    }
}
