//! Receipts for settled tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use till_core::{Balance, Money, Payment, Ticket, Totals};
use ts_rs::TS;

use crate::api::{SettlementLine, SettlementResponse};
use crate::config::CheckoutConfig;

/// What the customer takes home.
///
/// Lines, id, code and date come verbatim from the collaborator's response;
/// payments and totals are the values the ticket was settled with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub transaction_id: String,
    pub transaction_code: String,
    #[ts(as = "String")]
    pub transaction_date: DateTime<Utc>,
    pub customer_id: Option<String>,
    pub branch_id: Option<String>,
    pub appointment_id: Option<String>,
    pub lines: Vec<SettlementLine>,
    pub payments: Vec<Payment>,
    pub totals: Totals,
    pub paid: Money,
    pub change: Money,
    pub notes: Option<String>,
}

impl Receipt {
    pub fn new(
        response: SettlementResponse,
        ticket: &Ticket,
        payments: Vec<Payment>,
        totals: Totals,
        balance: &Balance,
    ) -> Self {
        Receipt {
            transaction_id: response.transaction_id,
            transaction_code: response.transaction_code,
            transaction_date: response.transaction_date,
            customer_id: ticket.customer_id.clone(),
            branch_id: ticket.branch_id.clone(),
            appointment_id: ticket.appointment_id.clone(),
            lines: response.lines,
            payments,
            totals,
            paid: balance.paid,
            change: balance.change,
            notes: ticket.notes.clone(),
        }
    }

    /// Plain-text rendering for a receipt printer.
    pub fn render(&self, config: &CheckoutConfig) -> String {
        let money = |m: Money| config.format_currency(m);
        let mut out = String::new();

        let _ = writeln!(out, "{}", config.organization.name);
        let _ = writeln!(out, "Receipt {}", self.transaction_code);
        let _ = writeln!(out, "{}", self.transaction_date.format("%Y-%m-%d %H:%M"));
        out.push_str("----------------------------------------\n");

        for line in &self.lines {
            let _ = writeln!(
                out,
                "{:>3} x {:<24} {:>10}",
                line.quantity,
                line.name,
                money(line.line_total)
            );
            if line.discount.is_positive() {
                let _ = writeln!(out, "      discount {:>25}", format!("-{}", money(line.discount)));
            }
        }

        out.push_str("----------------------------------------\n");
        let _ = writeln!(out, "Subtotal {:>31}", money(self.totals.subtotal));
        if self.totals.discount.is_positive() {
            let _ = writeln!(out, "Discount {:>31}", format!("-{}", money(self.totals.discount)));
        }
        let _ = writeln!(out, "Tax {:>36}", money(self.totals.tax));
        if self.totals.tip.is_positive() {
            let _ = writeln!(out, "Tip {:>36}", money(self.totals.tip));
        }
        let _ = writeln!(out, "TOTAL {:>34}", money(self.totals.total));

        for payment in &self.payments {
            let label = match &payment.reference {
                Some(r) => format!("{} ({})", payment.method, r),
                None => payment.method.to_string(),
            };
            let _ = writeln!(out, "{:<28} {:>11}", label, money(payment.amount));
        }
        if self.change.is_positive() {
            let _ = writeln!(out, "Change {:>33}", money(self.change));
        }

        out
    }
}
