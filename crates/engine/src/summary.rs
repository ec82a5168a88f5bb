//! Plain-text summary of the pending transfers, ready to be shared.

use std::fmt::Write;

use crate::{SettlementBreakdown, Transfer, Trip};

const HEADER_RULE: &str = "------------------------------";
const FOOTER: &str = "Balances are cleared once every transfer above is paid.";
const SETTLED_UP: &str = "Everyone is settled up.";

/// Renders the pending transfers of `trip` with their breakdowns.
pub fn share_message(trip: &Trip, pending: &[(Transfer, SettlementBreakdown)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Settlements for {}", trip.name);
    let _ = writeln!(out, "{HEADER_RULE}");

    if pending.is_empty() {
        let _ = writeln!(out, "{SETTLED_UP}");
        return out;
    }

    for (transfer, breakdown) in pending {
        let _ = writeln!(
            out,
            "{} -> {}: {}",
            trip.display_name(transfer.from),
            trip.display_name(transfer.to),
            transfer.amount
        );
        if breakdown.has_installments() {
            let _ = writeln!(out, "  cash: {}", breakdown.cash_total);
            let _ = writeln!(out, "  installments: {}", breakdown.installment_total);
            for line in &breakdown.installments {
                let _ = writeln!(
                    out,
                    "  - {}: {}/{} paid, {} per installment",
                    line.description, line.paid, line.total, line.per_person_amount
                );
            }
        }
    }

    let _ = writeln!(out, "{HEADER_RULE}");
    let _ = writeln!(out, "{FOOTER}");
    out
}
