//! Report formatting for balances, settlements and expenses.
//!
//! All functions are framework-agnostic and return plain text that the bot layer wraps
//! into messages. Participant ids are replaced by configured nicknames where available.

use crate::core::{
    ledger::{Balances, Expense},
    money::Money,
    settlement::SettlementTransfer,
    split::{ParticipantId, ResolvedSplit},
};
use std::{collections::HashMap, fmt::Write};

/// Maps participant ids to display names.
pub type Nicknames = HashMap<String, String>;

/// Returns the configured nickname for `participant`, or a Discord mention for numeric ids.
#[must_use]
pub fn display_name(participant: &ParticipantId, nicknames: &Nicknames) -> String {
    if let Some(nickname) = nicknames.get(participant.as_str()) {
        return nickname.clone();
    }
    if !participant.as_str().is_empty() && participant.as_str().chars().all(|c| c.is_ascii_digit()) {
        format!("<@{participant}>")
    } else {
        participant.to_string()
    }
}

/// One line describing a participant's net position.
#[must_use]
pub fn format_balance_line(participant: &ParticipantId, balance: Money, nicknames: &Nicknames) -> String {
    let name = display_name(participant, nicknames);
    if balance.is_positive() {
        format!("🟢 {name} is owed {balance}")
    } else if balance.is_negative() {
        format!("🔴 {name} owes {}", balance.abs())
    } else {
        format!("⚪ {name} is settled up")
    }
}

/// Balances sorted from most owed to most owing.
///
/// # Errors
/// Only fails if writing to the string buffer fails.
pub fn format_balances(balances: &Balances, nicknames: &Nicknames) -> Result<String, std::fmt::Error> {
    let mut entries: Vec<(&ParticipantId, Money)> = balances.iter().map(|(p, b)| (p, *b)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut out = String::new();
    for (participant, balance) in entries {
        writeln!(out, "{}", format_balance_line(participant, balance, nicknames))?;
    }
    Ok(out)
}

/// Numbered payment plan, one transfer per line.
///
/// # Errors
/// Only fails if writing to the string buffer fails.
pub fn format_settlement(
    transfers: &[SettlementTransfer],
    nicknames: &Nicknames,
) -> Result<String, std::fmt::Error> {
    if transfers.is_empty() {
        return Ok("Everyone is settled up. 🎉".to_string());
    }

    let mut out = String::new();
    for (index, transfer) in transfers.iter().enumerate() {
        writeln!(
            out,
            "{}. {} → {}: {}",
            index + 1,
            display_name(&transfer.from, nicknames),
            display_name(&transfer.to, nicknames),
            transfer.amount
        )?;
    }
    Ok(out)
}

/// Comma-separated `name amount` pairs.
#[must_use]
pub fn format_split(split: &ResolvedSplit, nicknames: &Nicknames) -> String {
    split
        .allocations()
        .iter()
        .map(|a| format!("{} {}", display_name(&a.participant, nicknames), a.amount))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Summary line for an expense listing.
#[must_use]
pub fn format_expense_summary(expense: &Expense, nicknames: &Nicknames) -> String {
    let trip = expense
        .trip_id
        .as_ref()
        .map(|t| format!(" [{t}]"))
        .unwrap_or_default();
    format!(
        "#{} {}{} | {} | {} paid by {} | {}: {}",
        expense.id,
        expense.date.format("%Y-%m-%d"),
        trip,
        expense.description,
        expense.total,
        display_name(&expense.payer, nicknames),
        expense.split.mode(),
        format_split(&expense.split, nicknames)
    )
}
