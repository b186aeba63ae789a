//! Settlement calculation - turns net balances into a short list of payments.
//!
//! Greedy heuristic: the largest remaining debtor pays the largest remaining creditor as
//! much as either can absorb, until everybody is at zero. Every transfer zeroes at least
//! one party, so `n` nonzero balances settle in at most `n - 1` transfers.

use crate::{
    core::{
        ledger::Balances,
        money::Money,
        split::{ParticipantId, saturate},
    },
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};
use tracing::debug;

/// A suggested payment from a debtor to a creditor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTransfer {
    /// Participant paying
    pub from: ParticipantId,
    /// Participant receiving
    pub to: ParticipantId,
    /// Always positive
    pub amount: Money,
}

/// Heap entry: larger amounts first, then smaller participant ids.
///
/// Amounts are unsigned magnitudes in cents; `i128` holds `|i64::MIN|`.
#[derive(Debug, PartialEq, Eq)]
struct Party {
    remaining: i128,
    participant: Reverse<ParticipantId>,
}

impl Ord for Party {
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining
            .cmp(&other.remaining)
            .then_with(|| self.participant.cmp(&other.participant))
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Computes a payment plan that brings every balance in `balances` to zero.
///
/// # Errors
/// Returns [`Error::UnbalancedLedger`] when the balances do not sum to zero.
pub fn settle(balances: &Balances) -> Result<Vec<SettlementTransfer>> {
    let residual: i128 = balances.values().map(|b| i128::from(b.cents())).sum();
    if residual != 0 {
        return Err(Error::UnbalancedLedger {
            residual: Money::from_cents(saturate(residual)),
        });
    }

    let mut creditors = BinaryHeap::new();
    let mut debtors = BinaryHeap::new();
    for (participant, balance) in balances {
        let party = Party {
            remaining: i128::from(balance.cents()).abs(),
            participant: Reverse(participant.clone()),
        };
        if balance.is_positive() {
            creditors.push(party);
        } else if balance.is_negative() {
            debtors.push(party);
        }
    }

    let mut transfers = Vec::with_capacity((creditors.len() + debtors.len()).saturating_sub(1));
    while let (Some(mut creditor), Some(mut debtor)) = (creditors.pop(), debtors.pop()) {
        // a creditor never holds more than i64::MAX, so the transfer always fits
        let amount = creditor.remaining.min(debtor.remaining);
        transfers.push(SettlementTransfer {
            from: debtor.participant.0.clone(),
            to: creditor.participant.0.clone(),
            amount: Money::from_cents(saturate(amount)),
        });

        creditor.remaining -= amount;
        debtor.remaining -= amount;
        if creditor.remaining != 0 {
            creditors.push(creditor);
        }
        if debtor.remaining != 0 {
            debtors.push(debtor);
        }
    }

    debug!(
        "Settled {} balances with {} transfers",
        balances.len(),
        transfers.len()
    );
    Ok(transfers)
}
