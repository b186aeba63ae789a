//! In-memory expense ledger and balance aggregation.
//!
//! The ledger holds expenses whose splits are already resolved. Balances are derived on
//! demand from the current expense set; nothing is cached, so removing an expense can
//! never leave a stale balance behind.

use crate::{
    core::{
        money::Money,
        split::{ParticipantId, ResolvedSplit},
    },
    errors::{Error, Result, SplitError},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{cmp::Reverse, collections::BTreeMap, fmt};

/// Database key of an expense.
pub type ExpenseId = i64;

/// Net balance per participant. Positive means the squad owes them money.
pub type Balances = BTreeMap<ParticipantId, Money>;

/// Identifier of a trip that scopes expenses and templates.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TripId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A shared expense with its resolved split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier
    pub id: ExpenseId,
    /// What the money was spent on
    pub description: String,
    /// Amount paid, always positive
    pub total: Money,
    /// Who paid the full total
    pub payer: ParticipantId,
    /// Day the expense happened
    pub date: NaiveDate,
    /// Trip this expense belongs to, `None` for squad-wide expenses
    pub trip_id: Option<TripId>,
    /// Who owes what; sums exactly to `total`
    pub split: ResolvedSplit,
    /// Template the split was expanded from, kept for reference only
    pub template_id: Option<i64>,
}

impl Expense {
    /// Whether `participant` paid for or shares in this expense.
    #[must_use]
    pub fn involves(&self, participant: &ParticipantId) -> bool {
        &self.payer == participant || self.split.includes(participant)
    }
}

/// Restricts [`Ledger::list_expenses`]. Every field left as `None` matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    /// Only expenses paid for or shared by this participant
    pub participant: Option<ParticipantId>,
    /// Inclusive lower date bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub until: Option<NaiveDate>,
    /// Only expenses of this trip
    pub trip_id: Option<TripId>,
}

impl ExpenseFilter {
    #[must_use]
    pub fn participant(mut self, participant: ParticipantId) -> Self {
        self.participant = Some(participant);
        self
    }

    #[must_use]
    pub const fn between(mut self, from: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        self.from = from;
        self.until = until;
        self
    }

    #[must_use]
    pub fn trip(mut self, trip_id: TripId) -> Self {
        self.trip_id = Some(trip_id);
        self
    }

    /// Whether `expense` passes every restriction of this filter.
    #[must_use]
    pub fn matches(&self, expense: &Expense) -> bool {
        self.participant.as_ref().is_none_or(|p| expense.involves(p))
            && self.from.is_none_or(|from| expense.date >= from)
            && self.until.is_none_or(|until| expense.date <= until)
            && self
                .trip_id
                .as_ref()
                .is_none_or(|trip| expense.trip_id.as_ref() == Some(trip))
    }
}

/// Collection of expenses for one scope.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    expenses: BTreeMap<ExpenseId, Expense>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores `expense`, replacing any stored expense with the same id.
    ///
    /// # Errors
    /// - [`Error::InvalidAmount`] if the total is not positive
    /// - [`Error::InvalidSplit`] if the resolved split does not add up to the total
    pub fn add_expense(&mut self, expense: Expense) -> Result<ExpenseId> {
        validate_expense(&expense)?;
        let id = expense.id;
        self.expenses.insert(id, expense);
        Ok(id)
    }

    /// Removes and returns the expense with `id`.
    ///
    /// # Errors
    /// Returns [`Error::ExpenseNotFound`] if no such expense is stored.
    pub fn remove_expense(&mut self, id: ExpenseId) -> Result<Expense> {
        self.expenses
            .remove(&id)
            .ok_or(Error::ExpenseNotFound { id })
    }

    #[must_use]
    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Expenses matching `filter`, newest date first (ties: higher id first).
    pub fn list_expenses(&self, filter: &ExpenseFilter) -> impl Iterator<Item = &Expense> {
        let mut matching: Vec<&Expense> = self
            .expenses
            .values()
            .filter(|expense| filter.matches(expense))
            .collect();
        matching.sort_by_key(|expense| (Reverse(expense.date), Reverse(expense.id)));
        matching.into_iter()
    }

    /// Net balance of every participant across all stored expenses.
    ///
    /// The payer is credited the full total and each split member debited their share, so
    /// the balances always sum to zero. Sums are accumulated in `i128`.
    ///
    /// # Errors
    /// Returns [`Error::BalanceOverflow`] if a participant's balance does not fit in
    /// [`Money`].
    pub fn net_balances(&self) -> Result<Balances> {
        let mut totals: BTreeMap<ParticipantId, i128> = BTreeMap::new();
        for expense in self.expenses.values() {
            *totals.entry(expense.payer.clone()).or_default() += i128::from(expense.total.cents());
            for allocation in expense.split.allocations() {
                *totals.entry(allocation.participant.clone()).or_default() -=
                    i128::from(allocation.amount.cents());
            }
        }

        totals
            .into_iter()
            .map(|(participant, cents)| match i64::try_from(cents) {
                Ok(cents) => Ok((participant, Money::from_cents(cents))),
                Err(_) => Err(Error::BalanceOverflow { participant }),
            })
            .collect()
    }
}

impl FromIterator<Expense> for Ledger {
    /// Builds a ledger from already-validated expenses, e.g. rows loaded from storage.
    fn from_iter<I: IntoIterator<Item = Expense>>(iter: I) -> Self {
        Self {
            expenses: iter.into_iter().map(|e| (e.id, e)).collect(),
        }
    }
}

/// Checks the invariants every stored expense must satisfy.
///
/// # Errors
/// See [`Ledger::add_expense`].
pub fn validate_expense(expense: &Expense) -> Result<()> {
    if !expense.total.is_positive() {
        return Err(Error::InvalidAmount {
            amount: expense.total.to_string(),
        });
    }
    let allocated = expense.split.total();
    if allocated != expense.total {
        return Err(SplitError::AmountTotal {
            expected: expense.total,
            actual: allocated,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::split::{SplitSpec, resolve};
    use proptest::prelude::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn even_expense(id: ExpenseId, payer: &str, cents: i64, members: &[&str], day: u32) -> Expense {
        let spec = SplitSpec::Evenly(members.iter().copied().map(ParticipantId::from).collect());
        let total = Money::from_cents(cents);
        Expense {
            id,
            description: format!("expense {id}"),
            total,
            payer: ParticipantId::from(payer),
            date: date(day),
            trip_id: None,
            split: resolve(total, &spec).unwrap(),
            template_id: None,
        }
    }

    #[test]
    fn test_net_balances_single_expense() {
        let mut ledger = Ledger::new();
        ledger
            .add_expense(even_expense(1, "a", 3_000, &["a", "b", "c"], 1))
            .unwrap();

        let balances = ledger.net_balances().unwrap();
        assert_eq!(balances[&ParticipantId::from("a")], Money::from_cents(2_000));
        assert_eq!(balances[&ParticipantId::from("b")], Money::from_cents(-1_000));
        assert_eq!(balances[&ParticipantId::from("c")], Money::from_cents(-1_000));
    }

    #[test]
    fn test_payer_outside_split_is_credited_in_full() {
        let mut ledger = Ledger::new();
        ledger
            .add_expense(even_expense(1, "host", 1_000, &["a", "b"], 1))
            .unwrap();

        let balances = ledger.net_balances().unwrap();
        assert_eq!(balances[&ParticipantId::from("host")], Money::from_cents(1_000));
        assert_eq!(balances.values().copied().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn test_add_rejects_non_positive_total() {
        let mut expense = even_expense(1, "a", 1_000, &["a"], 1);
        expense.total = Money::ZERO;
        expense.split = resolve(Money::ZERO, &SplitSpec::Evenly(vec![ParticipantId::from("a")])).unwrap();
        assert!(matches!(
            Ledger::new().add_expense(expense),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_add_rejects_split_not_matching_total() {
        let mut expense = even_expense(1, "a", 1_000, &["a", "b"], 1);
        expense.total = Money::from_cents(1_001);
        assert!(matches!(
            Ledger::new().add_expense(expense),
            Err(Error::InvalidSplit(SplitError::AmountTotal { .. }))
        ));
    }

    #[test]
    fn test_add_with_existing_id_replaces() {
        let mut ledger = Ledger::new();
        ledger
            .add_expense(even_expense(1, "a", 1_000, &["a", "b"], 1))
            .unwrap();
        ledger
            .add_expense(even_expense(1, "b", 400, &["a", "b"], 1))
            .unwrap();

        assert_eq!(ledger.len(), 1);
        let balances = ledger.net_balances().unwrap();
        assert_eq!(balances[&ParticipantId::from("b")], Money::from_cents(200));
    }

    #[test]
    fn test_net_balances_reports_overflow() {
        let mut ledger = Ledger::new();
        ledger
            .add_expense(even_expense(1, "a", 5_000_000_000_000_000_000, &["b"], 1))
            .unwrap();
        ledger
            .add_expense(even_expense(2, "a", 5_000_000_000_000_000_000, &["b"], 2))
            .unwrap();

        assert!(matches!(
            ledger.net_balances(),
            Err(Error::BalanceOverflow { participant }) if participant == ParticipantId::from("a")
        ));
    }

    #[test]
    fn test_remove_expense() {
        let mut ledger = Ledger::new();
        ledger
            .add_expense(even_expense(7, "a", 1_000, &["a", "b"], 1))
            .unwrap();

        let removed = ledger.remove_expense(7).unwrap();
        assert_eq!(removed.id, 7);
        assert!(ledger.is_empty());
        assert!(ledger.net_balances().unwrap().is_empty());
        assert!(matches!(
            ledger.remove_expense(7),
            Err(Error::ExpenseNotFound { id: 7 })
        ));
    }

    #[test]
    fn test_list_expenses_newest_first_and_filtered() {
        let mut ledger = Ledger::new();
        ledger.add_expense(even_expense(1, "a", 100, &["a", "b"], 3)).unwrap();
        ledger.add_expense(even_expense(2, "b", 100, &["b", "c"], 5)).unwrap();
        ledger.add_expense(even_expense(3, "c", 100, &["c"], 5)).unwrap();
        let mut trip_expense = even_expense(4, "a", 100, &["a"], 1);
        trip_expense.trip_id = Some(TripId::from("lisbon"));
        ledger.add_expense(trip_expense).unwrap();

        let all: Vec<ExpenseId> = ledger
            .list_expenses(&ExpenseFilter::default())
            .map(|e| e.id)
            .collect();
        assert_eq!(all, vec![3, 2, 1, 4]);

        let with_b: Vec<ExpenseId> = ledger
            .list_expenses(&ExpenseFilter::default().participant(ParticipantId::from("b")))
            .map(|e| e.id)
            .collect();
        assert_eq!(with_b, vec![2, 1]);

        let early: Vec<ExpenseId> = ledger
            .list_expenses(&ExpenseFilter::default().between(Some(date(2)), Some(date(4))))
            .map(|e| e.id)
            .collect();
        assert_eq!(early, vec![1]);

        let trip: Vec<ExpenseId> = ledger
            .list_expenses(&ExpenseFilter::default().trip(TripId::from("lisbon")))
            .map(|e| e.id)
            .collect();
        assert_eq!(trip, vec![4]);
    }

    proptest! {
        #[test]
        fn balances_always_sum_to_zero(
            expenses in prop::collection::vec(
                (0usize..5, 1i64..=100_000, prop::collection::vec(0usize..5, 1..=5)),
                0..=30,
            ),
        ) {
            let names = ["a", "b", "c", "d", "e"];
            let mut ledger = Ledger::new();
            for (id, (payer, cents, members)) in expenses.into_iter().enumerate() {
                let mut members: Vec<&str> = members.into_iter().map(|m| names[m]).collect();
                members.sort_unstable();
                members.dedup();
                let id = ExpenseId::try_from(id).unwrap();
                ledger.add_expense(even_expense(id, names[payer], cents, &members, 1)).unwrap();
            }
            let balances = ledger.net_balances().unwrap();
            prop_assert_eq!(balances.values().copied().sum::<Money>(), Money::ZERO);
        }
    }
}
