//! Split rule evaluation - turns a split specification into exact per-participant amounts.
//!
//! Resolution is a pure function: the same total and specification always produce the same
//! `ResolvedSplit`, down to which participant receives a leftover cent. Weighted modes use
//! largest-remainder rounding so the resolved amounts always add back up to the total.

use crate::{
    core::money::Money,
    errors::{Error, Result, SplitError},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Reverse, collections::HashSet, fmt, str::FromStr};

/// Basis points making up 100%.
pub const FULL_PERCENTAGE_BASIS_POINTS: i64 = 10_000;

/// Identifier of a squad member taking part in expenses.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps a raw member id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How an expense total is divided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Equal parts, leftover cents to the first participants
    Evenly,
    /// Proportional to integer share counts
    ByShares,
    /// Proportional to percentages (basis points summing to 100%)
    ByPercentage,
    /// Fixed amounts that must add up to the total
    ByAmount,
}

impl SplitMode {
    /// Stable name used in storage and config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Evenly => "evenly",
            Self::ByShares => "by_shares",
            Self::ByPercentage => "by_percentage",
            Self::ByAmount => "by_amount",
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evenly" | "even" => Ok(Self::Evenly),
            "by_shares" | "shares" => Ok(Self::ByShares),
            "by_percentage" | "percentage" | "percent" => Ok(Self::ByPercentage),
            "by_amount" | "amount" => Ok(Self::ByAmount),
            other => Err(Error::Config {
                message: format!("Unknown split mode '{other}'"),
            }),
        }
    }
}

/// A split request: one variant per mode so each carries only the values it needs.
///
/// Participant order matters. It decides who absorbs leftover cents when amounts
/// cannot be divided exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "entries", rename_all = "snake_case")]
pub enum SplitSpec {
    /// Divide equally among these participants
    Evenly(Vec<ParticipantId>),
    /// Participant and share count
    ByShares(Vec<(ParticipantId, i64)>),
    /// Participant and percentage in basis points (`3_333` = 33.33%)
    ByPercentage(Vec<(ParticipantId, i64)>),
    /// Participant and fixed amount
    ByAmount(Vec<(ParticipantId, Money)>),
}

impl SplitSpec {
    /// Builds a spec from untyped `(participant, raw value)` pairs as stored on disk.
    ///
    /// Raw values are share counts, basis points or cents depending on `mode` and are
    /// ignored for [`SplitMode::Evenly`].
    #[must_use]
    pub fn from_raw(mode: SplitMode, entries: Vec<(ParticipantId, i64)>) -> Self {
        match mode {
            SplitMode::Evenly => Self::Evenly(entries.into_iter().map(|(p, _)| p).collect()),
            SplitMode::ByShares => Self::ByShares(entries),
            SplitMode::ByPercentage => Self::ByPercentage(entries),
            SplitMode::ByAmount => Self::ByAmount(
                entries
                    .into_iter()
                    .map(|(p, cents)| (p, Money::from_cents(cents)))
                    .collect(),
            ),
        }
    }

    /// Inverse of [`SplitSpec::from_raw`]. `Evenly` entries carry a raw value of 1.
    #[must_use]
    pub fn to_raw(&self) -> Vec<(ParticipantId, i64)> {
        match self {
            Self::Evenly(participants) => participants.iter().map(|p| (p.clone(), 1)).collect(),
            Self::ByShares(entries) | Self::ByPercentage(entries) => entries.clone(),
            Self::ByAmount(entries) => entries
                .iter()
                .map(|(p, amount)| (p.clone(), amount.cents()))
                .collect(),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SplitMode {
        match self {
            Self::Evenly(_) => SplitMode::Evenly,
            Self::ByShares(_) => SplitMode::ByShares,
            Self::ByPercentage(_) => SplitMode::ByPercentage,
            Self::ByAmount(_) => SplitMode::ByAmount,
        }
    }

    /// Participants in spec order.
    #[must_use]
    pub fn participants(&self) -> Vec<&ParticipantId> {
        match self {
            Self::Evenly(participants) => participants.iter().collect(),
            Self::ByShares(entries) | Self::ByPercentage(entries) => {
                entries.iter().map(|(p, _)| p).collect()
            }
            Self::ByAmount(entries) => entries.iter().map(|(p, _)| p).collect(),
        }
    }
}

/// One participant's resolved portion of an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Who owes this portion
    pub participant: ParticipantId,
    /// Exact amount owed
    pub amount: Money,
}

/// A split with concrete amounts that add up exactly to the expense total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSplit {
    mode: SplitMode,
    allocations: Vec<Allocation>,
}

impl ResolvedSplit {
    /// Rebuilds a split from stored allocations without re-resolving it.
    ///
    /// Callers that accept these values from outside should check [`ResolvedSplit::total`]
    /// against the expense; the ledger does so on insert.
    #[must_use]
    pub const fn from_allocations(mode: SplitMode, allocations: Vec<Allocation>) -> Self {
        Self { mode, allocations }
    }

    #[must_use]
    pub const fn mode(&self) -> SplitMode {
        self.mode
    }

    /// Allocations in spec order.
    #[must_use]
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Sum of all allocated amounts.
    #[must_use]
    pub fn total(&self) -> Money {
        let cents: i128 = self
            .allocations
            .iter()
            .map(|a| i128::from(a.amount.cents()))
            .sum();
        Money::from_cents(saturate(cents))
    }

    /// Amount owed by `participant`, if they are part of this split.
    #[must_use]
    pub fn amount_for(&self, participant: &ParticipantId) -> Option<Money> {
        self.allocations
            .iter()
            .find(|a| &a.participant == participant)
            .map(|a| a.amount)
    }

    #[must_use]
    pub fn includes(&self, participant: &ParticipantId) -> bool {
        self.allocations.iter().any(|a| &a.participant == participant)
    }
}

/// Resolves `spec` against `total`, producing exact per-participant amounts.
///
/// # Errors
/// - [`Error::InvalidAmount`] when `total` is negative
/// - [`Error::InvalidSplit`] when the participant set is empty or repeats a member, a raw
///   value is negative, a share count is zero, percentages do not sum to 100%, or fixed
///   amounts do not sum to `total`
pub fn resolve(total: Money, spec: &SplitSpec) -> Result<ResolvedSplit> {
    if total.is_negative() {
        return Err(Error::InvalidAmount {
            amount: total.to_string(),
        });
    }

    check_participants(&spec.participants())?;

    let amounts = match spec {
        SplitSpec::Evenly(participants) => distribute(total, &vec![1; participants.len()]),
        SplitSpec::ByShares(entries) => {
            check_non_negative(entries)?;
            if let Some((participant, _)) = entries.iter().find(|(_, shares)| *shares == 0) {
                return Err(SplitError::ZeroShare {
                    participant: participant.clone(),
                }
                .into());
            }
            let weights: Vec<i64> = entries.iter().map(|(_, shares)| *shares).collect();
            distribute(total, &weights)
        }
        SplitSpec::ByPercentage(entries) => {
            check_non_negative(entries)?;
            let weights: Vec<i64> = entries.iter().map(|(_, bp)| *bp).collect();
            let sum: i128 = weights.iter().copied().map(i128::from).sum();
            if sum != i128::from(FULL_PERCENTAGE_BASIS_POINTS) {
                return Err(SplitError::PercentageTotal {
                    basis_points: saturate(sum),
                }
                .into());
            }
            distribute(total, &weights)
        }
        SplitSpec::ByAmount(entries) => {
            if let Some((participant, amount)) = entries.iter().find(|(_, a)| a.is_negative()) {
                return Err(SplitError::NegativeValue {
                    participant: participant.clone(),
                    value: amount.cents(),
                }
                .into());
            }
            let sum: i128 = entries.iter().map(|(_, a)| i128::from(a.cents())).sum();
            if sum != i128::from(total.cents()) {
                return Err(SplitError::AmountTotal {
                    expected: total,
                    actual: Money::from_cents(saturate(sum)),
                }
                .into());
            }
            entries.iter().map(|(_, amount)| *amount).collect()
        }
    };

    let allocations = spec
        .participants()
        .into_iter()
        .zip(amounts)
        .map(|(participant, amount)| Allocation {
            participant: participant.clone(),
            amount,
        })
        .collect();

    Ok(ResolvedSplit {
        mode: spec.mode(),
        allocations,
    })
}

fn check_participants(participants: &[&ParticipantId]) -> Result<()> {
    if participants.is_empty() {
        return Err(SplitError::NoParticipants.into());
    }
    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        if !seen.insert(*participant) {
            return Err(SplitError::DuplicateParticipant {
                participant: (*participant).clone(),
            }
            .into());
        }
    }
    Ok(())
}

fn check_non_negative(entries: &[(ParticipantId, i64)]) -> Result<()> {
    match entries.iter().find(|(_, value)| *value < 0) {
        Some((participant, value)) => Err(SplitError::NegativeValue {
            participant: participant.clone(),
            value: *value,
        }
        .into()),
        None => Ok(()),
    }
}

/// Clamps an `i128` sum into `i64`, keeping its sign.
pub(crate) fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Largest-remainder distribution of `total` proportional to `weights`.
///
/// Everyone gets `floor(total * w / W)`; the leftover cents go one each to the largest
/// fractional remainders, ties resolved by position. Weights are non-negative with a
/// positive sum.
fn distribute(total: Money, weights: &[i64]) -> Vec<Money> {
    let total = i128::from(total.cents());
    let weight_sum: i128 = weights.iter().copied().map(i128::from).sum();

    let mut amounts = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (index, weight) in weights.iter().copied().enumerate() {
        let product = total * i128::from(weight);
        amounts.push(product / weight_sum);
        remainders.push((index, product % weight_sum));
    }

    let leftover = total - amounts.iter().sum::<i128>();
    // sort_by_key is stable, so equal remainders keep spec order
    remainders.sort_by_key(|&(_, remainder)| Reverse(remainder));
    for &(index, _) in remainders.iter().take(usize::try_from(leftover).unwrap_or(0)) {
        amounts[index] += 1;
    }

    amounts
        .into_iter()
        // each portion is bounded by the i64 total
        .map(|cents| Money::from_cents(saturate(cents)))
        .collect()
}
