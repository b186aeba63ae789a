//! Unified error types for the squad ledger.
//!
//! Validation failures (`InvalidSplit`, `ParticipantMismatch`, ...) are deterministic and
//! are never retried. `UnbalancedLedger` signals a data-integrity bug upstream rather than
//! a user mistake.

use crate::core::{money::Money, split::ParticipantId};
use thiserror::Error;

/// Reasons a split specification cannot be resolved into exact amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// The split names nobody.
    #[error("a split needs at least one participant")]
    NoParticipants,

    /// The same participant appears twice.
    #[error("participant {participant} appears more than once")]
    DuplicateParticipant {
        /// The repeated participant
        participant: ParticipantId,
    },

    /// A share count, percentage or amount is below zero.
    #[error("value for {participant} must not be negative (got {value})")]
    NegativeValue {
        /// Participant carrying the offending value
        participant: ParticipantId,
        /// The raw value as given
        value: i64,
    },

    /// `BY_SHARES` requires every participant to hold at least one share.
    #[error("{participant} must hold at least one share")]
    ZeroShare {
        /// Participant with a zero share
        participant: ParticipantId,
    },

    /// Percentages must add up to exactly 100%.
    #[error("percentages must sum to 100% (got {}%)", format_basis_points(.basis_points))]
    PercentageTotal {
        /// Sum of the given percentages in basis points
        basis_points: i64,
    },

    /// Fixed amounts must add up to the expense total.
    #[error("amounts must sum to the total of {expected} (got {actual})")]
    AmountTotal {
        /// Expense total
        expected: Money,
        /// Sum of the given amounts
        actual: Money,
    },
}

/// Errors surfaced by every ledger, template and bot operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or non-reconciling split specification.
    #[error("Invalid split: {0}")]
    InvalidSplit(#[from] SplitError),

    /// Expense totals must be positive and representable in cents.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Offending amount as given by the caller
        amount: String,
    },

    /// Referenced expense does not exist.
    #[error("Expense {id} not found")]
    ExpenseNotFound {
        /// Expense id that was looked up
        id: i64,
    },

    /// Referenced template does not exist or is not visible in the requested scope.
    #[error("Split template {id} not found")]
    TemplateNotFound {
        /// Template id or name that was looked up
        id: String,
    },

    /// A participant override dropped members the template requires.
    #[error("Participant override is missing template members: {}", join_ids(.missing))]
    ParticipantMismatch {
        /// Template participants absent from the override
        missing: Vec<ParticipantId>,
    },

    /// A participant's net balance does not fit in the money range.
    #[error("Balance of {participant} is too large to represent")]
    BalanceOverflow {
        /// Participant whose balance overflowed
        participant: ParticipantId,
    },

    /// Balances handed to the settlement calculator do not sum to zero.
    #[error("Ledger is unbalanced by {residual}")]
    UnbalancedLedger {
        /// Sum of all balances (should be zero)
        residual: Money,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Persistence collaborator failure.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (reading config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Formatting a bot reply failed.
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Serenity/Poise framework error.
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Whether the error was caused by user input and can be shown as-is.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSplit(_)
                | Self::InvalidAmount { .. }
                | Self::ExpenseNotFound { .. }
                | Self::TemplateNotFound { .. }
                | Self::ParticipantMismatch { .. }
                | Self::BalanceOverflow { .. }
                | Self::Config { .. }
        )
    }
}

fn format_basis_points(basis_points: &i64) -> String {
    let sign = if *basis_points < 0 { "-" } else { "" };
    let abs = basis_points.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

fn join_ids(ids: &[ParticipantId]) -> String {
    ids.iter()
        .map(ParticipantId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
