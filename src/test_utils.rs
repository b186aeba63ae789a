//! Shared test utilities for `SquadLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test templates and expenses with sensible defaults.

use crate::{
    core::{
        expense::{NewExpense, SplitRequest},
        ledger::TripId,
        money::Money,
        split::{ParticipantId, SplitSpec},
        template::{self, SplitTemplate, TemplateDraft},
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test template with sensible defaults.
///
/// # Defaults
/// * owner: `"alice"`
/// * mode: evenly over `alice`, `bob` and `carol`
pub async fn create_test_template(
    db: &DatabaseConnection,
    name: &str,
    trip: Option<&str>,
    is_global: bool,
) -> Result<SplitTemplate> {
    template::save_template(
        db,
        TemplateDraft {
            name: name.to_string(),
            owner: ParticipantId::from("alice"),
            trip_id: trip.map(TripId::from),
            is_global,
            spec: SplitSpec::Evenly(["alice", "bob", "carol"].into_iter().map(ParticipantId::from).collect()),
        },
    )
    .await
}

/// Builds an evenly split expense input dated 2025-06-01.
#[must_use]
pub fn new_even_expense(payer: &str, cents: i64, members: &[&str], trip: Option<&str>) -> NewExpense {
    NewExpense {
        description: "Test expense".to_string(),
        total: Money::from_cents(cents),
        payer: ParticipantId::from(payer),
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
        trip_id: trip.map(TripId::from),
        split: SplitRequest::Spec(SplitSpec::Evenly(
            members.iter().copied().map(ParticipantId::from).collect(),
        )),
    }
}
