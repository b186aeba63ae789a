//! Expense entity - one shared expense paid by a single squad member.
//!
//! Totals are stored as integer cents. The resolved split lives in `expense_shares`,
//! one row per participant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// What the money was spent on
    pub description: String,
    /// Total paid, in cents
    pub total_cents: i64,
    /// Squad member who paid
    pub payer_id: String,
    /// Day the expense happened
    pub date: Date,
    /// Trip scope, None for squad-wide expenses
    pub trip_id: Option<String>,
    /// Split mode name (`"evenly"`, `"by_shares"`, `"by_percentage"`, `"by_amount"`)
    pub split_mode: String,
    /// Template the split was expanded from, if any
    pub template_id: Option<i64>,
    /// When the expense was recorded or last replaced
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One expense has one share row per participant
    #[sea_orm(has_many = "super::expense_share::Entity")]
    Shares,
}

impl Related<super::expense_share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
