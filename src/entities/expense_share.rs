//! Expense share entity - a participant's resolved portion of an expense.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense share database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_shares")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Expense this share belongs to
    pub expense_id: i64,
    /// Squad member owing this share
    pub participant_id: String,
    /// Position in the original split; decides who absorbed leftover cents
    pub position: i32,
    /// Raw split value as entered (shares, basis points or cents)
    pub raw_value: i64,
    /// Resolved amount owed, in cents
    pub amount_cents: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each share belongs to one expense
    #[sea_orm(
        belongs_to = "super::expense::Entity",
        from = "Column::ExpenseId",
        to = "super::expense::Column::Id"
    )]
    Expense,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
