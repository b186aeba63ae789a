//! Split template entity - a named, reusable split configuration.
//!
//! Templates are either global (usable anywhere) or scoped to one trip. Their participant
//! values live in `template_shares`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Split template database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "split_templates")]
pub struct Model {
    /// Unique identifier for the template
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Rent", "Road trip fuel")
    pub name: String,
    /// Squad member who owns and may delete the template
    pub owner_id: String,
    /// Trip the template belongs to, if any
    pub trip_id: Option<String>,
    /// Split mode name
    pub split_mode: String,
    /// Eligible in every scope when true
    pub is_global: bool,
    /// When the template was created
    pub created_at: DateTime,
    /// When the template was last saved
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One template has one share row per participant
    #[sea_orm(has_many = "super::template_share::Entity")]
    Shares,
}

impl Related<super::template_share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
