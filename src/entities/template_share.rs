//! Template share entity - a participant's raw value within a split template.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Template share database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "template_shares")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Template this value belongs to
    pub template_id: i64,
    /// Squad member
    pub participant_id: String,
    /// Order within the template
    pub position: i32,
    /// Share count, basis points or cents depending on the template mode
    pub raw_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::split_template::Entity",
        from = "Column::TemplateId",
        to = "super::split_template::Column::Id"
    )]
    Template,
}

impl Related<super::split_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
