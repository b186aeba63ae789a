//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod expense;
pub mod expense_share;
pub mod split_template;
pub mod template_share;

pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use expense_share::{
    Column as ExpenseShareColumn, Entity as ExpenseShare, Model as ExpenseShareModel,
};
pub use split_template::{
    Column as SplitTemplateColumn, Entity as SplitTemplate, Model as SplitTemplateModel,
};
pub use template_share::{
    Column as TemplateShareColumn, Entity as TemplateShare, Model as TemplateShareModel,
};
