//! Core business logic - framework-agnostic expense splitting, balances and settlement.
//!
//! The pure pieces (`money`, `split`, `ledger`, `settlement`) never touch storage. The
//! `expense` and `template` modules wrap them with the persistence collaborator.

pub mod expense;
pub mod input;
pub mod ledger;
pub mod money;
pub mod report;
pub mod settlement;
pub mod split;
pub mod template;
