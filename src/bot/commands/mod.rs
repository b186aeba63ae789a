//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Balance and settlement commands
pub mod balance;

/// Expense commands
pub mod expense;

/// General utility commands
pub mod general;

/// Split template commands
pub mod template;

// Export commands
pub use balance::*;
pub use expense::*;
pub use general::*;
pub use template::*;
