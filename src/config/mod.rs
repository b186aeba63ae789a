/// Database configuration and connection management
pub mod database;

/// Split template seeding from config.toml
pub mod templates;

/// Squad member nicknames from environment variables
pub mod users;
