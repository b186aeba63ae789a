//! Squad member configuration loaded from environment variables.
//!
//! `SQUAD_MEMBERS` holds comma-separated `id:nickname` pairs, for example
//! `111:Sam,222:Robin`. Nicknames are optional; members without one are shown as
//! Discord mentions.

use crate::core::report::Nicknames;
use tracing::warn;

/// Parses `id:nickname` pairs. Malformed entries are skipped with a warning.
#[must_use]
pub fn parse_members(raw: &str) -> Nicknames {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = entry
                .split_once(':')
                .map(|(id, nickname)| (id.trim(), nickname.trim()))
                .filter(|(id, nickname)| !id.is_empty() && !nickname.is_empty());
            if parsed.is_none() {
                warn!("Ignoring malformed SQUAD_MEMBERS entry '{entry}'");
            }
            parsed.map(|(id, nickname)| (id.to_string(), nickname.to_string()))
        })
        .collect()
}

/// Gets the configured member nicknames from `SQUAD_MEMBERS`.
#[must_use]
pub fn get_user_nicknames() -> Nicknames {
    std::env::var("SQUAD_MEMBERS")
        .map(|raw| parse_members(&raw))
        .unwrap_or_default()
}
