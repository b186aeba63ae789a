//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::Context, core::template};

/// Suggests names of templates usable in the squad-wide scope (which includes global ones).
///
/// Matching is case-insensitive and limited to Discord's 25 suggestions.
pub async fn autocomplete_template_name(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(templates) = template::list_templates_for_scope(db, None).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = templates
        .into_iter()
        .filter(|t| t.name.to_lowercase().contains(&partial_lower))
        .map(|t| t.name)
        .take(25)
        .collect();

    matching.sort();
    matching.dedup();
    matching
}
