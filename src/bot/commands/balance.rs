//! Balance Discord commands - `/balances` and `/settle`.
//!
//! Both commands work on one scope at a time: a named trip or, without a trip, the
//! squad-wide ledger.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::Context,
        core::{expense, input::parse_scope, ledger::TripId, report},
        errors::Result,
    };

    fn scope_label(scope: Option<&TripId>) -> String {
        scope.map_or_else(|| "the squad".to_string(), |t| format!("trip {t}"))
    }

    /// Shows who is owed and who owes money.
    #[poise::command(slash_command, prefix_command)]
    pub async fn balances(
        ctx: Context<'_>,
        #[description = "Trip to show (defaults to squad-wide)"] trip: Option<String>,
    ) -> Result<()> {
        let scope = parse_scope(trip.as_deref());
        let balances = expense::get_balances(&ctx.data().database, scope.as_ref()).await?;

        if balances.is_empty() {
            ctx.say(format!("📊 No expenses recorded for {} yet.", scope_label(scope.as_ref())))
                .await?;
            return Ok(());
        }

        let body = report::format_balances(&balances, &ctx.data().nicknames)?;
        ctx.say(format!(
            "📊 **Balances for {}**\n\n{body}",
            scope_label(scope.as_ref())
        ))
        .await?;
        Ok(())
    }

    /// Suggests the payments that settle every balance.
    #[poise::command(slash_command, prefix_command)]
    pub async fn settle(
        ctx: Context<'_>,
        #[description = "Trip to settle (defaults to squad-wide)"] trip: Option<String>,
    ) -> Result<()> {
        let scope = parse_scope(trip.as_deref());
        let transfers = expense::get_settlement(&ctx.data().database, scope.as_ref()).await?;

        let body = report::format_settlement(&transfers, &ctx.data().nicknames)?;
        ctx.say(format!(
            "💸 **Settling up {}**\n\n{body}",
            scope_label(scope.as_ref())
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
