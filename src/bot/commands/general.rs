//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**SquadLedger Help**\n\
        Track shared expenses for the squad and for each trip, then settle up.\n\n\
        **Expenses**\n\
        • `/expense add <description> <amount> [participants] [mode] [values] [template] [trip] [payer] [date]` - Records an expense.\n\
        • `/expense delete <id>` - Deletes an expense.\n\
        • `/expense list [trip] [member] [from] [until]` - Shows recent expenses.\n\n\
        **Balances**\n\
        • `/balances [trip]` - Shows who is owed and who owes.\n\
        • `/settle [trip]` - Suggests the payments that settle everyone up.\n\n\
        **Templates**\n\
        • `/template save <name> <participants> [mode] [values] [trip] [global]` - Saves a reusable split.\n\
        • `/template delete <name>` - Deletes one of your templates.\n\
        • `/template list [trip]` - Shows templates usable in a trip or squad-wide.\n\n\
        **Split values**\n\
        Shares are whole numbers (`2,1,1`), percentages must add up to 100 (`50,25,25`), \
        amounts must add up to the total (`12.50,7.50`).\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
