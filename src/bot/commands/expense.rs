//! Expense Discord commands - `/expense add`, `/expense delete` and `/expense list`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, handlers::autocomplete},
        core::{
            expense::{self, NewExpense, SplitRequest},
            input::{parse_date, parse_participants, parse_scope, parse_split_spec},
            ledger::ExpenseFilter,
            money::Money,
            report,
            split::{ParticipantId, SplitMode},
            template::find_template_by_name,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Most expenses shown by `/expense list`; keeps replies under Discord's message limit.
    const LIST_LIMIT: usize = 15;

    /// Split modes offered as slash command choices.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum ModeChoice {
        #[name = "evenly"]
        Evenly,
        #[name = "by shares"]
        ByShares,
        #[name = "by percentage"]
        ByPercentage,
        #[name = "by amount"]
        ByAmount,
    }

    impl From<ModeChoice> for SplitMode {
        fn from(choice: ModeChoice) -> Self {
            match choice {
                ModeChoice::Evenly => Self::Evenly,
                ModeChoice::ByShares => Self::ByShares,
                ModeChoice::ByPercentage => Self::ByPercentage,
                ModeChoice::ByAmount => Self::ByAmount,
            }
        }
    }

    /// Parent command for recording and browsing shared expenses.
    #[poise::command(
        slash_command,
        subcommands("expense_add", "expense_delete", "expense_list")
    )]
    pub async fn expense(ctx: Context<'_>) -> Result<()> {
        let help_text = "Expense command. Available subcommands:\n\
            `/expense add` - Record an expense and how it is split\n\
            `/expense delete` - Delete an expense by id\n\
            `/expense list` - Show recent expenses";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Records an expense.
    ///
    /// Give either participants (with a mode and values) or a template. With a template,
    /// participants widen the template's member list.
    #[poise::command(slash_command, rename = "add")]
    pub async fn expense_add(
        ctx: Context<'_>,
        #[description = "What the money was spent on"] description: String,
        #[description = "Total paid (e.g., 42.50)"] amount: String,
        #[description = "Participants as mentions or ids"] participants: Option<String>,
        #[description = "How to split (defaults to evenly)"] mode: Option<ModeChoice>,
        #[description = "Comma-separated shares, percentages or amounts in participant order"]
        values: Option<String>,
        #[description = "Split template to apply"]
        #[autocomplete = "autocomplete::autocomplete_template_name"]
        template: Option<String>,
        #[description = "Trip this expense belongs to"] trip: Option<String>,
        #[description = "Who paid (defaults to you)"] payer: Option<serenity::User>,
        #[description = "Date as YYYY-MM-DD (defaults to today)"] date: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let total: Money = amount.parse()?;
        let scope = parse_scope(trip.as_deref());
        let participants = participants
            .as_deref()
            .map(parse_participants)
            .unwrap_or_default();
        let date = match date.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => chrono::Local::now().date_naive(),
        };
        let payer = payer.as_ref().unwrap_or_else(|| ctx.author()).id.to_string();

        let split = if let Some(name) = template.as_deref() {
            let requester = ParticipantId::new(ctx.author().id.to_string());
            let found = find_template_by_name(db, name, scope.as_ref(), &requester)
                .await?
                .ok_or_else(|| Error::TemplateNotFound {
                    id: name.to_string(),
                })?;
            SplitRequest::Template {
                template_id: found.id,
                participants: (!participants.is_empty()).then_some(participants),
            }
        } else {
            if participants.is_empty() {
                ctx.say("❌ Provide participants or a template to split the expense.")
                    .await?;
                return Ok(());
            }
            let mode = mode.map_or(SplitMode::Evenly, SplitMode::from);
            SplitRequest::Spec(parse_split_spec(mode, participants, values.as_deref())?)
        };

        let created = expense::create_expense(
            db,
            NewExpense {
                description,
                total,
                payer: ParticipantId::new(payer),
                date,
                trip_id: scope,
                split,
            },
        )
        .await?;

        ctx.say(format!(
            "✅ Recorded {}",
            report::format_expense_summary(&created, &ctx.data().nicknames)
        ))
        .await?;
        Ok(())
    }

    /// Deletes an expense. Balances are recomputed from the remaining expenses.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn expense_delete(
        ctx: Context<'_>,
        #[description = "Expense id shown by /expense list"] id: i64,
    ) -> Result<()> {
        expense::delete_expense(&ctx.data().database, id).await?;
        ctx.say(format!("🗑️ Deleted expense #{id}")).await?;
        Ok(())
    }

    /// Lists the most recent expenses of a trip or the squad-wide ledger.
    #[poise::command(slash_command, rename = "list")]
    pub async fn expense_list(
        ctx: Context<'_>,
        #[description = "Trip to list (defaults to squad-wide)"] trip: Option<String>,
        #[description = "Only expenses involving this member"] member: Option<serenity::User>,
        #[description = "From date, YYYY-MM-DD"] from: Option<String>,
        #[description = "Until date, YYYY-MM-DD"] until: Option<String>,
    ) -> Result<()> {
        let scope = parse_scope(trip.as_deref());
        let from = from.as_deref().map(parse_date).transpose()?;
        let until = until.as_deref().map(parse_date).transpose()?;

        let mut filter = ExpenseFilter::default().between(from, until);
        if let Some(member) = member {
            filter = filter.participant(ParticipantId::new(member.id.to_string()));
        }

        let expenses = expense::list_expenses(&ctx.data().database, scope.as_ref(), &filter).await?;
        if expenses.is_empty() {
            ctx.say("🧾 No expenses found.").await?;
            return Ok(());
        }

        let title = scope.as_ref().map_or_else(
            || "🧾 **Squad expenses**".to_string(),
            |t| format!("🧾 **Expenses for {t}**"),
        );
        let mut response = format!("{title}\n\n");
        for item in expenses.iter().take(LIST_LIMIT) {
            writeln!(
                response,
                "{}",
                report::format_expense_summary(item, &ctx.data().nicknames)
            )?;
        }
        if expenses.len() > LIST_LIMIT {
            writeln!(response, "…and {} older", expenses.len() - LIST_LIMIT)?;
        }

        ctx.say(response).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
