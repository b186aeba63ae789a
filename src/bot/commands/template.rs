//! Split template Discord commands - `/template save`, `/template delete` and `/template list`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, commands::expense::ModeChoice, handlers::autocomplete},
        core::{
            input::{parse_participants, parse_scope, parse_split_spec},
            report::display_name,
            split::{ParticipantId, SplitMode},
            template::{self, TemplateDraft},
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Parent command for managing reusable split templates.
    #[poise::command(
        slash_command,
        subcommands("template_save", "template_delete", "template_list")
    )]
    pub async fn template(ctx: Context<'_>) -> Result<()> {
        let help_text = "Template command. Available subcommands:\n\
            `/template save` - Save or overwrite one of your templates\n\
            `/template delete` - Delete one of your templates\n\
            `/template list` - Show templates usable in a trip or squad-wide";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Saves a split template owned by you. Saving an existing name overwrites it.
    #[poise::command(slash_command, rename = "save")]
    pub async fn template_save(
        ctx: Context<'_>,
        #[description = "Template name"] name: String,
        #[description = "Participants as mentions or ids"] participants: String,
        #[description = "How to split (defaults to evenly)"] mode: Option<ModeChoice>,
        #[description = "Comma-separated shares, percentages or amounts in participant order"]
        values: Option<String>,
        #[description = "Trip the template belongs to"] trip: Option<String>,
        #[description = "Usable in every trip and squad-wide"] global: Option<bool>,
    ) -> Result<()> {
        let mode = mode.map_or(SplitMode::Evenly, SplitMode::from);
        let spec = parse_split_spec(mode, parse_participants(&participants), values.as_deref())?;

        let saved = template::save_template(
            &ctx.data().database,
            TemplateDraft {
                name,
                owner: ParticipantId::new(ctx.author().id.to_string()),
                trip_id: parse_scope(trip.as_deref()),
                is_global: global.unwrap_or(false),
                spec,
            },
        )
        .await?;

        ctx.say(format!(
            "✅ Saved template '{}' ({}, {} participants)",
            saved.name,
            saved.spec.mode(),
            saved.spec.participants().len()
        ))
        .await?;
        Ok(())
    }

    /// Deletes one of your templates. Expenses already split with it are unchanged.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn template_delete(
        ctx: Context<'_>,
        #[description = "Template name"]
        #[autocomplete = "autocomplete::autocomplete_template_name"]
        name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let owner = ParticipantId::new(ctx.author().id.to_string());

        let found = template::find_owned_template(db, &owner, &name)
            .await?
            .ok_or_else(|| Error::TemplateNotFound { id: name.clone() })?;
        template::delete_template(db, found.id, &owner).await?;

        ctx.say(format!("🗑️ Deleted template '{}'", found.name)).await?;
        Ok(())
    }

    /// Lists templates usable in a trip, or squad-wide.
    #[poise::command(slash_command, rename = "list")]
    pub async fn template_list(
        ctx: Context<'_>,
        #[description = "Trip to list templates for"] trip: Option<String>,
    ) -> Result<()> {
        let scope = parse_scope(trip.as_deref());
        let templates = template::list_templates_for_scope(&ctx.data().database, scope.as_ref()).await?;

        if templates.is_empty() {
            ctx.say("📋 No templates available. Create one with `/template save`.")
                .await?;
            return Ok(());
        }

        let nicknames = &ctx.data().nicknames;
        let mut response = String::from("📋 **Split templates**\n\n");
        for t in templates {
            let reach = if t.is_global {
                "🌍 global".to_string()
            } else {
                t.trip_id
                    .as_ref()
                    .map_or_else(|| "👥 squad".to_string(), |trip| format!("🧳 {trip}"))
            };
            let members = t
                .spec
                .participants()
                .into_iter()
                .map(|p| display_name(p, nicknames))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                response,
                "**{}** ({}) by {} - {}: {}",
                t.name,
                reach,
                display_name(&t.owner, nicknames),
                t.spec.mode(),
                members
            )?;
        }

        ctx.say(response).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
