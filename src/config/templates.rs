//! Split template configuration loading from config.toml
//!
//! Templates defined in config.toml are saved on start when their owner has no
//! template of the same name yet. Existing templates are never overwritten, so edits
//! made through the bot survive restarts.

use crate::{
    core::{
        input::{parse_participants, parse_scope, parse_split_spec},
        split::{ParticipantId, SplitMode},
        template::{self, TemplateDraft},
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Templates to seed
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
}

/// Configuration for a single split template
#[derive(Debug, Deserialize, Clone)]
pub struct TemplateConfig {
    /// Template name, unique per owner
    pub name: String,
    /// Split mode (`evenly`, `by_shares`, `by_percentage`, `by_amount`)
    pub mode: String,
    /// Participant ids in split order
    pub participants: Vec<String>,
    /// Comma-separated values matching `participants`, omitted for `evenly`
    #[serde(default)]
    pub values: Option<String>,
    /// Trip the template belongs to, omitted for squad-wide
    #[serde(default)]
    pub trip_id: Option<String>,
    /// Whether the template is usable in every scope
    #[serde(default)]
    pub is_global: bool,
    /// Participant who owns the template
    pub owner: String,
}

impl TemplateConfig {
    /// Converts the TOML entry into a draft for [`template::save_template`].
    ///
    /// # Errors
    /// Returns [`Error::Config`] for an unknown mode or malformed values.
    pub fn to_draft(&self) -> Result<TemplateDraft> {
        let mode: SplitMode = self.mode.parse()?;
        let participants = parse_participants(&self.participants.join(","));
        Ok(TemplateDraft {
            name: self.name.clone(),
            owner: ParticipantId::from(self.owner.as_str()),
            trip_id: parse_scope(self.trip_id.as_deref()),
            is_global: self.is_global,
            spec: parse_split_spec(mode, participants, self.values.as_deref())?,
        })
    }
}

/// Loads template configuration from a TOML file
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`] if the TOML is
/// invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads template configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

/// Saves every configured template whose owner has no template of that name yet.
///
/// Returns the number of templates created.
pub async fn seed_templates(db: &DatabaseConnection, config: &Config) -> Result<usize> {
    info!(
        "Seeding split templates. Found {} configurations from TOML.",
        config.templates.len()
    );

    let mut created = 0;
    for entry in &config.templates {
        let owner = ParticipantId::from(entry.owner.as_str());
        let existing = template::find_owned_model(db, &owner, &entry.name).await?;
        if existing.is_some() {
            debug!(
                "Template '{}' for {} already exists. Skipping.",
                entry.name, entry.owner
            );
            continue;
        }

        template::save_template(db, entry.to_draft()?).await?;
        created += 1;
    }

    info!("Seeded {created} split templates");
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::split::SplitSpec,
        test_utils::setup_test_db,
    };

    const SAMPLE: &str = r#"
        [[templates]]
        name = "Household"
        mode = "by_percentage"
        participants = ["111", "222"]
        values = "60, 40"
        owner = "111"
        is_global = true

        [[templates]]
        name = "Lisbon dinners"
        mode = "evenly"
        participants = ["111", "222", "333"]
        trip_id = "lisbon"
        owner = "222"
    "#;

    #[test]
    fn test_parse_template_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.templates.len(), 2);
        assert_eq!(config.templates[0].name, "Household");
        assert!(config.templates[0].is_global);
        assert_eq!(config.templates[1].trip_id.as_deref(), Some("lisbon"));
        assert!(!config.templates[1].is_global);
        assert!(config.templates[1].values.is_none());

        let draft = config.templates[0].to_draft().unwrap();
        assert_eq!(
            draft.spec,
            SplitSpec::ByPercentage(vec![
                (ParticipantId::from("111"), 6_000),
                (ParticipantId::from("222"), 4_000),
            ])
        );
    }

    #[test]
    fn test_empty_config_has_no_templates() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.templates.is_empty());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let config: Config = toml::from_str(
            r#"
            [[templates]]
            name = "Odd"
            mode = "randomly"
            participants = ["1"]
            owner = "1"
            "#,
        )
        .unwrap();
        assert!(matches!(config.templates[0].to_draft(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        assert!(matches!(
            load_config("does/not/exist/config.toml"),
            Err(Error::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_templates_skips_existing() -> Result<()> {
        let db = setup_test_db().await?;
        let config: Config = toml::from_str(SAMPLE).unwrap();

        assert_eq!(seed_templates(&db, &config).await?, 2);
        assert_eq!(seed_templates(&db, &config).await?, 0);

        let lisbon = template::list_templates_for_scope(&db, parse_scope(Some("lisbon")).as_ref()).await?;
        assert_eq!(lisbon.len(), 2);
        Ok(())
    }
}
