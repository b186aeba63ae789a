//! Default split templates - named, reusable split configurations.
//!
//! A template stores a mode and raw participant values. Expanding it against a new expense
//! produces a [`SplitSpec`] that the split evaluator resolves. Resolved expenses copy the
//! amounts, so editing or deleting a template never changes past expenses.
//!
//! Scope rule, enforced on every read: a global template is eligible everywhere; any other
//! template only in the scope equal to its own trip (`None` matches squad-wide).

use crate::{
    core::{
        ledger::TripId,
        money::Money,
        split::{ParticipantId, ResolvedSplit, SplitMode, SplitSpec, resolve},
    },
    entities::{SplitTemplate as SplitTemplateEntity, TemplateShare, split_template, template_share},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// A stored split template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTemplate {
    pub id: i64,
    pub name: String,
    pub owner: ParticipantId,
    pub trip_id: Option<TripId>,
    pub is_global: bool,
    /// Mode and participant values in template order
    pub spec: SplitSpec,
}

/// Input for [`save_template`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateDraft {
    pub name: String,
    pub owner: ParticipantId,
    pub trip_id: Option<TripId>,
    pub is_global: bool,
    pub spec: SplitSpec,
}

impl SplitTemplate {
    /// Whether this template may be used for expenses in `scope`.
    #[must_use]
    pub fn is_eligible(&self, scope: Option<&TripId>) -> bool {
        is_eligible(self.is_global, self.trip_id.as_ref(), scope)
    }

    /// Copies the template's mode and values into a new split spec.
    ///
    /// With `participants_override`, the split covers exactly those participants: every
    /// template member keeps their value and the extra members are appended in override
    /// order with the mode's neutral value (one share, or zero percent / zero amount).
    ///
    /// # Errors
    /// Returns [`Error::ParticipantMismatch`] if the override leaves out a template member.
    pub fn expand(&self, participants_override: Option<&[ParticipantId]>) -> Result<SplitSpec> {
        let Some(override_set) = participants_override else {
            return Ok(self.spec.clone());
        };

        let requested: HashSet<&ParticipantId> = override_set.iter().collect();
        let missing: Vec<ParticipantId> = self
            .spec
            .participants()
            .into_iter()
            .filter(|p| !requested.contains(p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::ParticipantMismatch { missing });
        }

        let mut entries = self.spec.to_raw();
        let neutral = match self.spec.mode() {
            SplitMode::Evenly | SplitMode::ByShares => 1,
            SplitMode::ByPercentage | SplitMode::ByAmount => 0,
        };
        let mut present: HashSet<ParticipantId> = entries.iter().map(|(p, _)| p.clone()).collect();
        for participant in override_set {
            if present.insert(participant.clone()) {
                entries.push((participant.clone(), neutral));
            }
        }

        Ok(SplitSpec::from_raw(self.spec.mode(), entries))
    }

    /// Expands the template and resolves it against `total`.
    ///
    /// # Errors
    /// See [`SplitTemplate::expand`] and [`resolve`].
    pub fn apply(
        &self,
        total: Money,
        participants_override: Option<&[ParticipantId]>,
    ) -> Result<ResolvedSplit> {
        resolve(total, &self.expand(participants_override)?)
    }
}

fn is_eligible(is_global: bool, template_trip: Option<&TripId>, scope: Option<&TripId>) -> bool {
    is_global || template_trip == scope
}

/// Rejects specs that could never resolve.
///
/// Fixed amounts are checked against their own sum since no expense total is known yet.
fn validate_template_spec(spec: &SplitSpec) -> Result<()> {
    let probe_total = match spec {
        SplitSpec::ByAmount(entries) => entries.iter().map(|(_, a)| *a).sum(),
        _ => Money::ZERO,
    };
    resolve(probe_total, spec).map(|_| ())
}

/// Template names are unique per owner, compared ASCII case-insensitively.
fn same_name(stored: &str, requested: &str) -> bool {
    stored.eq_ignore_ascii_case(requested.trim())
}

/// The row `owner` saved under `name`, in any scope.
pub(crate) async fn find_owned_model<C>(
    db: &C,
    owner: &ParticipantId,
    name: &str,
) -> Result<Option<split_template::Model>>
where
    C: ConnectionTrait,
{
    Ok(SplitTemplateEntity::find()
        .filter(split_template::Column::OwnerId.eq(owner.as_str()))
        .order_by_asc(split_template::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .find(|m| same_name(&m.name, name)))
}

/// Creates a template, or overwrites the owner's template of the same name.
///
/// # Errors
/// - [`Error::Config`] if the name is empty
/// - [`Error::InvalidSplit`] if the spec can never resolve
/// - [`Error::Database`] on storage failure
pub async fn save_template(db: &DatabaseConnection, draft: TemplateDraft) -> Result<SplitTemplate> {
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Template name cannot be empty".to_string(),
        });
    }
    validate_template_spec(&draft.spec)?;

    let now = chrono::Utc::now().naive_utc();
    let txn = db.begin().await?;

    let existing = find_owned_model(&txn, &draft.owner, &name).await?;

    let model = if let Some(existing) = existing {
        TemplateShare::delete_many()
            .filter(template_share::Column::TemplateId.eq(existing.id))
            .exec(&txn)
            .await?;
        let mut active: split_template::ActiveModel = existing.into();
        active.name = Set(name.clone());
        active.trip_id = Set(draft.trip_id.as_ref().map(|t| t.as_str().to_string()));
        active.split_mode = Set(draft.spec.mode().as_str().to_string());
        active.is_global = Set(draft.is_global);
        active.updated_at = Set(now);
        active.update(&txn).await?
    } else {
        split_template::ActiveModel {
            name: Set(name.clone()),
            owner_id: Set(draft.owner.as_str().to_string()),
            trip_id: Set(draft.trip_id.as_ref().map(|t| t.as_str().to_string())),
            split_mode: Set(draft.spec.mode().as_str().to_string()),
            is_global: Set(draft.is_global),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?
    };

    let shares: Vec<template_share::ActiveModel> = draft
        .spec
        .to_raw()
        .into_iter()
        .zip(0..)
        .map(|((participant, raw_value), position)| template_share::ActiveModel {
            template_id: Set(model.id),
            participant_id: Set(participant.as_str().to_string()),
            position: Set(position),
            raw_value: Set(raw_value),
            ..Default::default()
        })
        .collect();
    TemplateShare::insert_many(shares).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Saved split template '{}' (id {}) for {}",
        model.name, model.id, draft.owner
    );

    Ok(SplitTemplate {
        id: model.id,
        name: model.name,
        owner: draft.owner,
        trip_id: draft.trip_id,
        is_global: draft.is_global,
        spec: draft.spec,
    })
}

/// Deletes a template owned by `owner`.
///
/// Expenses already resolved from the template keep their amounts.
///
/// # Errors
/// Returns [`Error::TemplateNotFound`] if the template does not exist or belongs to
/// someone else.
pub async fn delete_template(
    db: &DatabaseConnection,
    template_id: i64,
    owner: &ParticipantId,
) -> Result<()> {
    let txn = db.begin().await?;

    let template = SplitTemplateEntity::find_by_id(template_id)
        .filter(split_template::Column::OwnerId.eq(owner.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::TemplateNotFound {
            id: template_id.to_string(),
        })?;

    TemplateShare::delete_many()
        .filter(template_share::Column::TemplateId.eq(template.id))
        .exec(&txn)
        .await?;
    template.delete(&txn).await?;

    txn.commit().await?;
    info!("Deleted split template {template_id}");
    Ok(())
}

/// Fetches a template that is eligible in `scope`.
///
/// # Errors
/// Returns [`Error::TemplateNotFound`] if the template is missing or not eligible.
pub async fn get_template<C>(db: &C, template_id: i64, scope: Option<&TripId>) -> Result<SplitTemplate>
where
    C: ConnectionTrait,
{
    let not_found = || Error::TemplateNotFound {
        id: template_id.to_string(),
    };

    let model = SplitTemplateEntity::find_by_id(template_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;

    hydrate(db, vec![model])
        .await?
        .into_iter()
        .find(|t| t.is_eligible(scope))
        .ok_or_else(not_found)
}

/// Finds an eligible template by name.
///
/// The requester's own template wins; otherwise the oldest eligible template of that name.
pub async fn find_template_by_name(
    db: &DatabaseConnection,
    name: &str,
    scope: Option<&TripId>,
    requester: &ParticipantId,
) -> Result<Option<SplitTemplate>> {
    let mut matching: Vec<SplitTemplate> = list_templates_for_scope(db, scope)
        .await?
        .into_iter()
        .filter(|t| same_name(&t.name, name))
        .collect();

    let chosen = matching
        .iter()
        .position(|t| &t.owner == requester)
        .unwrap_or(0);
    Ok((chosen < matching.len()).then(|| matching.swap_remove(chosen)))
}

/// The template `owner` saved under `name`, regardless of scope.
pub async fn find_owned_template(
    db: &DatabaseConnection,
    owner: &ParticipantId,
    name: &str,
) -> Result<Option<SplitTemplate>> {
    let Some(model) = find_owned_model(db, owner, name).await? else {
        return Ok(None);
    };
    Ok(hydrate(db, vec![model]).await?.pop())
}

/// All templates eligible in `scope`, ordered by id.
pub async fn list_templates_for_scope(
    db: &DatabaseConnection,
    scope: Option<&TripId>,
) -> Result<Vec<SplitTemplate>> {
    let scope_condition = match scope {
        Some(trip) => split_template::Column::TripId.eq(trip.as_str()),
        None => split_template::Column::TripId.is_null(),
    };

    let models = SplitTemplateEntity::find()
        .filter(
            Condition::any()
                .add(split_template::Column::IsGlobal.eq(true))
                .add(scope_condition),
        )
        .order_by_asc(split_template::Column::Id)
        .all(db)
        .await?;

    Ok(hydrate(db, models)
        .await?
        .into_iter()
        .filter(|t| t.is_eligible(scope))
        .collect())
}

/// Loads share rows for `models` and assembles domain templates.
async fn hydrate<C>(db: &C, models: Vec<split_template::Model>) -> Result<Vec<SplitTemplate>>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
    let shares = TemplateShare::find()
        .filter(template_share::Column::TemplateId.is_in(ids))
        .order_by_asc(template_share::Column::Position)
        .all(db)
        .await?;

    let mut by_template: HashMap<i64, Vec<(ParticipantId, i64)>> = HashMap::new();
    for share in shares {
        by_template
            .entry(share.template_id)
            .or_default()
            .push((ParticipantId::new(share.participant_id), share.raw_value));
    }

    models
        .into_iter()
        .map(|model| -> Result<SplitTemplate> {
            let mode: SplitMode = model.split_mode.parse()?;
            let entries = by_template.remove(&model.id).unwrap_or_default();
            Ok(SplitTemplate {
                id: model.id,
                name: model.name,
                owner: ParticipantId::new(model.owner_id),
                trip_id: model.trip_id.map(TripId::new),
                is_global: model.is_global,
                spec: SplitSpec::from_raw(mode, entries),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::SplitError;
    use crate::test_utils::*;
    use rstest::rstest;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().copied().map(ParticipantId::from).collect()
    }

    fn template(spec: SplitSpec, trip: Option<&str>, is_global: bool) -> SplitTemplate {
        SplitTemplate {
            id: 1,
            name: "Groceries".to_string(),
            owner: ParticipantId::from("alice"),
            trip_id: trip.map(TripId::from),
            is_global,
            spec,
        }
    }

    #[rstest]
    #[case::global_anywhere(Some("lisbon"), true, Some("oslo"), true)]
    #[case::global_squad_wide(Some("lisbon"), true, None, true)]
    #[case::same_trip(Some("lisbon"), false, Some("lisbon"), true)]
    #[case::other_trip(Some("lisbon"), false, Some("oslo"), false)]
    #[case::trip_template_squad_wide(Some("lisbon"), false, None, false)]
    #[case::squad_template_squad_wide(None, false, None, true)]
    #[case::squad_template_in_trip(None, false, Some("oslo"), false)]
    fn test_scope_eligibility(
        #[case] template_trip: Option<&str>,
        #[case] is_global: bool,
        #[case] scope: Option<&str>,
        #[case] expected: bool,
    ) {
        let t = template(SplitSpec::Evenly(ids(&["a"])), template_trip, is_global);
        let scope = scope.map(TripId::from);
        assert_eq!(t.is_eligible(scope.as_ref()), expected);
    }

    #[test]
    fn test_expand_without_override_copies_spec() {
        let spec = SplitSpec::ByShares(vec![(ParticipantId::from("a"), 2), (ParticipantId::from("b"), 1)]);
        let t = template(spec.clone(), None, false);
        assert_eq!(t.expand(None).unwrap(), spec);
    }

    #[test]
    fn test_expand_override_missing_member_fails() {
        let t = template(SplitSpec::Evenly(ids(&["a", "b", "c"])), None, false);
        let err = t.expand(Some(&ids(&["a", "c", "d"]))).unwrap_err();
        assert!(matches!(
            err,
            Error::ParticipantMismatch { missing } if missing == ids(&["b"])
        ));
    }

    #[test]
    fn test_expand_override_superset_appends_neutral_values() {
        let shares = template(
            SplitSpec::ByShares(vec![(ParticipantId::from("a"), 2), (ParticipantId::from("b"), 1)]),
            None,
            false,
        );
        assert_eq!(
            shares.expand(Some(&ids(&["c", "b", "a"]))).unwrap(),
            SplitSpec::ByShares(vec![
                (ParticipantId::from("a"), 2),
                (ParticipantId::from("b"), 1),
                (ParticipantId::from("c"), 1),
            ])
        );

        let even = template(SplitSpec::Evenly(ids(&["a"])), None, false);
        assert_eq!(
            even.expand(Some(&ids(&["a", "b"]))).unwrap(),
            SplitSpec::Evenly(ids(&["a", "b"]))
        );

        let percent = template(
            SplitSpec::ByPercentage(vec![(ParticipantId::from("a"), 10_000)]),
            None,
            false,
        );
        assert_eq!(
            percent.expand(Some(&ids(&["a", "b"]))).unwrap(),
            SplitSpec::ByPercentage(vec![
                (ParticipantId::from("a"), 10_000),
                (ParticipantId::from("b"), 0),
            ])
        );
    }

    #[test]
    fn test_apply_resolves_against_total() {
        let t = template(
            SplitSpec::ByPercentage(vec![
                (ParticipantId::from("a"), 6_000),
                (ParticipantId::from("b"), 4_000),
            ]),
            None,
            true,
        );
        let split = t.apply(Money::from_cents(10_000), None).unwrap();
        assert_eq!(split.amount_for(&ParticipantId::from("a")), Some(Money::from_cents(6_000)));
        assert_eq!(split.amount_for(&ParticipantId::from("b")), Some(Money::from_cents(4_000)));
    }

    #[tokio::test]
    async fn test_save_template_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let empty_name = TemplateDraft {
            name: "   ".to_string(),
            owner: ParticipantId::from("alice"),
            trip_id: None,
            is_global: false,
            spec: SplitSpec::Evenly(ids(&["a"])),
        };
        assert!(matches!(
            save_template(&db, empty_name).await,
            Err(Error::Config { .. })
        ));

        let bad_percentages = TemplateDraft {
            name: "Rent".to_string(),
            owner: ParticipantId::from("alice"),
            trip_id: None,
            is_global: false,
            spec: SplitSpec::ByPercentage(vec![(ParticipantId::from("a"), 9_000)]),
        };
        assert!(matches!(
            save_template(&db, bad_percentages).await,
            Err(Error::InvalidSplit(SplitError::PercentageTotal { basis_points: 9_000 }))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_list_templates_by_scope() -> Result<()> {
        let db = setup_test_db().await?;

        let global = create_test_template(&db, "Everyone", None, true).await?;
        let lisbon = create_test_template(&db, "Lisbon", Some("lisbon"), false).await?;
        let squad = create_test_template(&db, "Squad", None, false).await?;

        let names = |templates: Vec<SplitTemplate>| -> Vec<String> {
            templates.into_iter().map(|t| t.name).collect()
        };

        let lisbon_scope = TripId::from("lisbon");
        assert_eq!(
            names(list_templates_for_scope(&db, Some(&lisbon_scope)).await?),
            vec!["Everyone", "Lisbon"]
        );
        assert_eq!(
            names(list_templates_for_scope(&db, None).await?),
            vec!["Everyone", "Squad"]
        );

        assert_eq!(get_template(&db, lisbon.id, Some(&lisbon_scope)).await?.id, lisbon.id);
        assert!(matches!(
            get_template(&db, lisbon.id, None).await,
            Err(Error::TemplateNotFound { .. })
        ));
        assert_eq!(get_template(&db, global.id, None).await?.spec, global.spec);
        assert_eq!(get_template(&db, squad.id, None).await?.name, "Squad");

        Ok(())
    }

    #[tokio::test]
    async fn test_save_template_overwrites_same_name() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_template(&db, "Rent", None, false).await?;

        let updated = save_template(
            &db,
            TemplateDraft {
                name: "Rent".to_string(),
                owner: ParticipantId::from("alice"),
                trip_id: None,
                is_global: true,
                spec: SplitSpec::ByShares(vec![
                    (ParticipantId::from("alice"), 2),
                    (ParticipantId::from("bob"), 1),
                ]),
            },
        )
        .await?;

        assert_eq!(updated.id, first.id);
        let all = list_templates_for_scope(&db, None).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].spec, updated.spec);
        assert!(all[0].is_global);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_template_requires_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let t = create_test_template(&db, "Rent", None, false).await?;

        assert!(matches!(
            delete_template(&db, t.id, &ParticipantId::from("mallory")).await,
            Err(Error::TemplateNotFound { .. })
        ));
        delete_template(&db, t.id, &ParticipantId::from("alice")).await?;
        assert!(list_templates_for_scope(&db, None).await?.is_empty());
        assert!(matches!(
            delete_template(&db, t.id, &ParticipantId::from("alice")).await,
            Err(Error::TemplateNotFound { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_find_template_by_name_ignores_case() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_template(&db, "Road Trip", None, true).await?;

        let alice = ParticipantId::from("alice");
        assert!(find_template_by_name(&db, "road trip", None, &alice).await?.is_some());
        assert!(find_template_by_name(&db, "missing", None, &alice).await?.is_none());
        Ok(())
    }

    fn rent_draft(owner: &str, name: &str, shares: i64) -> TemplateDraft {
        TemplateDraft {
            name: name.to_string(),
            owner: ParticipantId::from(owner),
            trip_id: None,
            is_global: false,
            spec: SplitSpec::ByShares(vec![
                (ParticipantId::from("alice"), shares),
                (ParticipantId::from("bob"), 1),
            ]),
        }
    }

    #[tokio::test]
    async fn test_same_name_for_two_owners() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = ParticipantId::from("alice");
        let bob = ParticipantId::from("bob");
        let carol = ParticipantId::from("carol");
        let bobs = save_template(&db, rent_draft("bob", "Rent", 1)).await?;
        let alices = save_template(&db, rent_draft("alice", "Rent", 2)).await?;

        // each requester gets their own template, others get the oldest
        assert_eq!(find_template_by_name(&db, "rent", None, &alice).await?.unwrap().id, alices.id);
        assert_eq!(find_template_by_name(&db, "Rent", None, &bob).await?.unwrap().id, bobs.id);
        assert_eq!(find_template_by_name(&db, "Rent", None, &carol).await?.unwrap().id, bobs.id);

        let owned = find_owned_template(&db, &alice, "RENT").await?.unwrap();
        assert_eq!(owned.id, alices.id);
        delete_template(&db, owned.id, &alice).await?;

        assert!(find_owned_template(&db, &alice, "Rent").await?.is_none());
        assert_eq!(find_template_by_name(&db, "Rent", None, &alice).await?.unwrap().id, bobs.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_template_name_ignores_case() -> Result<()> {
        let db = setup_test_db().await?;
        let first = save_template(&db, rent_draft("alice", "Rent", 1)).await?;
        let second = save_template(&db, rent_draft("alice", "rent", 3)).await?;

        assert_eq!(second.id, first.id);
        let all = list_templates_for_scope(&db, None).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "rent");
        assert_eq!(all[0].spec, second.spec);
        Ok(())
    }
}
