//! Expense business logic - the operations the calling layer performs on a squad ledger.
//!
//! Each mutation resolves the split first (pure), then writes the expense and its share
//! rows inside one database transaction so that concurrent writers to the same scope are
//! serialized by the store. Balances and settlements are always derived from the current
//! expense rows; nothing is cached.

use crate::{
    core::{
        ledger::{Balances, Expense, ExpenseFilter, ExpenseId, Ledger, TripId, validate_expense},
        money::Money,
        settlement::{SettlementTransfer, settle},
        split::{Allocation, ParticipantId, ResolvedSplit, SplitMode, SplitSpec, resolve},
        template,
    },
    entities::{Expense as ExpenseEntity, ExpenseShare, expense, expense_share},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info};

/// How the split of a new expense is given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitRequest {
    /// An explicit split specification
    Spec(SplitSpec),
    /// A stored template, optionally widened to more participants
    Template {
        /// Template to expand
        template_id: i64,
        /// Participants replacing the template's own set (must be a superset)
        participants: Option<Vec<ParticipantId>>,
    },
}

/// Input for [`create_expense`] and [`replace_expense`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewExpense {
    /// What the money was spent on
    pub description: String,
    /// Amount paid
    pub total: Money,
    /// Who paid
    pub payer: ParticipantId,
    /// Day of the expense
    pub date: NaiveDate,
    /// Trip scope, `None` for squad-wide
    pub trip_id: Option<TripId>,
    /// Split to apply
    pub split: SplitRequest,
}

/// Resolves the requested split, expanding templates eligible in the expense's scope.
async fn resolve_request<C>(db: &C, new: &NewExpense) -> Result<(ResolvedSplit, SplitSpec, Option<i64>)>
where
    C: ConnectionTrait,
{
    if !new.total.is_positive() {
        return Err(Error::InvalidAmount {
            amount: new.total.to_string(),
        });
    }

    match &new.split {
        SplitRequest::Spec(spec) => Ok((resolve(new.total, spec)?, spec.clone(), None)),
        SplitRequest::Template {
            template_id,
            participants,
        } => {
            let template = template::get_template(db, *template_id, new.trip_id.as_ref()).await?;
            let spec = template.expand(participants.as_deref())?;
            Ok((resolve(new.total, &spec)?, spec, Some(template.id)))
        }
    }
}

fn share_rows(expense_id: ExpenseId, spec: &SplitSpec, split: &ResolvedSplit) -> Vec<expense_share::ActiveModel> {
    spec.to_raw()
        .into_iter()
        .zip(split.allocations())
        .zip(0..)
        .map(|(((_, raw_value), allocation), position)| expense_share::ActiveModel {
            expense_id: Set(expense_id),
            participant_id: Set(allocation.participant.as_str().to_string()),
            position: Set(position),
            raw_value: Set(raw_value),
            amount_cents: Set(allocation.amount.cents()),
            ..Default::default()
        })
        .collect()
}

/// Records a new expense.
///
/// # Errors
/// - [`Error::InvalidAmount`] if the total is not positive
/// - [`Error::InvalidSplit`] if the split cannot be resolved
/// - [`Error::TemplateNotFound`] if the referenced template is missing or out of scope
/// - [`Error::ParticipantMismatch`] if a template override drops template members
pub async fn create_expense(db: &DatabaseConnection, new: NewExpense) -> Result<Expense> {
    let (split, spec, template_id) = resolve_request(db, &new).await?;
    let txn = db.begin().await?;

    let model = expense::ActiveModel {
        description: Set(new.description.trim().to_string()),
        total_cents: Set(new.total.cents()),
        payer_id: Set(new.payer.as_str().to_string()),
        date: Set(new.date),
        trip_id: Set(new.trip_id.as_ref().map(|t| t.as_str().to_string())),
        split_mode: Set(split.mode().as_str().to_string()),
        template_id: Set(template_id),
        updated_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    ExpenseShare::insert_many(share_rows(model.id, &spec, &split))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    info!(
        "Recorded expense {} of {} paid by {} ({} split)",
        model.id,
        new.total,
        new.payer,
        split.mode()
    );

    Ok(Expense {
        id: model.id,
        description: model.description,
        total: new.total,
        payer: new.payer,
        date: new.date,
        trip_id: new.trip_id,
        split,
        template_id,
    })
}

/// Replaces an existing expense in full and recomputes its split.
///
/// # Errors
/// Same as [`create_expense`], plus [`Error::ExpenseNotFound`] if `id` does not exist.
pub async fn replace_expense(db: &DatabaseConnection, id: ExpenseId, new: NewExpense) -> Result<Expense> {
    let (split, spec, template_id) = resolve_request(db, &new).await?;
    let txn = db.begin().await?;

    let existing = ExpenseEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(Error::ExpenseNotFound { id })?;

    let mut active: expense::ActiveModel = existing.into();
    active.description = Set(new.description.trim().to_string());
    active.total_cents = Set(new.total.cents());
    active.payer_id = Set(new.payer.as_str().to_string());
    active.date = Set(new.date);
    active.trip_id = Set(new.trip_id.as_ref().map(|t| t.as_str().to_string()));
    active.split_mode = Set(split.mode().as_str().to_string());
    active.template_id = Set(template_id);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;

    ExpenseShare::delete_many()
        .filter(expense_share::Column::ExpenseId.eq(id))
        .exec(&txn)
        .await?;
    ExpenseShare::insert_many(share_rows(id, &spec, &split))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    info!("Replaced expense {id}; split recomputed as {}", split.mode());

    Ok(Expense {
        id,
        description: model.description,
        total: new.total,
        payer: new.payer,
        date: new.date,
        trip_id: new.trip_id,
        split,
        template_id,
    })
}

/// Deletes an expense and its shares.
///
/// # Errors
/// Returns [`Error::ExpenseNotFound`] if `id` does not exist.
pub async fn delete_expense(db: &DatabaseConnection, id: ExpenseId) -> Result<()> {
    let txn = db.begin().await?;

    let existing = ExpenseEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(Error::ExpenseNotFound { id })?;

    ExpenseShare::delete_many()
        .filter(expense_share::Column::ExpenseId.eq(id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;
    txn.commit().await?;

    info!("Deleted expense {id}");
    Ok(())
}

/// Retrieves a single expense, or `None` if it does not exist.
pub async fn get_expense(db: &DatabaseConnection, id: ExpenseId) -> Result<Option<Expense>> {
    let Some(model) = ExpenseEntity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    Ok(hydrate(db, vec![model]).await?.pop())
}

/// Loads every expense of `scope` into an in-memory ledger.
///
/// Each row is re-validated on load, so a corrupted split surfaces as an error instead of
/// skewing balances.
pub async fn load_ledger(db: &DatabaseConnection, scope: Option<&TripId>) -> Result<Ledger> {
    let query = ExpenseEntity::find();
    let query = match scope {
        Some(trip) => query.filter(expense::Column::TripId.eq(trip.as_str())),
        None => query.filter(expense::Column::TripId.is_null()),
    };
    let models = query.order_by_asc(expense::Column::Id).all(db).await?;

    let mut ledger = Ledger::new();
    for expense in hydrate(db, models).await? {
        ledger.add_expense(expense)?;
    }
    debug!("Loaded {} expenses for scope {:?}", ledger.len(), scope);
    Ok(ledger)
}

/// Expenses of `scope` matching `filter`, newest first.
pub async fn list_expenses(
    db: &DatabaseConnection,
    scope: Option<&TripId>,
    filter: &ExpenseFilter,
) -> Result<Vec<Expense>> {
    let ledger = load_ledger(db, scope).await?;
    Ok(ledger.list_expenses(filter).cloned().collect())
}

/// Net balance per participant for `scope`.
pub async fn get_balances(db: &DatabaseConnection, scope: Option<&TripId>) -> Result<Balances> {
    load_ledger(db, scope).await?.net_balances()
}

/// Suggested transfers that settle every balance of `scope`.
///
/// # Errors
/// Returns [`Error::UnbalancedLedger`] if stored data violates the zero-sum invariant.
pub async fn get_settlement(
    db: &DatabaseConnection,
    scope: Option<&TripId>,
) -> Result<Vec<SettlementTransfer>> {
    let balances = get_balances(db, scope).await?;
    let transfers = settle(&balances)?;
    info!(
        "Computed settlement for scope {:?}: {} transfers",
        scope,
        transfers.len()
    );
    Ok(transfers)
}

/// Joins expense rows with their shares.
async fn hydrate(db: &DatabaseConnection, models: Vec<expense::Model>) -> Result<Vec<Expense>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
    let shares = ExpenseShare::find()
        .filter(expense_share::Column::ExpenseId.is_in(ids))
        .order_by_asc(expense_share::Column::Position)
        .all(db)
        .await?;

    let mut by_expense: HashMap<i64, Vec<Allocation>> = HashMap::new();
    for share in shares {
        by_expense.entry(share.expense_id).or_default().push(Allocation {
            participant: ParticipantId::new(share.participant_id),
            amount: Money::from_cents(share.amount_cents),
        });
    }

    models
        .into_iter()
        .map(|model| -> Result<Expense> {
            let mode: SplitMode = model.split_mode.parse()?;
            let allocations = by_expense.remove(&model.id).unwrap_or_default();
            let expense = Expense {
                id: model.id,
                description: model.description,
                total: Money::from_cents(model.total_cents),
                payer: ParticipantId::new(model.payer_id),
                date: model.date,
                trip_id: model.trip_id.map(TripId::new),
                split: ResolvedSplit::from_allocations(mode, allocations),
                template_id: model.template_id,
            };
            validate_expense(&expense)?;
            Ok(expense)
        })
        .collect()
}
