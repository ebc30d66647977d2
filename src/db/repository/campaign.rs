//! Campaign Repository
//!
//! Catalog CRUD plus the reservation commit primitive. The commit is the only
//! write path touching `used_budget`: a compare-and-swap conditional update
//! and the ledger insert inside one transaction.

use sqlx::SqlitePool;

use super::{RepoError, RepoResult};
use crate::db::models::{
    Campaign, CampaignCreate, CampaignPatch, CampaignStatus, DiscountType, DiscountUsage,
    TargetChange,
};
use crate::engine::status::derive_status;
use crate::utils::time::now_millis;

const CAMPAIGN_SELECT: &str = "SELECT id, name, description, discount_type, discount_percentage, discount_flat, start_date, end_date, total_budget, used_budget, max_usage_per_customer_per_day, min_cart_value, max_discount_amount, is_targeted, status, created_at, updated_at FROM campaign";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Campaign>> {
    let sql = format!("{CAMPAIGN_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Campaign>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// List campaigns with optional status / discount-type filters
pub async fn find_all(
    pool: &SqlitePool,
    status: Option<CampaignStatus>,
    discount_type: Option<DiscountType>,
) -> RepoResult<Vec<Campaign>> {
    let mut sql = String::from(CAMPAIGN_SELECT);
    let mut clauses: Vec<&str> = Vec::new();
    if status.is_some() {
        clauses.push("status = ?");
    }
    if discount_type.is_some() {
        clauses.push("discount_type = ?");
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut query = sqlx::query_as::<_, Campaign>(&sql);
    if let Some(s) = status {
        query = query.bind(s);
    }
    if let Some(t) = discount_type {
        query = query.bind(t);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Candidate campaigns for an allocation request.
///
/// The storage-level filter (stored status, window, budget) is an
/// optimization only; the eligibility filter re-validates every predicate
/// against derived state.
pub async fn find_candidates(
    pool: &SqlitePool,
    discount_type: DiscountType,
    now: i64,
) -> RepoResult<Vec<Campaign>> {
    let sql = format!(
        "{CAMPAIGN_SELECT} WHERE discount_type = ?1 AND status = ?2 AND start_date <= ?3 AND end_date > ?3 AND used_budget < total_budget ORDER BY id"
    );
    let rows = sqlx::query_as::<_, Campaign>(&sql)
        .bind(discount_type)
        .bind(CampaignStatus::Active)
        .bind(now)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Target customer ids of a campaign
pub async fn target_ids(pool: &SqlitePool, campaign_id: i64) -> RepoResult<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT customer_id FROM campaign_target WHERE campaign_id = ? ORDER BY customer_id",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Create a campaign, attaching target customers when targeted.
///
/// Target ids that do not match an existing customer are dropped silently.
pub async fn create(pool: &SqlitePool, data: CampaignCreate) -> RepoResult<Campaign> {
    data.validate()
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO campaign (name, description, discount_type, discount_percentage, discount_flat, start_date, end_date, total_budget, used_budget, max_usage_per_customer_per_day, min_cart_value, max_discount_amount, is_targeted, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.discount_type)
    .bind(data.discount_percentage)
    .bind(data.discount_flat)
    .bind(data.start_date)
    .bind(data.end_date)
    .bind(data.total_budget)
    .bind(data.max_usage_per_customer_per_day.unwrap_or(1))
    .bind(data.min_cart_value.unwrap_or(0.0))
    .bind(data.max_discount_amount)
    .bind(data.is_targeted)
    .bind(CampaignStatus::Active)
    .bind(now)
    .execute(&mut *tx)
    .await?;
    let campaign_id = result.last_insert_rowid();

    if data.is_targeted {
        if let Some(ids) = &data.target_customer_ids {
            insert_targets(&mut tx, campaign_id, ids).await?;
        }
    }

    tx.commit().await?;

    find_by_id(pool, campaign_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create campaign".to_string()))
}

/// Merge a patch into a campaign and persist row + target set together.
///
/// The lifecycle status is re-derived from the merged figures before the
/// write, so a budget raise can resurrect an exhausted campaign and a moved
/// `end_date` an expired one.
pub async fn apply_patch(pool: &SqlitePool, id: i64, patch: CampaignPatch) -> RepoResult<Campaign> {
    let mut campaign = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Campaign {id} not found")))?;

    campaign.apply_patch(&patch);
    campaign
        .validate()
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    campaign.status = derive_status(&campaign, now);

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE campaign SET name = ?1, description = ?2, discount_type = ?3, discount_percentage = ?4, discount_flat = ?5, start_date = ?6, end_date = ?7, total_budget = ?8, max_usage_per_customer_per_day = ?9, min_cart_value = ?10, max_discount_amount = ?11, is_targeted = ?12, status = ?13, updated_at = ?14 WHERE id = ?15",
    )
    .bind(&campaign.name)
    .bind(&campaign.description)
    .bind(campaign.discount_type)
    .bind(campaign.discount_percentage)
    .bind(campaign.discount_flat)
    .bind(campaign.start_date)
    .bind(campaign.end_date)
    .bind(campaign.total_budget)
    .bind(campaign.max_usage_per_customer_per_day)
    .bind(campaign.min_cart_value)
    .bind(campaign.max_discount_amount)
    .bind(campaign.is_targeted)
    .bind(campaign.status)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    match patch.target_change() {
        TargetChange::Keep => {}
        TargetChange::Clear => {
            sqlx::query("DELETE FROM campaign_target WHERE campaign_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        TargetChange::Replace(ids) => {
            sqlx::query("DELETE FROM campaign_target WHERE campaign_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_targets(&mut tx, id, &ids).await?;
        }
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Campaign {id} not found")))
}

/// Hard delete a campaign; targeting rows cascade, ledger rows stay.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM campaign WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn insert_targets(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    campaign_id: i64,
    customer_ids: &[i64],
) -> RepoResult<()> {
    for customer_id in customer_ids {
        // Guarded insert: unknown customer ids are dropped silently
        sqlx::query(
            "INSERT OR IGNORE INTO campaign_target (campaign_id, customer_id) SELECT ?1, id FROM customer WHERE id = ?2",
        )
        .bind(campaign_id)
        .bind(customer_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// ========== Reservation commit ==========

/// One budget reservation ready to commit
#[derive(Debug, Clone)]
pub struct ReservationCommit {
    pub campaign_id: i64,
    pub customer_id: i64,
    /// `used_budget` the reservation was computed against (the CAS guard)
    pub expected_used_budget: f64,
    /// `used_budget` after the reservation
    pub new_used_budget: f64,
    /// Lifecycle status derived from `new_used_budget`
    pub new_status: CampaignStatus,
    /// Discount amount granted
    pub amount: f64,
    /// Value the discount was computed against
    pub value: f64,
    pub now: i64,
}

/// Outcome of a reservation commit attempt
#[derive(Debug)]
pub enum CommitOutcome {
    /// Budget increment and ledger entry committed together
    Committed(DiscountUsage),
    /// A concurrent reservation changed `used_budget` first; nothing written
    Conflict,
}

/// Atomically consume campaign budget and append the ledger entry.
///
/// The conditional update only matches while `used_budget` still equals the
/// figure the caller computed against, so no two reservations can act on the
/// same pre-reservation value. Ledger insert and budget increment share the
/// transaction; neither is ever observable without the other.
pub async fn commit_reservation(
    pool: &SqlitePool,
    commit: ReservationCommit,
) -> RepoResult<CommitOutcome> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE campaign SET used_budget = ?1, status = ?2, updated_at = ?3 WHERE id = ?4 AND used_budget = ?5",
    )
    .bind(commit.new_used_budget)
    .bind(commit.new_status)
    .bind(commit.now)
    .bind(commit.campaign_id)
    .bind(commit.expected_used_budget)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(CommitOutcome::Conflict);
    }

    let inserted = sqlx::query(
        "INSERT INTO discount_usage (campaign_id, customer_id, discount_amount, value, used_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(commit.campaign_id)
    .bind(commit.customer_id)
    .bind(commit.amount)
    .bind(commit.value)
    .bind(commit.now)
    .execute(&mut *tx)
    .await?;
    let usage_id = inserted.last_insert_rowid();

    tx.commit().await?;

    Ok(CommitOutcome::Committed(DiscountUsage {
        id: usage_id,
        campaign_id: commit.campaign_id,
        customer_id: commit.customer_id,
        discount_amount: commit.amount,
        value: commit.value,
        used_at: commit.now,
    }))
}
