//! Budget Tracker
//!
//! The reserve-if-available operation over a campaign's shared budget. Each
//! attempt is a single conditional commit against the `used_budget` figure of
//! the snapshot the caller evaluated; the allocator owns the retry loop and
//! re-runs eligibility between attempts.

use rust_decimal::prelude::*;
use sqlx::SqlitePool;

use super::status::derive_status;
use crate::db::models::{Campaign, DiscountUsage};
use crate::db::repository::campaign::{CommitOutcome, ReservationCommit, commit_reservation};
use crate::db::repository::RepoResult;

/// Outcome of a reservation attempt
#[derive(Debug)]
pub enum ReserveOutcome {
    /// Budget consumed and ledger entry written, as one transaction
    Reserved(DiscountUsage),
    /// The snapshot's remaining budget cannot cover any amount
    Exhausted,
    /// A concurrent reservation moved `used_budget` first; retry with a
    /// fresh snapshot
    Conflict,
}

/// Atomic budget reservation against the campaign catalog
#[derive(Clone)]
pub struct BudgetTracker {
    pool: SqlitePool,
}

impl BudgetTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reserve `amount` (clamped to the snapshot's remaining budget) and
    /// append the ledger entry.
    ///
    /// `campaign` must be freshly loaded: its `used_budget` is the
    /// compare-and-swap guard, so a stale snapshot simply reports
    /// [`ReserveOutcome::Conflict`] without writing anything. The persisted
    /// status is re-derived from the post-reservation figure, flipping to
    /// `BudgetExhausted` on the write path when the reservation drains the
    /// budget.
    pub async fn try_reserve(
        &self,
        campaign: &Campaign,
        customer_id: i64,
        amount: f64,
        value: f64,
        now: i64,
    ) -> RepoResult<ReserveOutcome> {
        let remaining = Decimal::from_f64(campaign.total_budget).unwrap_or_default()
            - Decimal::from_f64(campaign.used_budget).unwrap_or_default();
        let requested = Decimal::from_f64(amount).unwrap_or_default();
        let reserve = requested.min(remaining);
        if reserve <= Decimal::ZERO {
            return Ok(ReserveOutcome::Exhausted);
        }

        let reserve_f64 = reserve.to_f64().unwrap_or_default();
        let new_used = (Decimal::from_f64(campaign.used_budget).unwrap_or_default() + reserve)
            .to_f64()
            .unwrap_or_default();

        let mut committed = campaign.clone();
        committed.used_budget = new_used;
        let new_status = derive_status(&committed, now);

        let outcome = commit_reservation(
            &self.pool,
            ReservationCommit {
                campaign_id: campaign.id,
                customer_id,
                expected_used_budget: campaign.used_budget,
                new_used_budget: new_used,
                new_status,
                amount: reserve_f64,
                value,
                now,
            },
        )
        .await?;

        Ok(match outcome {
            CommitOutcome::Committed(usage) => ReserveOutcome::Reserved(usage),
            CommitOutcome::Conflict => ReserveOutcome::Conflict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CampaignCreate, CampaignStatus, DiscountType};
    use crate::db::repository::campaign;
    use crate::db::test_support::test_pool;

    async fn seed_campaign(pool: &SqlitePool, total_budget: f64) -> Campaign {
        campaign::create(
            pool,
            CampaignCreate {
                name: "budget-test".to_string(),
                description: None,
                discount_type: DiscountType::Cart,
                discount_percentage: None,
                discount_flat: Some(100.0),
                start_date: 0,
                end_date: i64::MAX,
                total_budget,
                max_usage_per_customer_per_day: Some(10),
                min_cart_value: None,
                max_discount_amount: None,
                is_targeted: false,
                target_customer_ids: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_reserve_within_budget() {
        let pool = test_pool().await;
        let c = seed_campaign(&pool, 150.0).await;
        let tracker = BudgetTracker::new(pool.clone());

        let outcome = tracker.try_reserve(&c, 1, 100.0, 500.0, 1_000).await.unwrap();
        let usage = match outcome {
            ReserveOutcome::Reserved(u) => u,
            other => panic!("expected reservation, got {other:?}"),
        };
        assert_eq!(usage.discount_amount, 100.0);

        let fresh = campaign::find_by_id(&pool, c.id).await.unwrap().unwrap();
        assert_eq!(fresh.used_budget, 100.0);
        assert_eq!(fresh.status, CampaignStatus::Active);
    }

    #[tokio::test]
    async fn test_reserve_clamps_to_remaining_and_flips_status() {
        let pool = test_pool().await;
        let c = seed_campaign(&pool, 150.0).await;
        let tracker = BudgetTracker::new(pool.clone());

        tracker.try_reserve(&c, 1, 100.0, 500.0, 1_000).await.unwrap();

        // Second reservation sees 50 remaining and is clamped
        let fresh = campaign::find_by_id(&pool, c.id).await.unwrap().unwrap();
        let outcome = tracker
            .try_reserve(&fresh, 1, 100.0, 500.0, 2_000)
            .await
            .unwrap();
        let usage = match outcome {
            ReserveOutcome::Reserved(u) => u,
            other => panic!("expected reservation, got {other:?}"),
        };
        assert_eq!(usage.discount_amount, 50.0);

        let drained = campaign::find_by_id(&pool, c.id).await.unwrap().unwrap();
        assert_eq!(drained.used_budget, 150.0);
        assert_eq!(drained.status, CampaignStatus::BudgetExhausted);
    }

    #[tokio::test]
    async fn test_reserve_on_drained_snapshot_is_exhausted() {
        let pool = test_pool().await;
        let c = seed_campaign(&pool, 150.0).await;
        let tracker = BudgetTracker::new(pool.clone());

        tracker.try_reserve(&c, 1, 150.0, 500.0, 1_000).await.unwrap();
        let drained = campaign::find_by_id(&pool, c.id).await.unwrap().unwrap();

        let outcome = tracker
            .try_reserve(&drained, 1, 100.0, 500.0, 2_000)
            .await
            .unwrap();
        assert!(matches!(outcome, ReserveOutcome::Exhausted));
    }

    #[tokio::test]
    async fn test_stale_snapshot_conflicts_without_writing() {
        let pool = test_pool().await;
        let c = seed_campaign(&pool, 150.0).await;
        let tracker = BudgetTracker::new(pool.clone());

        // Commit through a fresh snapshot first
        tracker.try_reserve(&c, 1, 100.0, 500.0, 1_000).await.unwrap();

        // `c` still carries used_budget = 0 and must lose the race
        let outcome = tracker.try_reserve(&c, 2, 50.0, 500.0, 2_000).await.unwrap();
        assert!(matches!(outcome, ReserveOutcome::Conflict));

        let fresh = campaign::find_by_id(&pool, c.id).await.unwrap().unwrap();
        assert_eq!(fresh.used_budget, 100.0);
    }
}
