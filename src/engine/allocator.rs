//! Allocation Orchestrator
//!
//! Composes the eligibility filter, discount calculator, and budget tracker
//! into the two boundary operations: a read-only preview of available
//! discounts, and the single state-mutating apply. Apply runs a bounded
//! optimistic retry loop: each attempt re-loads the campaign, re-runs full
//! eligibility (including the daily-usage count) and recomputes the capped
//! amount before the conditional commit, so a racer that consumed budget or
//! daily allowance mid-flight can never make a stale amount stick.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::budget::{BudgetTracker, ReserveOutcome};
use super::calculator::{compute_discount, round_currency};
use super::eligibility::{IneligibleReason, check_eligibility};
use crate::core::EngineConfig;
use crate::db::models::{Campaign, DiscountType, DiscountUsage};
use crate::db::repository::{RepoError, campaign, customer, usage};
use crate::utils::time::day_bounds_millis;
use chrono_tz::Tz;

/// Terminal failure of an allocation request
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Customer {0} not found")]
    CustomerNotFound(i64),

    #[error("Campaign {0} not found")]
    CampaignNotFound(i64),

    #[error("Customer is not eligible: {0}")]
    Ineligible(IneligibleReason),

    #[error("No discount available for this transaction")]
    ZeroDiscount,

    #[error("Budget reservation lost to concurrent requests; retry later")]
    BudgetRaceLost,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// One discount option a customer can use right now
#[derive(Debug, Clone, Serialize)]
pub struct AvailableDiscount {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub discount_type: DiscountType,
    pub discount_amount: f64,
    pub original_value: f64,
    pub final_value: f64,
    pub message: String,
}

/// Preview of every usable discount, cart and delivery separated
#[derive(Debug, Clone, Default, Serialize)]
pub struct AvailableDiscounts {
    pub cart_discounts: Vec<AvailableDiscount>,
    pub delivery_discounts: Vec<AvailableDiscount>,
    pub best_cart_discount: Option<AvailableDiscount>,
    pub best_delivery_discount: Option<AvailableDiscount>,
}

/// The eligibility-and-allocation engine
#[derive(Clone)]
pub struct DiscountAllocator {
    pool: SqlitePool,
    tracker: BudgetTracker,
    tz: Tz,
    max_reserve_retries: u32,
}

impl DiscountAllocator {
    pub fn new(pool: SqlitePool, config: &EngineConfig) -> Self {
        Self {
            tracker: BudgetTracker::new(pool.clone()),
            pool,
            tz: config.timezone,
            max_reserve_retries: config.max_reserve_retries,
        }
    }

    /// All discounts a customer can use right now, with the best cart and
    /// delivery option highlighted.
    ///
    /// Read-only: never reserves budget or writes the ledger. Eligible
    /// campaigns whose computed amount collapses to zero are dropped from the
    /// preview. Best selection is the maximum amount; ties break toward the
    /// lowest campaign id so repeated previews are deterministic.
    pub async fn preview_available(
        &self,
        customer_id: i64,
        cart_value: f64,
        delivery_charge: f64,
        now: i64,
    ) -> Result<AvailableDiscounts, AllocationError> {
        customer::find_by_id(&self.pool, customer_id)
            .await?
            .ok_or(AllocationError::CustomerNotFound(customer_id))?;

        let cart_discounts = self
            .collect_options(customer_id, DiscountType::Cart, cart_value, now)
            .await?;
        let delivery_discounts = self
            .collect_options(customer_id, DiscountType::Delivery, delivery_charge, now)
            .await?;

        let best_cart_discount = best_of(&cart_discounts).cloned();
        let best_delivery_discount = best_of(&delivery_discounts).cloned();

        Ok(AvailableDiscounts {
            cart_discounts,
            delivery_discounts,
            best_cart_discount,
            best_delivery_discount,
        })
    }

    /// Apply a campaign's discount to a transaction: the only state-mutating
    /// operation.
    ///
    /// Validates eligibility, computes the capped amount, atomically consumes
    /// budget and appends the ledger entry. Losing the conditional commit to
    /// a concurrent reservation retries with refreshed state a bounded number
    /// of times before surfacing [`AllocationError::BudgetRaceLost`]. Every
    /// failure before the commit is side-effect-free.
    pub async fn apply(
        &self,
        campaign_id: i64,
        customer_id: i64,
        cart_value: f64,
        delivery_charge: f64,
        now: i64,
    ) -> Result<DiscountUsage, AllocationError> {
        customer::find_by_id(&self.pool, customer_id)
            .await?
            .ok_or(AllocationError::CustomerNotFound(customer_id))?;

        for attempt in 0..=self.max_reserve_retries {
            let campaign = campaign::find_by_id(&self.pool, campaign_id)
                .await?
                .ok_or(AllocationError::CampaignNotFound(campaign_id))?;

            let value = match campaign.discount_type {
                DiscountType::Cart => cart_value,
                DiscountType::Delivery => delivery_charge,
            };

            if let Some(reason) = self.check_one(&campaign, customer_id, value, now).await? {
                return Err(AllocationError::Ineligible(reason));
            }

            let amount = compute_discount(&campaign, value);
            if amount <= 0.0 {
                return Err(AllocationError::ZeroDiscount);
            }

            match self
                .tracker
                .try_reserve(&campaign, customer_id, amount, value, now)
                .await?
            {
                ReserveOutcome::Reserved(usage_row) => {
                    info!(
                        campaign_id,
                        customer_id,
                        amount = usage_row.discount_amount,
                        "Discount applied"
                    );
                    return Ok(usage_row);
                }
                ReserveOutcome::Exhausted => {
                    return Err(AllocationError::Ineligible(
                        IneligibleReason::BudgetExhausted,
                    ));
                }
                ReserveOutcome::Conflict => {
                    debug!(
                        campaign_id,
                        customer_id, attempt, "Reservation lost a budget race, retrying"
                    );
                }
            }
        }

        warn!(
            campaign_id,
            customer_id,
            retries = self.max_reserve_retries,
            "Budget reservation retries exhausted"
        );
        Err(AllocationError::BudgetRaceLost)
    }

    /// Eligibility of one campaign for a request, gathering the target set
    /// and daily usage count the pure filter needs. `Ok(Some(reason))` is a
    /// rejection; repository failures propagate instead of masquerading as
    /// ineligibility.
    async fn check_one(
        &self,
        campaign: &Campaign,
        customer_id: i64,
        value: f64,
        now: i64,
    ) -> Result<Option<IneligibleReason>, AllocationError> {
        let target_ids = if campaign.is_targeted {
            campaign::target_ids(&self.pool, campaign.id).await?
        } else {
            Vec::new()
        };

        let (day_start, day_end) = day_bounds_millis(now, self.tz);
        let daily_usage =
            usage::count_for_day(&self.pool, campaign.id, customer_id, day_start, day_end).await?;

        Ok(check_eligibility(campaign, customer_id, value, &target_ids, daily_usage, now).err())
    }

    async fn collect_options(
        &self,
        customer_id: i64,
        discount_type: DiscountType,
        value: f64,
        now: i64,
    ) -> Result<Vec<AvailableDiscount>, AllocationError> {
        let mut options = Vec::new();
        if value <= 0.0 {
            return Ok(options);
        }

        for candidate in campaign::find_candidates(&self.pool, discount_type, now).await? {
            if self
                .check_one(&candidate, customer_id, value, now)
                .await?
                .is_some()
            {
                continue;
            }
            let amount = compute_discount(&candidate, value);
            if amount <= 0.0 {
                continue;
            }
            options.push(AvailableDiscount {
                campaign_id: candidate.id,
                campaign_name: candidate.name.clone(),
                discount_type,
                discount_amount: amount,
                original_value: value,
                final_value: round_currency(value - amount),
                message: match discount_type {
                    DiscountType::Cart => format!("Save {amount:.2} on your cart!"),
                    DiscountType::Delivery => format!("Save {amount:.2} on delivery!"),
                },
            });
        }
        Ok(options)
    }
}

/// Highest amount wins; ties break toward the lowest campaign id
fn best_of(options: &[AvailableDiscount]) -> Option<&AvailableDiscount> {
    options.iter().reduce(|best, candidate| {
        if candidate.discount_amount > best.discount_amount
            || (candidate.discount_amount == best.discount_amount
                && candidate.campaign_id < best.campaign_id)
        {
            candidate
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(campaign_id: i64, amount: f64) -> AvailableDiscount {
        AvailableDiscount {
            campaign_id,
            campaign_name: format!("c{campaign_id}"),
            discount_type: DiscountType::Cart,
            discount_amount: amount,
            original_value: 500.0,
            final_value: 500.0 - amount,
            message: String::new(),
        }
    }

    #[test]
    fn test_best_of_picks_highest_amount() {
        let options = vec![option(1, 10.0), option(2, 30.0), option(3, 20.0)];
        assert_eq!(best_of(&options).unwrap().campaign_id, 2);
    }

    #[test]
    fn test_best_of_breaks_ties_by_lowest_id() {
        let options = vec![option(5, 30.0), option(2, 30.0), option(9, 30.0)];
        assert_eq!(best_of(&options).unwrap().campaign_id, 2);
    }

    #[test]
    fn test_best_of_empty_is_none() {
        assert!(best_of(&[]).is_none());
    }
}
