//! Eligibility Filter
//!
//! A pure predicate pipeline over a campaign snapshot and request context.
//! Predicates run in a fixed order and short-circuit on the first failure;
//! the failing predicate is reported for diagnostics. No side effects; the
//! caller supplies the target set and the daily usage count from repository
//! reads.

use serde::Serialize;
use thiserror::Error;

use super::status::derive_status;
use crate::db::models::{Campaign, CampaignStatus};

/// Why a campaign was rejected for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IneligibleReason {
    #[error("campaign is {0}")]
    NotActive(CampaignStatus),

    #[error("campaign has not started")]
    NotStarted,

    #[error("campaign budget is exhausted")]
    BudgetExhausted,

    #[error("value is below the campaign minimum")]
    BelowMinimumValue,

    #[error("customer is not in the campaign target list")]
    NotTargeted,

    #[error("daily usage limit reached")]
    DailyLimitReached,
}

/// Evaluate every applicability predicate for a (campaign, customer, value,
/// time) tuple.
///
/// Order is fixed: derived status, validity window, remaining budget
/// (strictly positive: a drained campaign is ineligible even when it would
/// compute a zero discount), minimum value, targeting, daily cap. A targeted
/// campaign with an empty target set is usable by nobody.
pub fn check_eligibility(
    campaign: &Campaign,
    customer_id: i64,
    value: f64,
    target_ids: &[i64],
    daily_usage: i64,
    now: i64,
) -> Result<(), IneligibleReason> {
    let status = derive_status(campaign, now);
    if status != CampaignStatus::Active {
        return Err(IneligibleReason::NotActive(status));
    }

    // Derived status already covers `now < end_date`
    if now < campaign.start_date {
        return Err(IneligibleReason::NotStarted);
    }

    if campaign.used_budget >= campaign.total_budget {
        return Err(IneligibleReason::BudgetExhausted);
    }

    if value < campaign.min_cart_value {
        return Err(IneligibleReason::BelowMinimumValue);
    }

    if campaign.is_targeted && !target_ids.contains(&customer_id) {
        return Err(IneligibleReason::NotTargeted);
    }

    if daily_usage >= campaign.max_usage_per_customer_per_day {
        return Err(IneligibleReason::DailyLimitReached);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DiscountType;

    fn make_campaign() -> Campaign {
        Campaign {
            id: 1,
            name: "test".to_string(),
            description: None,
            discount_type: DiscountType::Cart,
            discount_percentage: Some(10.0),
            discount_flat: None,
            start_date: 1_000,
            end_date: 10_000,
            total_budget: 100.0,
            used_budget: 0.0,
            max_usage_per_customer_per_day: 2,
            min_cart_value: 100.0,
            max_discount_amount: None,
            is_targeted: false,
            status: CampaignStatus::Active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_eligible_baseline() {
        let c = make_campaign();
        assert_eq!(check_eligibility(&c, 1, 500.0, &[], 0, 5_000), Ok(()));
    }

    #[test]
    fn test_inactive_campaign_rejected() {
        let mut c = make_campaign();
        c.status = CampaignStatus::Inactive;
        assert_eq!(
            check_eligibility(&c, 1, 500.0, &[], 0, 5_000),
            Err(IneligibleReason::NotActive(CampaignStatus::Inactive))
        );
    }

    #[test]
    fn test_expired_campaign_rejected() {
        let c = make_campaign();
        assert_eq!(
            check_eligibility(&c, 1, 500.0, &[], 0, 10_000),
            Err(IneligibleReason::NotActive(CampaignStatus::Expired))
        );
    }

    #[test]
    fn test_not_started_rejected() {
        let c = make_campaign();
        assert_eq!(
            check_eligibility(&c, 1, 500.0, &[], 0, 500),
            Err(IneligibleReason::NotStarted)
        );
    }

    #[test]
    fn test_drained_budget_rejected_before_value_checks() {
        let mut c = make_campaign();
        c.used_budget = 100.0;
        // Derived status reports exhaustion first
        assert_eq!(
            check_eligibility(&c, 1, 500.0, &[], 0, 5_000),
            Err(IneligibleReason::NotActive(CampaignStatus::BudgetExhausted))
        );
    }

    #[test]
    fn test_below_minimum_value_rejected() {
        let c = make_campaign();
        assert_eq!(
            check_eligibility(&c, 1, 50.0, &[], 0, 5_000),
            Err(IneligibleReason::BelowMinimumValue)
        );
        // Boundary: exactly the minimum passes
        assert_eq!(check_eligibility(&c, 1, 100.0, &[], 0, 5_000), Ok(()));
    }

    #[test]
    fn test_targeted_campaign_requires_membership() {
        let mut c = make_campaign();
        c.is_targeted = true;
        assert_eq!(
            check_eligibility(&c, 1, 500.0, &[2, 3], 0, 5_000),
            Err(IneligibleReason::NotTargeted)
        );
        assert_eq!(check_eligibility(&c, 2, 500.0, &[2, 3], 0, 5_000), Ok(()));
    }

    #[test]
    fn test_targeted_campaign_with_empty_set_rejects_everyone() {
        let mut c = make_campaign();
        c.is_targeted = true;
        assert_eq!(
            check_eligibility(&c, 1, 500.0, &[], 0, 5_000),
            Err(IneligibleReason::NotTargeted)
        );
    }

    #[test]
    fn test_daily_limit_boundary() {
        let c = make_campaign();
        assert_eq!(check_eligibility(&c, 1, 500.0, &[], 1, 5_000), Ok(()));
        assert_eq!(
            check_eligibility(&c, 1, 500.0, &[], 2, 5_000),
            Err(IneligibleReason::DailyLimitReached)
        );
    }
}
