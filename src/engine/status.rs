//! Campaign lifecycle derivation
//!
//! The stored `status` column is a cache for observers; every eligibility
//! check and budget reservation derives the effective status from the row's
//! own figures instead of trusting it.

use crate::db::models::{Campaign, CampaignStatus};

/// Effective lifecycle status of a campaign at `now`.
///
/// Precedence: expiry beats exhaustion beats manual deactivation. A campaign
/// whose window or budget was extended by an admin patch derives back to
/// `Active` even while the stored column still says otherwise.
pub fn derive_status(campaign: &Campaign, now: i64) -> CampaignStatus {
    if now >= campaign.end_date {
        CampaignStatus::Expired
    } else if campaign.used_budget >= campaign.total_budget {
        CampaignStatus::BudgetExhausted
    } else if campaign.status == CampaignStatus::Inactive {
        CampaignStatus::Inactive
    } else {
        CampaignStatus::Active
    }
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
            max_usage_per_customer_per_day: 1,
            min_cart_value: 0.0,
            max_discount_amount: None,
            is_targeted: false,
            status: CampaignStatus::Active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_active_within_window() {
        let c = make_campaign();
        assert_eq!(derive_status(&c, 5_000), CampaignStatus::Active);
    }

    #[test]
    fn test_expired_at_end_date() {
        // Window is [start, end): the end instant itself is expired
        let c = make_campaign();
        assert_eq!(derive_status(&c, 10_000), CampaignStatus::Expired);
        assert_eq!(derive_status(&c, 9_999), CampaignStatus::Active);
    }

    #[test]
    fn test_exhausted_when_budget_consumed() {
        let mut c = make_campaign();
        c.used_budget = 100.0;
        assert_eq!(derive_status(&c, 5_000), CampaignStatus::BudgetExhausted);
    }

    #[test]
    fn test_expiry_beats_exhaustion() {
        let mut c = make_campaign();
        c.used_budget = 100.0;
        assert_eq!(derive_status(&c, 20_000), CampaignStatus::Expired);
    }

    #[test]
    fn test_inactive_respected_while_valid() {
        let mut c = make_campaign();
        c.status = CampaignStatus::Inactive;
        assert_eq!(derive_status(&c, 5_000), CampaignStatus::Inactive);
        // Expiry still wins over manual deactivation
        assert_eq!(derive_status(&c, 20_000), CampaignStatus::Expired);
    }

    #[test]
    fn test_stale_exhausted_flag_derives_back_to_active() {
        let mut c = make_campaign();
        c.status = CampaignStatus::BudgetExhausted;
        c.used_budget = 40.0; // budget was raised since the flag was written
        assert_eq!(derive_status(&c, 5_000), CampaignStatus::Active);
    }
}
