//! Discount Usage Ledger Models

use serde::{Deserialize, Serialize};

use super::campaign::DiscountType;

/// One granted discount — an immutable ledger fact.
///
/// Rows are created exactly once per successful allocation and never updated
/// or deleted; they are the sole basis for daily-usage counts and audit.
/// `value` is the figure the discount was computed against: cart value for
/// cart campaigns, delivery charge for delivery campaigns.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiscountUsage {
    pub id: i64,
    pub campaign_id: i64,
    pub customer_id: i64,
    pub discount_amount: f64,
    pub value: f64,
    pub used_at: i64,
}

/// Ledger row joined with campaign and customer context, for history views
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiscountUsageDetail {
    pub id: i64,
    pub campaign_id: i64,
    pub customer_id: i64,
    pub discount_amount: f64,
    pub value: f64,
    pub used_at: i64,
    pub campaign_name: String,
    pub discount_type: DiscountType,
    pub customer_name: String,
    pub customer_email: String,
}
