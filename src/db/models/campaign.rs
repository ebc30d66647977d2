//! Campaign Model

use serde::{Deserialize, Serialize};

use crate::utils::AppError;
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, validate_non_negative, validate_optional_text,
    validate_required_text,
};

/// Discount type enum — selects which request value the discount applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// Discount applies to the overall cart value
    Cart,
    /// Discount applies to the delivery charge only
    Delivery,
}

/// Campaign lifecycle status
///
/// `Expired` and `BudgetExhausted` are derived from `end_date` and the budget
/// figures; the stored column is refreshed on the write path and is never
/// authoritative for eligibility decisions (see
/// [`crate::engine::derive_status`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Active,
    /// Manually deactivated
    Inactive,
    Expired,
    BudgetExhausted,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CampaignStatus::Active => "ACTIVE",
            CampaignStatus::Inactive => "INACTIVE",
            CampaignStatus::Expired => "EXPIRED",
            CampaignStatus::BudgetExhausted => "BUDGET_EXHAUSTED",
        };
        f.write_str(s)
    }
}

/// Campaign entity
///
/// Validity window is `[start_date, end_date)` in Unix millis. Money fields
/// are stored as `f64`; arithmetic on them goes through `rust_decimal` in the
/// calculator.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Percentage discount in [0, 100]; takes precedence over `discount_flat`
    pub discount_percentage: Option<f64>,
    /// Flat discount amount
    pub discount_flat: Option<f64>,
    pub start_date: i64,
    pub end_date: i64,
    pub total_budget: f64,
    pub used_budget: f64,
    pub max_usage_per_customer_per_day: i64,
    pub min_cart_value: f64,
    /// Absolute per-grant cap
    pub max_discount_amount: Option<f64>,
    /// If true, only customers in the target set may use this campaign
    pub is_targeted: bool,
    pub status: CampaignStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Campaign {
    /// Budget still available for reservation
    pub fn remaining_budget(&self) -> f64 {
        self.total_budget - self.used_budget
    }
}

/// Create campaign payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignCreate {
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_percentage: Option<f64>,
    pub discount_flat: Option<f64>,
    pub start_date: i64,
    pub end_date: i64,
    pub total_budget: f64,
    pub max_usage_per_customer_per_day: Option<i64>,
    pub min_cart_value: Option<f64>,
    pub max_discount_amount: Option<f64>,
    #[serde(default)]
    pub is_targeted: bool,
    pub target_customer_ids: Option<Vec<i64>>,
}

impl CampaignCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_campaign_fields(
            &self.name,
            &self.description,
            self.discount_percentage,
            self.discount_flat,
            self.start_date,
            self.end_date,
            self.total_budget,
            self.max_usage_per_customer_per_day.unwrap_or(1),
            self.min_cart_value,
            self.max_discount_amount,
        )
    }
}

/// Update campaign payload
///
/// All fields are optional; only provided fields are merged into the row by
/// [`Campaign::apply_patch`]. Setting `is_targeted` to `false` empties the
/// target set in the same update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_flat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_usage_per_customer_per_day: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_cart_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_targeted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_customer_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
}

/// How a patch affects the campaign's target set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetChange {
    /// Leave the stored target set as is
    Keep,
    /// Remove every target (forced when `is_targeted` becomes false)
    Clear,
    /// Replace the target set
    Replace(Vec<i64>),
}

impl CampaignPatch {
    /// Target-set effect of this patch.
    ///
    /// Invariant: `is_targeted = Some(false)` always clears the set, even if
    /// the patch also carries `target_customer_ids`.
    pub fn target_change(&self) -> TargetChange {
        if self.is_targeted == Some(false) {
            return TargetChange::Clear;
        }
        match &self.target_customer_ids {
            Some(ids) => TargetChange::Replace(ids.clone()),
            None => TargetChange::Keep,
        }
    }
}

impl Campaign {
    /// Merge a patch into this campaign, field by field.
    ///
    /// Target-set changes are reported to the caller via
    /// [`CampaignPatch::target_change`]; they live in the junction table, not
    /// on the row.
    pub fn apply_patch(&mut self, patch: &CampaignPatch) {
        if let Some(v) = &patch.name {
            self.name = v.clone();
        }
        if let Some(v) = &patch.description {
            self.description = Some(v.clone());
        }
        if let Some(v) = patch.discount_type {
            self.discount_type = v;
        }
        if let Some(v) = patch.discount_percentage {
            self.discount_percentage = Some(v);
        }
        if let Some(v) = patch.discount_flat {
            self.discount_flat = Some(v);
        }
        if let Some(v) = patch.start_date {
            self.start_date = v;
        }
        if let Some(v) = patch.end_date {
            self.end_date = v;
        }
        if let Some(v) = patch.total_budget {
            self.total_budget = v;
        }
        if let Some(v) = patch.max_usage_per_customer_per_day {
            self.max_usage_per_customer_per_day = v;
        }
        if let Some(v) = patch.min_cart_value {
            self.min_cart_value = v;
        }
        if let Some(v) = patch.max_discount_amount {
            self.max_discount_amount = Some(v);
        }
        if let Some(v) = patch.is_targeted {
            self.is_targeted = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
    }

    /// Validate the row after a patch merge
    pub fn validate(&self) -> Result<(), AppError> {
        validate_campaign_fields(
            &self.name,
            &self.description,
            self.discount_percentage,
            self.discount_flat,
            self.start_date,
            self.end_date,
            self.total_budget,
            self.max_usage_per_customer_per_day,
            Some(self.min_cart_value),
            self.max_discount_amount,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_campaign_fields(
    name: &str,
    description: &Option<String>,
    discount_percentage: Option<f64>,
    discount_flat: Option<f64>,
    start_date: i64,
    end_date: i64,
    total_budget: f64,
    max_usage_per_customer_per_day: i64,
    min_cart_value: Option<f64>,
    max_discount_amount: Option<f64>,
) -> Result<(), AppError> {
    validate_required_text(name, "name", MAX_NAME_LEN)?;
    validate_optional_text(description, "description", MAX_DESCRIPTION_LEN)?;

    match (discount_percentage, discount_flat) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "Set either discount_percentage or discount_flat, not both".to_string(),
            ));
        }
        (None, None) => {
            return Err(AppError::Validation(
                "One of discount_percentage or discount_flat is required".to_string(),
            ));
        }
        _ => {}
    }
    if let Some(pct) = discount_percentage {
        if !(0.0..=100.0).contains(&pct) {
            return Err(AppError::Validation(
                "discount_percentage must be within [0, 100]".to_string(),
            ));
        }
    }
    validate_non_negative(discount_flat, "discount_flat")?;

    if end_date <= start_date {
        return Err(AppError::Validation(
            "end_date must be after start_date".to_string(),
        ));
    }
    if total_budget <= 0.0 {
        return Err(AppError::Validation(
            "total_budget must be positive".to_string(),
        ));
    }
    if max_usage_per_customer_per_day < 1 {
        return Err(AppError::Validation(
            "max_usage_per_customer_per_day must be at least 1".to_string(),
        ));
    }
    validate_non_negative(min_cart_value, "min_cart_value")?;
    validate_non_negative(max_discount_amount, "max_discount_amount")?;
    Ok(())
}
