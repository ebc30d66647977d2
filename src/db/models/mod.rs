//! Database Models

pub mod campaign;
pub mod customer;
pub mod usage;

pub use campaign::{
    Campaign, CampaignCreate, CampaignPatch, CampaignStatus, DiscountType, TargetChange,
};
pub use customer::{Customer, CustomerCreate};
pub use usage::{DiscountUsage, DiscountUsageDetail};
