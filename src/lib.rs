//! Promo Engine — discount campaign eligibility and budget allocation
//!
//! # Overview
//!
//! Grants discounts to customers against shared, finite campaign budgets,
//! subject to validity windows, per-customer daily caps, targeting lists, and
//! per-grant amount ceilings. Correctness under concurrency comes from an
//! optimistic compare-and-swap on each campaign's consumed budget: the budget
//! increment and the ledger entry commit in one SQLite transaction, so
//! concurrent requests can never overspend a budget or double-count a daily
//! allowance.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/          # configuration
//! ├── utils/         # error, logging, time, validation
//! ├── db/            # SQLite pool, models, repositories
//! └── engine/        # eligibility, calculator, budget tracker, allocator
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let config = EngineConfig::from_env();
//! let db = DbService::new(&config.database_path).await?;
//! let allocator = DiscountAllocator::new(db.pool.clone(), &config);
//!
//! let preview = allocator
//!     .preview_available(customer_id, cart_value, delivery_charge, now_millis())
//!     .await?;
//! let usage = allocator
//!     .apply(campaign_id, customer_id, cart_value, delivery_charge, now_millis())
//!     .await?;
//! ```

pub mod core;
pub mod db;
pub mod engine;
pub mod utils;

// Re-export public types
pub use crate::core::EngineConfig;
pub use db::DbService;
pub use db::models::{
    Campaign, CampaignCreate, CampaignPatch, CampaignStatus, Customer, CustomerCreate,
    DiscountType, DiscountUsage,
};
pub use engine::{
    AllocationError, AvailableDiscounts, BudgetTracker, DiscountAllocator, IneligibleReason,
};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
