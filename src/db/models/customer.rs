//! Customer Model

use serde::{Deserialize, Serialize};

use crate::utils::AppError;
use crate::utils::validation::{MAX_NAME_LEN, validate_email, validate_required_text};

/// Customer entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: i64,
}

/// Create customer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCreate {
    pub email: String,
    pub name: String,
}

impl CustomerCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        Ok(())
    }
}
