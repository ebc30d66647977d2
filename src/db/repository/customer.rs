//! Customer Repository

use sqlx::SqlitePool;

use super::{RepoError, RepoResult};
use crate::db::models::{Customer, CustomerCreate};
use crate::utils::time::now_millis;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Customer>> {
    let row = sqlx::query_as::<_, Customer>(
        "SELECT id, email, name, created_at FROM customer WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<Customer>> {
    let row = sqlx::query_as::<_, Customer>(
        "SELECT id, email, name, created_at FROM customer WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Customer>> {
    let rows = sqlx::query_as::<_, Customer>(
        "SELECT id, email, name, created_at FROM customer ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: CustomerCreate) -> RepoResult<Customer> {
    data.validate()
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    // Check duplicate email
    if find_by_email(pool, &data.email).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Customer with email '{}' already exists",
            data.email
        )));
    }

    let now = now_millis();
    let result = sqlx::query("INSERT INTO customer (email, name, created_at) VALUES (?1, ?2, ?3)")
        .bind(&data.email)
        .bind(&data.name)
        .bind(now)
        .execute(pool)
        .await?;

    find_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create customer".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    fn alice() -> CustomerCreate {
        CustomerCreate {
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = test_pool().await;
        let created = create(&pool, alice()).await.unwrap();
        assert_eq!(created.email, "alice@example.com");

        let by_id = find_by_id(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Alice");

        let by_email = find_by_email(&pool, "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = test_pool().await;
        create(&pool, alice()).await.unwrap();
        let err = create(&pool, alice()).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_invalid_payload_rejected() {
        let pool = test_pool().await;
        let err = create(
            &pool,
            CustomerCreate {
                email: "nope".to_string(),
                name: "Bob".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_customer_is_none() {
        let pool = test_pool().await;
        assert!(find_by_id(&pool, 999).await.unwrap().is_none());
    }
}
