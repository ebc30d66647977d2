//! Discount Usage Ledger Repository
//!
//! The ledger is append-only: rows are inserted by the reservation commit in
//! [`super::campaign::commit_reservation`] and never updated or deleted here.

use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::{DiscountUsage, DiscountUsageDetail};

const USAGE_DETAIL_SELECT: &str = "SELECT u.id, u.campaign_id, u.customer_id, u.discount_amount, u.value, u.used_at, c.name as campaign_name, c.discount_type, cu.name as customer_name, cu.email as customer_email FROM discount_usage u JOIN campaign c ON u.campaign_id = c.id JOIN customer cu ON u.customer_id = cu.id";

/// Count how many times a customer used a campaign within `[day_start, day_end)`
pub async fn count_for_day(
    pool: &SqlitePool,
    campaign_id: i64,
    customer_id: i64,
    day_start: i64,
    day_end: i64,
) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM discount_usage WHERE campaign_id = ?1 AND customer_id = ?2 AND used_at >= ?3 AND used_at < ?4",
    )
    .bind(campaign_id)
    .bind(customer_id)
    .bind(day_start)
    .bind(day_end)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Usage history for a customer, newest first, optionally scoped to a campaign
pub async fn find_by_customer(
    pool: &SqlitePool,
    customer_id: i64,
    campaign_id: Option<i64>,
) -> RepoResult<Vec<DiscountUsage>> {
    let rows = match campaign_id {
        Some(cid) => {
            sqlx::query_as::<_, DiscountUsage>(
                "SELECT id, campaign_id, customer_id, discount_amount, value, used_at FROM discount_usage WHERE customer_id = ?1 AND campaign_id = ?2 ORDER BY used_at DESC, id DESC",
            )
            .bind(customer_id)
            .bind(cid)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DiscountUsage>(
                "SELECT id, campaign_id, customer_id, discount_amount, value, used_at FROM discount_usage WHERE customer_id = ?1 ORDER BY used_at DESC, id DESC",
            )
            .bind(customer_id)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// Usage history joined with campaign/customer context, newest first
pub async fn find_detail_by_customer(
    pool: &SqlitePool,
    customer_id: i64,
) -> RepoResult<Vec<DiscountUsageDetail>> {
    let sql = format!(
        "{} WHERE u.customer_id = ? ORDER BY u.used_at DESC, u.id DESC",
        USAGE_DETAIL_SELECT
    );
    let rows = sqlx::query_as::<_, DiscountUsageDetail>(&sql)
        .bind(customer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Total discount granted by a campaign across its lifetime.
///
/// Tests compare this against `campaign.used_budget`; the two are committed
/// in one transaction and must never diverge.
pub async fn sum_for_campaign(pool: &SqlitePool, campaign_id: i64) -> RepoResult<f64> {
    let sum: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(discount_amount), 0.0) FROM discount_usage WHERE campaign_id = ?",
    )
    .bind(campaign_id)
    .fetch_one(pool)
    .await?;
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    async fn insert_usage(
        pool: &SqlitePool,
        campaign_id: i64,
        customer_id: i64,
        amount: f64,
        used_at: i64,
    ) {
        sqlx::query(
            "INSERT INTO discount_usage (campaign_id, customer_id, discount_amount, value, used_at) VALUES (?1, ?2, ?3, 500.0, ?4)",
        )
        .bind(campaign_id)
        .bind(customer_id)
        .bind(amount)
        .bind(used_at)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_count_for_day_bounds_are_half_open() {
        let pool = test_pool().await;
        let day_start = 1_000_000;
        let day_end = day_start + 86_400_000;
        insert_usage(&pool, 1, 1, 10.0, day_start).await; // inclusive start
        insert_usage(&pool, 1, 1, 10.0, day_end - 1).await; // last milli of day
        insert_usage(&pool, 1, 1, 10.0, day_end).await; // next day

        let count = count_for_day(&pool, 1, 1, day_start, day_end).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_count_scoped_to_campaign_and_customer() {
        let pool = test_pool().await;
        insert_usage(&pool, 1, 1, 10.0, 5_000).await;
        insert_usage(&pool, 2, 1, 10.0, 5_000).await; // other campaign
        insert_usage(&pool, 1, 2, 10.0, 5_000).await; // other customer

        let count = count_for_day(&pool, 1, 1, 0, 10_000).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_find_by_customer_newest_first() {
        let pool = test_pool().await;
        insert_usage(&pool, 1, 1, 10.0, 1_000).await;
        insert_usage(&pool, 2, 1, 20.0, 2_000).await;

        let all = find_by_customer(&pool, 1, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].discount_amount, 20.0);

        let scoped = find_by_customer(&pool, 1, Some(1)).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].campaign_id, 1);
    }

    #[tokio::test]
    async fn test_sum_for_campaign() {
        let pool = test_pool().await;
        assert_eq!(sum_for_campaign(&pool, 1).await.unwrap(), 0.0);
        insert_usage(&pool, 1, 1, 10.5, 1_000).await;
        insert_usage(&pool, 1, 2, 4.5, 2_000).await;
        assert_eq!(sum_for_campaign(&pool, 1).await.unwrap(), 15.0);
    }
}
