use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use storefront_core::domain::interaction::{CandidateCount, OrderId, Review, ViewEvent, ViewerKey};
use storefront_core::domain::product::ProductId;
use storefront_core::recommendations::{DataAccessError, InteractionStore};

use super::{decode_err, RepositoryError};
use crate::DbPool;

/// Views keyed the same way `ViewerKey` renders, so users and anonymous
/// addresses never collide.
const KEYED_VIEWS: &str = "views AS (
    SELECT COALESCE('user:' || user_id, 'anon:' || anonymous_address) AS viewer_key,
           product_id, viewed_at
    FROM product_view
)";

pub struct SqlInteractionRepository {
    pool: DbPool,
}

impl SqlInteractionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn record_order(
        &self,
        order_id: OrderId,
        product_ids: &[ProductId],
        placed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO customer_order (id, placed_at) VALUES (?, ?)")
            .bind(order_id.0)
            .bind(timestamp(placed_at))
            .execute(&mut *tx)
            .await?;
        for product_id in product_ids {
            sqlx::query(
                "INSERT INTO order_line (order_id, product_id, quantity) VALUES (?, ?, 1)
                 ON CONFLICT(order_id, product_id) DO UPDATE SET quantity = quantity + 1",
            )
            .bind(order_id.0)
            .bind(product_id.0)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn record_view(&self, event: &ViewEvent) -> Result<(), RepositoryError> {
        let (user_id, anonymous_address) = match &event.viewer {
            ViewerKey::User(id) => (Some(*id), None),
            ViewerKey::Anonymous(address) => (None, Some(address.as_str())),
        };

        sqlx::query(
            "INSERT INTO product_view (product_id, user_id, anonymous_address, viewed_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(event.product_id.0)
        .bind(user_id)
        .bind(anonymous_address)
        .bind(timestamp(event.viewed_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn record_review(&self, review: &Review) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO review (product_id, rating, created_at) VALUES (?, ?, ?)")
            .bind(review.product_id.0)
            .bind(i64::from(review.rating))
            .bind(timestamp(Utc::now()))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn candidate_counts(
        &self,
        sql: &str,
        seed: ProductId,
    ) -> Result<Vec<CandidateCount>, RepositoryError> {
        let rows = sqlx::query(sql).bind(seed.0).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let product_id: i64 = row.try_get("product_id").map_err(decode_err)?;
                let count: i64 = row.try_get("count").map_err(decode_err)?;
                let count = u32::try_from(count).map_err(decode_err)?;
                Ok(CandidateCount::new(ProductId(product_id), count))
            })
            .collect()
    }
}

/// Fixed-width UTC so lexical order in SQLite matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl InteractionStore for SqlInteractionRepository {
    async fn get_co_purchased_candidates(
        &self,
        seed: ProductId,
    ) -> Result<Vec<CandidateCount>, DataAccessError> {
        let sql = "SELECT other.product_id AS product_id, COUNT(DISTINCT other.order_id) AS count
                   FROM order_line seed
                   JOIN order_line other
                     ON other.order_id = seed.order_id AND other.product_id <> seed.product_id
                   WHERE seed.product_id = ?1
                   GROUP BY other.product_id
                   ORDER BY count DESC, other.product_id ASC";
        Ok(self.candidate_counts(sql, seed).await?)
    }

    async fn get_recently_viewed_product_ids(
        &self,
        viewer: &ViewerKey,
        limit: usize,
    ) -> Result<Vec<ProductId>, DataAccessError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let query = match viewer {
            ViewerKey::User(id) => sqlx::query(
                "SELECT product_id, MAX(viewed_at) AS last_viewed FROM product_view
                 WHERE user_id = ?
                 GROUP BY product_id
                 ORDER BY last_viewed DESC, product_id ASC
                 LIMIT ?",
            )
            .bind(*id),
            ViewerKey::Anonymous(address) => sqlx::query(
                "SELECT product_id, MAX(viewed_at) AS last_viewed FROM product_view
                 WHERE anonymous_address = ?
                 GROUP BY product_id
                 ORDER BY last_viewed DESC, product_id ASC
                 LIMIT ?",
            )
            .bind(address.as_str()),
        };
        let rows = query.bind(limit).fetch_all(&self.pool).await.map_err(RepositoryError::from)?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("product_id").map(ProductId).map_err(decode_err))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    async fn get_co_viewed_candidates(
        &self,
        seed: ProductId,
    ) -> Result<Vec<CandidateCount>, DataAccessError> {
        let sql = format!(
            "WITH {KEYED_VIEWS},
             seed_viewers AS (
                 SELECT viewer_key, MIN(viewed_at) AS first_seen
                 FROM views WHERE product_id = ?1
                 GROUP BY viewer_key
             )
             SELECT v.product_id AS product_id, COUNT(DISTINCT v.viewer_key) AS count
             FROM views v
             JOIN seed_viewers s ON s.viewer_key = v.viewer_key AND v.viewed_at >= s.first_seen
             WHERE v.product_id <> ?1
             GROUP BY v.product_id
             ORDER BY count DESC, v.product_id ASC"
        );
        Ok(self.candidate_counts(&sql, seed).await?)
    }

    async fn get_average_rating(&self, id: ProductId) -> Result<Option<f64>, DataAccessError> {
        let row = sqlx::query("SELECT AVG(rating) AS average FROM review WHERE product_id = ?")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        let average: Option<f64> = row.try_get("average").map_err(decode_err)?;
        Ok(average)
    }

    async fn get_view_count(&self, id: ProductId) -> Result<u64, DataAccessError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product_view WHERE product_id = ?1")
                .bind(id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(RepositoryError::from)?;
        Ok(u64::try_from(count).map_err(decode_err)?)
    }

    async fn get_view_count_since(
        &self,
        id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<u64, DataAccessError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM product_view WHERE product_id = ?1 AND viewed_at >= ?2",
        )
        .bind(id.0)
        .bind(timestamp(since))
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;
        Ok(u64::try_from(count).map_err(decode_err)?)
    }

    async fn get_most_viewed_product_ids(&self) -> Result<Vec<ProductId>, DataAccessError> {
        let rows = sqlx::query(
            "SELECT product_id, COUNT(*) AS count FROM product_view
             GROUP BY product_id
             ORDER BY count DESC, product_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("product_id").map(ProductId).map_err(decode_err))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
