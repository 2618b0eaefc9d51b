use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Row counts the demo fixture must produce.
const SEED_TABLES: &[SeedTableContract] = &[
    SeedTableContract { table: "category", label: "categories", expected_rows: 3 },
    SeedTableContract { table: "product", label: "products", expected_rows: 10 },
    SeedTableContract { table: "customer_order", label: "orders", expected_rows: 8 },
    SeedTableContract { table: "order_line", label: "order-lines", expected_rows: 17 },
    SeedTableContract { table: "review", label: "reviews", expected_rows: 12 },
    SeedTableContract { table: "product_view", label: "views", expected_rows: 15 },
];

/// Products whose eligibility the demo scenarios depend on.
const SEED_PRODUCTS: &[SeedProductContract] = &[
    SeedProductContract { product_id: 1, label: "product-1-eligible", eligible: true },
    SeedProductContract { product_id: 4, label: "product-4-out-of-stock", eligible: false },
    SeedProductContract { product_id: 7, label: "product-7-inactive", eligible: false },
    SeedProductContract { product_id: 10, label: "product-10-uncategorised", eligible: true },
];

const SEED_CATEGORY_IDS: &[i64] = &[1, 2, 3];
const SEED_ORDER_IDS: &[i64] = &[101, 102, 103, 104, 105, 106, 107, 108];
const SEED_PRODUCT_IDS: &[i64] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

/// Deterministic demo catalog used by `storefront seed` and the integration
/// tests. Covers every recommendation kind:
/// 1. co-purchase pairs above and below the threshold
/// 2. same-attribute products at different prices
/// 3. a stale but historically popular product for trending
/// 4. ineligible products (inactive, out of stock)
pub struct DemoCatalogSeed;

impl DemoCatalogSeed {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_catalog.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let tables_seeded = SEED_TABLES
            .iter()
            .map(|contract| TableSeedInfo { table: contract.table, rows: contract.expected_rows })
            .collect::<Vec<_>>();

        Ok(SeedResult { tables_seeded })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for contract in SEED_TABLES {
            let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {}", contract.table))
                .fetch_one(pool)
                .await?;
            checks.push((contract.label, rows == contract.expected_rows));
        }

        for contract in SEED_PRODUCTS {
            let eligible: Option<i64> = sqlx::query_scalar(
                "SELECT (active = 1 AND stock_quantity > 0) FROM product WHERE id = ?1",
            )
            .bind(contract.product_id)
            .fetch_optional(pool)
            .await?;
            checks.push((contract.label, eligible == Some(i64::from(contract.eligible))));
        }

        let strongest_pair: Option<(i64, i64)> = sqlx::query_as(
            "SELECT other.product_id, COUNT(DISTINCT other.order_id) AS shared
             FROM order_line seed
             JOIN order_line other
               ON other.order_id = seed.order_id AND other.product_id <> seed.product_id
             WHERE seed.product_id = 1
             GROUP BY other.product_id
             ORDER BY shared DESC, other.product_id ASC
             LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;
        checks.push(("co-purchase-1-5", strongest_pair == Some((5, 3))));

        let stale_views: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM product_view
             WHERE product_id = 10 AND viewed_at >= strftime('%Y-%m-%dT%H:%M:%SZ', 'now', '-30 days')",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("product-10-stale", stale_views == 0));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the demo rows; dependent interaction rows cascade.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let quoted_orders = sql_array_from_ids(SEED_ORDER_IDS);
        let quoted_products = sql_array_from_ids(SEED_PRODUCT_IDS);
        let quoted_categories = sql_array_from_ids(SEED_CATEGORY_IDS);

        sqlx::query(&format!("DELETE FROM customer_order WHERE id IN {quoted_orders}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM product WHERE id IN {quoted_products}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM category WHERE id IN {quoted_categories}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

struct SeedTableContract {
    table: &'static str,
    label: &'static str,
    expected_rows: i64,
}

struct SeedProductContract {
    product_id: i64,
    label: &'static str,
    eligible: bool,
}

fn sql_array_from_ids(ids: &[i64]) -> String {
    let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
    format!("({joined})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub tables_seeded: Vec<TableSeedInfo>,
}

#[derive(Debug)]
pub struct TableSeedInfo {
    pub table: &'static str,
    pub rows: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoCatalogSeed::SQL.is_empty());
        assert!(DemoCatalogSeed::SQL.contains("INSERT OR IGNORE INTO product_view"));
    }

    #[test]
    fn sql_array_renders_a_tuple() {
        assert_eq!(sql_array_from_ids(&[1, 2, 3]), "(1, 2, 3)");
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = migrated_pool().await;

        let first = DemoCatalogSeed::load(&pool).await.expect("load seed fixtures");
        let first_verification = DemoCatalogSeed::verify(&pool).await.expect("verify fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.tables_seeded.len(), SEED_TABLES.len());

        DemoCatalogSeed::load(&pool).await.expect("reload seed fixtures");
        let second_verification = DemoCatalogSeed::verify(&pool).await.expect("re-verify");
        assert!(second_verification.all_present);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn verify_fails_on_an_empty_database() {
        let pool = migrated_pool().await;

        let verification = DemoCatalogSeed::verify(&pool).await.expect("verify");

        assert!(!verification.all_present);
        assert!(verification.checks.contains(&("products", false)));
    }

    #[tokio::test]
    async fn clean_removes_seeded_rows() {
        let pool = migrated_pool().await;
        DemoCatalogSeed::load(&pool).await.expect("load seed fixtures");

        DemoCatalogSeed::clean(&pool).await.expect("clean");

        for contract in SEED_TABLES {
            let rows: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {}", contract.table))
                    .fetch_one(&pool)
                    .await
                    .expect("count rows");
            assert_eq!(rows, 0, "{} should be empty", contract.table);
        }
    }
}
