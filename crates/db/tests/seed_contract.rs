use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use storefront_core::domain::interaction::ViewerKey;
use storefront_core::domain::product::ProductId;
use storefront_core::recommendations::{
    NoopRecommendationCache, RecommendationEngine, RecommendationKind, RecommendationRequest,
    RecommendationSettings,
};
use storefront_db::{
    connect_with_settings, migrations, DemoCatalogSeed, SqlCatalogRepository,
    SqlInteractionRepository,
};

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

#[derive(Debug, Deserialize)]
struct RecommendationScenario {
    name: String,
    kind: String,
    #[serde(default)]
    product_id: Option<i64>,
    #[serde(default)]
    viewer: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
    expected_product_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct SeedContract {
    dataset_version: String,
    seed_dataset: String,
    scenarios: Vec<RecommendationScenario>,
}

fn load_contract() -> SeedContractTestResult<SeedContract> {
    serde_json::from_str(include_str!("../../../config/fixtures/demo_catalog_contract.json"))
        .map_err(|error| format!("seed contract JSON must parse: {error}"))
}

impl RecommendationScenario {
    fn request(&self) -> SeedContractTestResult<RecommendationRequest> {
        let kind: RecommendationKind =
            self.kind.parse().map_err(|error| format!("{}: {error}", self.name))?;
        let mut request = RecommendationRequest::new(kind);
        if let Some(product_id) = self.product_id {
            request = request.with_product(ProductId(product_id));
        }
        if let Some(viewer) = &self.viewer {
            let viewer: ViewerKey =
                viewer.parse().map_err(|error| format!("{}: {error}", self.name))?;
            request = request.with_viewer(viewer);
        }
        if let Some(limit) = self.limit {
            request = request.with_limit(limit);
        }
        Ok(request)
    }
}

#[test]
fn seed_contract_matches_demo_sql_fixture() -> SeedContractTestResult {
    let fixture_sql = DemoCatalogSeed::SQL;
    let contract = load_contract()?;
    let mut names_seen = HashSet::new();

    require_eq!(contract.dataset_version, "demo-catalog-1");
    require_eq!(contract.seed_dataset, "deterministic_storefront_demo");
    require!(!contract.scenarios.is_empty());

    for scenario in &contract.scenarios {
        require!(names_seen.insert(scenario.name.clone()), "duplicate scenario: {}", scenario.name);
        let request = scenario.request()?;
        require!(
            request.primary_key().is_some(),
            "scenario {} is missing the input its kind needs",
            scenario.name
        );

        for product_id in &scenario.expected_product_ids {
            require!(
                fixture_sql.contains(&format!("({product_id}, '")),
                "seed SQL fixture should define product {} used by {}",
                product_id,
                scenario.name
            );
        }
    }

    Ok(())
}

#[tokio::test]
async fn engine_over_seeded_database_matches_contract() -> SeedContractTestResult {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrations: {error}"))?;
    DemoCatalogSeed::load(&pool).await.map_err(|error| format!("seed: {error}"))?;

    let engine = RecommendationEngine::new(
        Arc::new(SqlCatalogRepository::new(pool.clone())),
        Arc::new(SqlInteractionRepository::new(pool)),
        Arc::new(NoopRecommendationCache),
        RecommendationSettings::default(),
    );

    for scenario in load_contract()?.scenarios {
        let products = engine.recommend(&scenario.request()?).await;
        let actual = products.iter().map(|product| product.id.0).collect::<Vec<_>>();
        require_eq!(
            actual,
            scenario.expected_product_ids,
            "scenario `{}` returned {:?}, expected {:?}",
            scenario.name,
            actual,
            scenario.expected_product_ids
        );
        require!(
            products.iter().all(|product| product.is_eligible()),
            "scenario `{}` returned an ineligible product",
            scenario.name
        );
    }

    Ok(())
}
