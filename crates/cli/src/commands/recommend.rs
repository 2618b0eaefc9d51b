use std::sync::Arc;

use serde_json::json;
use storefront_core::domain::interaction::ViewerKey;
use storefront_core::domain::product::ProductId;
use storefront_core::recommendations::{
    NoopRecommendationCache, RecommendationEngine, RecommendationKind, RecommendationRequest,
    RecommendationSettings,
};
use storefront_db::{SqlCatalogRepository, SqlInteractionRepository};

use crate::commands::{connect, prepare, CommandError, CommandResult};

#[derive(Debug, Clone, Default)]
pub struct RecommendArgs {
    pub kind: String,
    pub product: Option<i64>,
    pub viewer: Option<String>,
    pub limit: Option<usize>,
}

impl RecommendArgs {
    fn request(&self) -> Result<RecommendationRequest, CommandResult> {
        let kind: RecommendationKind = self.kind.parse().map_err(|error| {
            CommandResult::failure("recommend", "invalid_input", format!("{error}"), 6)
        })?;

        let mut request = RecommendationRequest::new(kind);
        if let Some(product) = self.product {
            request = request.with_product(ProductId(product));
        }
        if let Some(viewer) = &self.viewer {
            let viewer: ViewerKey = viewer.parse().map_err(|error| {
                CommandResult::failure("recommend", "invalid_input", format!("{error}"), 6)
            })?;
            request = request.with_viewer(viewer);
        }
        if let Some(limit) = self.limit {
            request = request.with_limit(limit);
        }

        if request.primary_key().is_none() {
            let needed = if kind.requires_viewer() { "--viewer" } else { "--product" };
            return Err(CommandResult::failure(
                "recommend",
                "invalid_input",
                format!("`{kind}` recommendations need {needed}"),
                6,
            ));
        }
        Ok(request)
    }
}

pub fn run(args: RecommendArgs) -> CommandResult {
    let request = match args.request() {
        Ok(request) => request,
        Err(failure) => return failure,
    };
    let (config, runtime) = match prepare("recommend") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;
        // One-shot process: a result cache would never be read again.
        let engine = RecommendationEngine::new(
            Arc::new(SqlCatalogRepository::new(pool.clone())),
            Arc::new(SqlInteractionRepository::new(pool.clone())),
            Arc::new(NoopRecommendationCache),
            RecommendationSettings::from_config(&config.recommendations),
        );
        let products = engine.recommend(&request).await;
        pool.close().await;
        Ok::<_, CommandError>(products)
    });

    match result {
        Ok(products) => {
            let message = format!("{} `{}` recommendations", products.len(), request.kind);
            let data = json!({ "kind": request.kind, "products": products });
            CommandResult::success_with_data("recommend", message, Some(data))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("recommend", error_class, message, exit_code)
        }
    }
}
