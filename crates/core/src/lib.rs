pub mod config;
pub mod domain;
pub mod errors;
pub mod recommendations;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::interaction::{OrderId, ViewEvent, ViewerKey};
pub use domain::product::{CategoryId, Product, ProductAttributes, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommendations::{
    RecommendationEngine, RecommendationKind, RecommendationRequest, RecommendationSettings,
};
