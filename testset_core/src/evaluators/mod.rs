pub mod filters;
pub mod models;
pub mod store;

pub use filters::filter_by_name;
pub use models::{CreateEvaluatorConfig, EvaluatorConfig};
pub use store::EvaluatorConfigStore;
