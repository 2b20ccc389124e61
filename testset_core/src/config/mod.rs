pub mod settings;

pub use settings::{AppConfig, CorsConfig, FileConfig, ServerConfig, SessionConfig};
