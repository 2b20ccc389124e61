use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::files::FileValidationConfig;
use crate::session::SessionMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub files: FileConfig,
    pub session: SessionConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_body_limit_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub max_file_size_mb: u64,
    pub download_dir: PathBuf,
    pub allowed_content_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: String,
    pub token_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            files: FileConfig::default(),
            session: SessionConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_body_limit_mb: 20,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            download_dir: PathBuf::from("./downloads"),
            allowed_content_types: vec![
                "text/csv".to_string(),
                "application/json".to_string(),
                "text/plain".to_string(),
            ],
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: "open".to_string(),
            token_secret: String::new(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl FileConfig {
    pub fn validation_config(&self) -> FileValidationConfig {
        FileValidationConfig {
            max_file_size: self.max_file_size_mb * 1024 * 1024,
            allowed_content_types: self.allowed_content_types.iter().cloned().collect(),
            ..FileValidationConfig::default()
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.request_body_limit_mb == 0 {
            return Err(ConfigError::Message(
                "Request body limit must be greater than 0".to_string(),
            ));
        }

        if self.files.max_file_size_mb == 0 {
            return Err(ConfigError::Message(
                "Max file size must be greater than 0".to_string(),
            ));
        }

        if self.files.max_file_size_mb > self.server.request_body_limit_mb {
            tracing::warn!(
                "Max file size ({} MB) exceeds the request body limit ({} MB)",
                self.files.max_file_size_mb,
                self.server.request_body_limit_mb
            );
        }

        if self.files.allowed_content_types.is_empty() {
            return Err(ConfigError::Message(
                "At least one upload content type must be allowed".to_string(),
            ));
        }

        let mode = self.session.mode.parse::<SessionMode>()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        if mode == SessionMode::Token && self.session.token_secret.len() < 32 {
            return Err(ConfigError::Message(
                "Session token secret must be at least 32 characters in token mode".to_string(),
            ));
        }

        Ok(())
    }

    pub fn body_limit_bytes(&self) -> usize {
        (self.server.request_body_limit_mb * 1024 * 1024) as usize
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.mode, "open");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.files.max_file_size_mb = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.files.allowed_content_types.clear();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.session.mode = "magic".to_string();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.session.mode = "token".to_string();
        assert!(config.validate().is_err());

        config.session.token_secret = "1a9e1a1d8f3e9613a555adea1881bbd1".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:3000");

        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_validation_config_from_files() {
        let config = AppConfig::default();
        let validation = config.files.validation_config();

        assert_eq!(validation.max_file_size, 10 * 1024 * 1024);
        assert!(validation.allowed_content_types.contains("text/csv"));
        assert_eq!(validation.max_filename_length, 255);
    }

    #[test]
    fn test_config_loading() {
        let config = AppConfig::load().expect("Should load default configuration");

        assert!(config.validate().is_ok());
        assert!(!config.server.host.is_empty());
        assert!(config.server.port > 0);
        assert!(config.files.max_file_size_mb > 0);
    }
}
