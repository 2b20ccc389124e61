//! In-memory evaluator configuration store

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::{AppError, Result};
use super::filters::filter_by_name;
use super::models::{CreateEvaluatorConfig, EvaluatorConfig};

#[derive(Clone)]
pub struct EvaluatorConfigStore {
    configs: Arc<RwLock<BTreeMap<u64, EvaluatorConfig>>>,
    next_id: Arc<RwLock<u64>>,
}

impl Default for EvaluatorConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorConfigStore {
    pub fn new() -> Self {
        Self {
            configs: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    pub fn list(&self) -> Result<Vec<EvaluatorConfig>> {
        let configs = self.configs.read()
            .map_err(|_| AppError::InternalServerError)?;

        Ok(configs.values().cloned().collect())
    }

    pub fn search(&self, term: &str) -> Result<Vec<EvaluatorConfig>> {
        let all = self.list()?;
        Ok(filter_by_name(&all, term).into_iter().cloned().collect())
    }

    pub fn get(&self, id: u64) -> Result<EvaluatorConfig> {
        let configs = self.configs.read()
            .map_err(|_| AppError::InternalServerError)?;

        configs.get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Evaluator config with id {} not found", id)))
    }

    pub fn create(&self, input: CreateEvaluatorConfig) -> Result<EvaluatorConfig> {
        if input.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }

        if input.evaluator_key.trim().is_empty() {
            return Err(AppError::BadRequest("Evaluator key cannot be empty".to_string()));
        }

        let mut configs = self.configs.write()
            .map_err(|_| AppError::InternalServerError)?;

        let mut next_id = self.next_id.write()
            .map_err(|_| AppError::InternalServerError)?;

        let id = *next_id;
        *next_id += 1;

        let config = EvaluatorConfig {
            id,
            name: input.name,
            evaluator_key: input.evaluator_key,
            settings: input.settings.unwrap_or_else(|| serde_json::json!({})),
            created_at: chrono::Utc::now(),
        };

        configs.insert(id, config.clone());
        Ok(config)
    }

    pub fn delete(&self, id: u64) -> Result<()> {
        let mut configs = self.configs.write()
            .map_err(|_| AppError::InternalServerError)?;

        configs.remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Evaluator config with id {} not found", id)))
    }
}
