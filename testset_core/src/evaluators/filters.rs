use super::models::EvaluatorConfig;

/// Keeps configs whose name contains `term`, ignoring case.
///
/// An empty term matches everything. Order is preserved.
pub fn filter_by_name<'a>(configs: &'a [EvaluatorConfig], term: &str) -> Vec<&'a EvaluatorConfig> {
    if term.is_empty() {
        return configs.iter().collect();
    }

    let needle = term.to_lowercase();
    configs
        .iter()
        .filter(|config| config.name.to_lowercase().contains(&needle))
        .collect()
}
