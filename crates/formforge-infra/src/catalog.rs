//! Config-backed model catalog.

use formforge_core::catalog::ModelCatalog;
use formforge_types::model::ModelSpec;

/// Model catalog built once from `config.models`.
#[derive(Debug, Clone, Default)]
pub struct StaticModelCatalog {
    models: Vec<ModelSpec>,
}

impl StaticModelCatalog {
    /// Later definitions of an already-seen model name are ignored.
    pub fn new(models: Vec<ModelSpec>) -> Self {
        let mut unique: Vec<ModelSpec> = Vec::with_capacity(models.len());
        for model in models {
            if unique.iter().any(|m| m.name == model.name) {
                tracing::warn!(model = %model.name, "duplicate model definition ignored");
                continue;
            }
            unique.push(model);
        }
        Self { models: unique }
    }
}

impl ModelCatalog for StaticModelCatalog {
    fn get_model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    fn list_models(&self) -> Vec<&ModelSpec> {
        self.models.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_types::model::{AttributeSpec, AttributeType};

    fn model(name: &str, attrs: &[&str]) -> ModelSpec {
        ModelSpec {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|a| AttributeSpec::new(*a, AttributeType::Text))
                .collect(),
        }
    }

    #[test]
    fn test_lookup_and_list() {
        let catalog = StaticModelCatalog::new(vec![model("contact", &["name"]), model("tag", &[])]);
        assert!(catalog.get_model("contact").is_some());
        assert!(catalog.get_model("missing").is_none());
        assert_eq!(catalog.list_models().len(), 2);
    }

    #[test]
    fn test_first_definition_wins() {
        let catalog = StaticModelCatalog::new(vec![
            model("contact", &["name"]),
            model("contact", &["name", "email"]),
        ]);
        assert_eq!(catalog.list_models().len(), 1);
        assert_eq!(catalog.get_model("contact").unwrap().attributes.len(), 1);
    }
}
