//! Target data-model catalog trait.

use formforge_types::model::ModelSpec;

/// Lookup of the data models a model-bound form may target.
pub trait ModelCatalog: Send + Sync {
    fn get_model(&self, name: &str) -> Option<&ModelSpec>;

    fn list_models(&self) -> Vec<&ModelSpec>;
}
