use sc_core::{Category, CategoryCollection, RecommendationLevel};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategorySummary {
    pub(crate) id: usize,
    pub(crate) name: String,
    pub(crate) depth: usize,
    pub(crate) subcategories: usize,
    pub(crate) scripts: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScriptSummary {
    pub(crate) name: String,
    pub(crate) category_id: usize,
    pub(crate) revertible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) recommend: Option<RecommendationLevel>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CollectionSummary {
    pub(crate) categories: Vec<CategorySummary>,
    pub(crate) scripts: Vec<ScriptSummary>,
}

impl CollectionSummary {
    /// Flattens the tree depth-first in declaration order.
    pub(crate) fn of(collection: &CategoryCollection) -> Self {
        let mut summary = Self::default();
        for category in &collection.actions {
            summary.visit(category, 0);
        }
        summary
    }

    fn visit(&mut self, category: &Category, depth: usize) {
        self.categories.push(CategorySummary {
            id: category.id,
            name: category.name.clone(),
            depth,
            subcategories: category.subcategories.len(),
            scripts: category.scripts.len(),
        });
        self.scripts.extend(category.scripts.iter().map(|script| ScriptSummary {
            name: script.name.clone(),
            category_id: category.id,
            revertible: script.can_revert(),
            recommend: script.recommendation_level,
        }));
        for subcategory in &category.subcategories {
            self.visit(subcategory, depth + 1);
        }
    }
}
