//! Category tree records

use serde::{Deserialize, Serialize};

use super::{field, validate_each, SchemaError, Validate};

/// One node of the marketplace category tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "categoryId")]
    pub category_id: i64,
    pub name: String,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<i64>,
    #[serde(alias = "childrenCount")]
    pub children_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryList {
    #[serde(alias = "categories")]
    pub items: Vec<Category>,
}

impl Validate for Category {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::constraint(field(path, "name"), "must not be empty"));
        }
        if self.children_count < 0 {
            return Err(SchemaError::constraint(
                field(path, "children_count"),
                "must not be negative",
            ));
        }
        if self.parent_id == Some(self.category_id) {
            return Err(SchemaError::constraint(
                field(path, "parent_id"),
                "must differ from category_id",
            ));
        }
        Ok(())
    }
}

impl Validate for CategoryList {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        validate_each(path, "items", &self.items)
    }
}
