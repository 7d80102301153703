//! Category Aggregate

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Result, StorefrontError};

#[derive(Clone, Debug)]
pub struct Category {
    id: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StorefrontError::invalid_input("category name is required"));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description: description.into(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_requires_name() {
        assert!(Category::create("  ", "").is_err());
        let c = Category::create("Electronics", "Gadgets").unwrap();
        assert_eq!(c.name(), "Electronics");
    }
}
