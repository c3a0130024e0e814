use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::item::{normalize_item_key, Item, ItemId, ItemSource, Tier};

const BUILTIN_ITEMS: &str = include_str!("../../data/items.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog item name `{0}` is not unique")]
    DuplicateName(String),
    #[error("catalog item id `{0}` is not unique")]
    DuplicateId(u32),
    #[error("catalog item `{name}` is invalid: {reason}")]
    InvalidItem { name: String, reason: String },
    #[error("catalog contains no items")]
    Empty,
}

/// Read-only item reference data, keyed by normalized name.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: BTreeMap<String, Item>,
    ids: BTreeMap<ItemId, String>,
}

impl Catalog {
    pub fn new(items: Vec<Item>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut catalog = Self::default();
        for item in items {
            validate_item(&item)?;
            if catalog.ids.contains_key(&item.id) {
                return Err(CatalogError::DuplicateId(item.id.0));
            }
            if catalog.items.contains_key(&item.name) {
                return Err(CatalogError::DuplicateName(item.name));
            }
            catalog.ids.insert(item.id, item.name.clone());
            catalog.items.insert(item.name.clone(), item);
        }

        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let items = serde_json::from_str::<Vec<Item>>(raw)?;
        Self::new(items)
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_ITEMS)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json(&raw)
    }

    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    pub fn get_by_id(&self, id: ItemId) -> Option<&Item> {
        self.ids.get(&id).and_then(|name| self.items.get(name))
    }

    /// Resolves a client key by normalized name first, then by numeric id.
    pub fn resolve(&self, key: &str) -> Option<&Item> {
        let normalized = normalize_item_key(key);
        self.items
            .get(&normalized)
            .or_else(|| key.trim().parse::<u32>().ok().and_then(|id| self.get_by_id(ItemId(id))))
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn filter(&self, source: Option<ItemSource>, tier: Option<Tier>) -> Vec<&Item> {
        let mut items = self
            .items
            .values()
            .filter(|item| source.map_or(true, |source| item.source == source))
            .filter(|item| tier.map_or(true, |tier| item.tier == tier))
            .collect::<Vec<_>>();
        items.sort_by_key(|item| item.id);
        items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn validate_item(item: &Item) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidItem {
        name: item.name.clone(),
        reason: reason.to_string(),
    };

    if item.name.is_empty() || normalize_item_key(&item.name) != item.name {
        return Err(invalid("name must be lowercase words joined by `_`"));
    }
    if item.display_name.trim().is_empty() {
        return Err(invalid("display_name must not be empty"));
    }
    if item.is_pet() && item.multi_harvest {
        return Err(invalid("pets cannot be multi-harvest"));
    }
    if let Some(value) = item.bonus_value {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid("bonus_value must be a finite non-negative number"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{Catalog, CatalogError};
    use crate::domain::item::{ItemId, ItemSource, Tier};

    #[test]
    fn builtin_catalog_loads_crops_and_pets() {
        let catalog = Catalog::builtin().expect("builtin catalog should parse");

        assert!(catalog.len() > 20);
        assert!(!catalog.filter(Some(ItemSource::Crop), None).is_empty());
        assert!(!catalog.filter(Some(ItemSource::Pet), None).is_empty());
        assert!(catalog.items().all(|item| item.is_crop() || item.bonus_type.is_some()));
    }

    #[test]
    fn resolve_accepts_names_display_names_and_ids() {
        let catalog = Catalog::builtin().expect("builtin catalog should parse");

        assert_eq!(catalog.resolve("carrot").map(|item| item.id), Some(ItemId(1)));
        assert_eq!(
            catalog.resolve("Orange Tulip").map(|item| item.name.as_str()),
            Some("orange_tulip")
        );
        assert_eq!(catalog.resolve("2").map(|item| item.name.as_str()), Some("strawberry"));
        assert!(catalog.resolve("moon_melon").is_none());
    }

    #[test]
    fn filter_by_tier_returns_items_in_id_order() {
        let catalog = Catalog::builtin().expect("builtin catalog should parse");
        let legendary = catalog.filter(Some(ItemSource::Crop), Some(Tier::Legendary));

        assert!(!legendary.is_empty());
        assert!(legendary.windows(2).all(|pair| pair[0].id < pair[1].id));
        assert!(legendary.iter().all(|item| item.tier == Tier::Legendary));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let raw = r#"[
            {"id": 1, "name": "carrot", "display_name": "Carrot", "category": "Vegetable",
             "tier": "Common", "sell_price": 18, "source": "crop"},
            {"id": 2, "name": "carrot", "display_name": "Carrot Two", "category": "Vegetable",
             "tier": "Common", "sell_price": 20, "source": "crop"}
        ]"#;

        assert!(matches!(Catalog::from_json(raw), Err(CatalogError::DuplicateName(name)) if name == "carrot"));
    }

    #[test]
    fn unnormalized_names_are_rejected() {
        let raw = r#"[
            {"id": 1, "name": "Orange Tulip", "display_name": "Orange Tulip", "category": "Flower",
             "tier": "Uncommon", "sell_price": 60, "source": "crop"}
        ]"#;

        assert!(matches!(Catalog::from_json(raw), Err(CatalogError::InvalidItem { .. })));
    }

    #[test]
    fn load_reads_catalog_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("items.json");
        fs::write(
            &path,
            r#"[{"id": 7, "name": "moon_melon", "display_name": "Moon Melon", "category": "Fruit",
                 "tier": "Divine", "sell_price": 12000, "source": "crop", "multi_harvest": true}]"#,
        )
        .expect("write catalog");

        let catalog = Catalog::load(&path).expect("catalog file should load");
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("moon_melon").is_some_and(|item| item.multi_harvest));
    }

    #[test]
    fn missing_catalog_file_reports_path() {
        let error = Catalog::load(std::path::Path::new("/nonexistent/items.json"))
            .expect_err("missing file should fail");
        assert!(error.to_string().contains("/nonexistent/items.json"));
    }
}
