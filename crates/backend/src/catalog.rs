use std::collections::HashMap;
use std::path::Path;

use foodtour_shared::models::{Restaurant, StopId};

use crate::error::AppError;

/// The restaurant catalog, loaded once at startup.
pub struct Catalog {
    restaurants: Vec<Restaurant>,
    by_id: HashMap<StopId, usize>,
}

impl Catalog {
    pub fn load(assets_dir: &Path) -> Result<Self, AppError> {
        let path = assets_dir.join("restaurants.json");

        let data = std::fs::read_to_string(&path)
            .map_err(|e| AppError::Catalog(format!("Failed to read {}: {}", path.display(), e)))?;
        let restaurants: Vec<Restaurant> = serde_json::from_str(&data)
            .map_err(|e| AppError::Catalog(format!("Failed to parse restaurants.json: {}", e)))?;

        tracing::info!(restaurants = restaurants.len(), "Loaded restaurant catalog");

        Ok(Self::new(restaurants))
    }

    pub fn new(restaurants: Vec<Restaurant>) -> Self {
        let by_id = restaurants
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
        Catalog { restaurants, by_id }
    }

    pub fn all(&self) -> &[Restaurant] {
        &self.restaurants
    }

    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }

    pub fn find(&self, id: StopId) -> Option<&Restaurant> {
        self.by_id.get(&id).map(|&i| &self.restaurants[i])
    }

    /// Full entries for `ids` in the given order. Ids no longer in the
    /// catalog are skipped.
    pub fn resolve(&self, ids: &[StopId]) -> Vec<Restaurant> {
        ids.iter().filter_map(|&id| self.find(id)).cloned().collect()
    }
}
