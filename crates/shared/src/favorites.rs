//! Per-user list of saved restaurants and dishes, kept in durable storage.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Restaurant, StopId};
use crate::storage::{read_json, write_json, KeyValueStore, StorageError};

pub const DEFAULT_DESCRIPTION: &str = "One of your favorite places";

pub fn favorites_key(user: &str) -> String {
    format!("favorites_{user}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
    #[default]
    Restaurant,
    Dish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: StopId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FavoriteKind,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub added_date: DateTime<Utc>,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

impl Favorite {
    pub fn from_restaurant(r: &Restaurant, now: DateTime<Utc>) -> Self {
        let description = if r.tags.is_empty() {
            default_description()
        } else {
            r.tags.join(", ")
        };
        Favorite {
            id: r.id,
            name: r.name.clone(),
            kind: FavoriteKind::Restaurant,
            rating: Some(r.rating),
            price: (!r.price_text.is_empty()).then(|| r.price_text.clone()),
            description,
            image: r.image_url.clone(),
            added_date: now,
        }
    }

    fn same_item(&self, id: StopId, kind: FavoriteKind) -> bool {
        self.id == id && self.kind == kind
    }
}

/// Favorites are keyed by user; an item is identified by its id and kind.
#[derive(Clone)]
pub struct FavoritesStore {
    store: Rc<dyn KeyValueStore>,
}

impl FavoritesStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        FavoritesStore { store }
    }

    pub fn load(&self, user: &str) -> Vec<Favorite> {
        read_json(self.store.as_ref(), &favorites_key(user)).unwrap_or_default()
    }

    fn save(&self, user: &str, items: &[Favorite]) -> Result<(), StorageError> {
        write_json(self.store.as_ref(), &favorites_key(user), &items)
    }

    pub fn contains(&self, user: &str, id: StopId, kind: FavoriteKind) -> bool {
        self.load(user).iter().any(|f| f.same_item(id, kind))
    }

    /// Append `item` unless it is already saved. Returns whether it was added.
    pub fn add(&self, user: &str, item: Favorite) -> Result<bool, StorageError> {
        let mut items = self.load(user);
        if items.iter().any(|f| f.same_item(item.id, item.kind)) {
            return Ok(false);
        }
        tracing::info!(user, id = item.id, "favorite added");
        items.push(item);
        self.save(user, &items)?;
        Ok(true)
    }

    pub fn remove(&self, user: &str, id: StopId, kind: FavoriteKind) -> Result<bool, StorageError> {
        let mut items = self.load(user);
        let before = items.len();
        items.retain(|f| !f.same_item(id, kind));
        if items.len() == before {
            return Ok(false);
        }
        self.save(user, &items)?;
        Ok(true)
    }

    /// Add when absent, remove when present. Returns whether the item is
    /// saved afterwards.
    pub fn toggle(&self, user: &str, item: Favorite) -> Result<bool, StorageError> {
        if self.remove(user, item.id, item.kind)? {
            return Ok(false);
        }
        self.add(user, item)
    }

    /// Drop every favorite of `user`. Returns how many were removed.
    pub fn clear(&self, user: &str) -> Result<usize, StorageError> {
        let count = self.load(user).len();
        if count > 0 {
            self.save(user, &[])?;
        }
        Ok(count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FavoriteFilter {
    #[default]
    All,
    Restaurants,
    Dishes,
}

impl FavoriteFilter {
    pub fn parse(s: &str) -> Self {
        match s {
            "restaurants" => FavoriteFilter::Restaurants,
            "dishes" => FavoriteFilter::Dishes,
            _ => FavoriteFilter::All,
        }
    }

    fn matches(&self, item: &Favorite) -> bool {
        match self {
            FavoriteFilter::All => true,
            FavoriteFilter::Restaurants => item.kind == FavoriteKind::Restaurant,
            FavoriteFilter::Dishes => item.kind == FavoriteKind::Dish,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FavoriteOrder {
    #[default]
    Recent,
    Oldest,
    Name,
    Rating,
}

impl FavoriteOrder {
    pub fn parse(s: &str) -> Self {
        match s {
            "oldest" => FavoriteOrder::Oldest,
            "name" => FavoriteOrder::Name,
            "rating" => FavoriteOrder::Rating,
            _ => FavoriteOrder::Recent,
        }
    }
}

pub fn select_favorites(items: &[Favorite], filter: FavoriteFilter, order: FavoriteOrder) -> Vec<Favorite> {
    let mut selected: Vec<Favorite> = items.iter().filter(|f| filter.matches(f)).cloned().collect();
    match order {
        FavoriteOrder::Recent => selected.sort_by(|a, b| b.added_date.cmp(&a.added_date)),
        FavoriteOrder::Oldest => selected.sort_by(|a, b| a.added_date.cmp(&b.added_date)),
        FavoriteOrder::Name => selected.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        // Unrated items sort as zero.
        FavoriteOrder::Rating => {
            selected.sort_by(|a, b| b.rating.unwrap_or(0.0).total_cmp(&a.rating.unwrap_or(0.0)))
        }
    }
    selected
}

pub fn share_text(item: &Favorite) -> String {
    format!("Try {}! Found on Culinary Compass Vietnam.", item.name)
}

/// "Today", "Yesterday", "3 days ago", "2 weeks ago", then the calendar date.
pub fn added_label(added: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - added).num_days().abs();
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        7..=29 => {
            let weeks = days / 7;
            if weeks == 1 {
                "1 week ago".to_string()
            } else {
                format!("{weeks} weeks ago")
            }
        }
        _ => added.format("%-d/%-m/%Y").to_string(),
    }
}
