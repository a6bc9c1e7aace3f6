//! Category provider: a fixed catalog of {title, items} records, consumed
//! read-only. Selection applies the shuffle-and-truncate-to-5 step, which is
//! the only randomness in the whole game.

use crate::types::SelectedCategory;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Items kept per round after the randomized truncation.
pub const ROUND_ITEM_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    pub items: Vec<String>,
}

static CATALOG: OnceLock<Vec<Category>> = OnceLock::new();

/// The built-in catalog, embedded at compile time.
pub fn catalog() -> &'static [Category] {
    CATALOG.get_or_init(|| {
        serde_json::from_str(include_str!("../data/categories.json"))
            .expect("embedded category catalog is valid JSON")
    })
}

pub fn find(title: &str) -> Option<&'static Category> {
    catalog().iter().find(|c| c.title == title)
}

pub fn random() -> &'static Category {
    catalog()
        .choose(&mut rand::rng())
        .expect("embedded category catalog is non-empty")
}

impl Category {
    /// Shuffle the item pool and keep the first five.
    pub fn randomized(&self) -> SelectedCategory {
        let mut items = self.items.clone();
        items.shuffle(&mut rand::rng());
        items.truncate(ROUND_ITEM_COUNT);
        SelectedCategory {
            title: self.title.clone(),
            items,
            is_custom: false,
        }
    }
}

/// Build a host-authored category. Blank entries are dropped; at least one
/// non-blank item is required. Short lists are kept as-is.
pub fn custom(title: &str, items: Vec<String>) -> Result<SelectedCategory, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Custom category needs a title".to_string());
    }
    let mut items: Vec<String> = items
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    if items.is_empty() {
        return Err("Custom category needs at least one item".to_string());
    }
    items.shuffle(&mut rand::rng());
    items.truncate(ROUND_ITEM_COUNT);
    Ok(SelectedCategory {
        title: title.to_string(),
        items,
        is_custom: true,
    })
}
