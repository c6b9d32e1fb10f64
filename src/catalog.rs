use tracing::warn;

use crate::error::{AppError, Result};
use crate::models::MenuItem;
use crate::store::OrderStore;

/// Category filter value that matches every item.
pub const ALL_CATEGORIES: &str = "all";

/// Read-only view over a tenant's menu as fetched from the store.
#[derive(Debug, Clone, Default)]
pub struct MenuCatalog {
    items: Vec<MenuItem>,
}

impl MenuCatalog {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct categories in the order they first appear.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for item in &self.items {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
        }
        categories
    }

    pub fn filter(&self, category: &str) -> Vec<MenuItem> {
        if category == ALL_CATEGORIES {
            return self.items.clone();
        }
        self.items
            .iter()
            .filter(|item| item.category == category)
            .cloned()
            .collect()
    }

    pub fn find(&self, id: i64) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Look up an item a diner or staff member wants to order.
    pub fn orderable(&self, id: i64) -> Result<&MenuItem> {
        let item = self
            .find(id)
            .ok_or_else(|| AppError::not_found(format!("Menu item {}", id)))?;
        if !item.available {
            return Err(AppError::validation(format!(
                "{} is currently unavailable",
                item.name
            )));
        }
        Ok(item)
    }
}

/// Fetch an item for its detail view and count the view. A failed view
/// count does not stop the item from being shown.
pub fn open_item<S: OrderStore>(store: &S, user_id: &str, id: i64) -> Result<MenuItem> {
    let item = store
        .get_menu_item(user_id, id)?
        .ok_or_else(|| AppError::not_found(format!("Menu item {}", id)))?;
    if let Err(e) = store.record_item_view(user_id, id) {
        warn!(menu_item_id = id, "Failed to record view: {e}");
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, category: &str, available: bool) -> MenuItem {
        MenuItem {
            id,
            name: format!("Item {}", id),
            description: String::new(),
            price: 5.0,
            category: category.to_string(),
            available,
            preparation_time: 0,
            ingredients: None,
            allergens: None,
            popularity_score: 0.0,
            views: 0,
            orders: 0,
            photo: None,
            last_updated: String::new(),
        }
    }

    #[test]
    fn test_categories_and_filter() {
        let catalog = MenuCatalog::new(vec![
            item(1, "Pizza", true),
            item(2, "Salads", true),
            item(3, "Pizza", true),
        ]);

        assert_eq!(catalog.categories(), vec!["Pizza", "Salads"]);
        assert_eq!(catalog.filter("Pizza").len(), 2);
        assert_eq!(catalog.filter(ALL_CATEGORIES).len(), 3);
        assert!(catalog.filter("Desserts").is_empty());
    }

    #[test]
    fn test_unavailable_items_are_not_orderable() {
        let catalog = MenuCatalog::new(vec![item(1, "Pizza", false)]);
        assert!(matches!(catalog.orderable(1), Err(AppError::Validation(_))));
        assert!(matches!(catalog.orderable(9), Err(AppError::NotFound(_))));
    }
}
