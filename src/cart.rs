use std::collections::HashMap;

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{MenuItem, OrderItem};

/// A diner's unsubmitted order. Lines keep insertion order.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct Cart {
    items: Vec<OrderItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add_item(&mut self, item: &MenuItem) -> Result<()> {
        self.add_quantity(item, 1)
    }

    pub fn add_quantity(&mut self, item: &MenuItem, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }
        match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.add_quantity(quantity)?,
            None => self.items.push(OrderItem::from_menu_item(item, quantity)),
        }
        Ok(())
    }

    pub fn remove_item(&mut self, id: i64) {
        self.items.retain(|line| line.id != id);
    }

    /// A quantity of zero or less removes the line.
    pub fn update_quantity(&mut self, id: i64, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            self.remove_item(id);
            return Ok(());
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| AppError::validation(format!("Quantity {} is too large", quantity)))?;
        if let Some(line) = self.items.iter_mut().find(|line| line.id == id) {
            line.set_quantity(quantity);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total_amount(&self) -> f64 {
        self.items
            .iter()
            .map(|line| line.price * line.quantity as f64)
            .sum()
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

/// In-memory carts for the sessions a device is serving, keyed by
/// tenant and table.
#[derive(Debug, Default)]
pub struct CartBook {
    carts: HashMap<(String, String), Cart>,
}

impl CartBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str, table_number: &str) -> Cart {
        self.carts
            .get(&(user_id.to_string(), table_number.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Store a table's cart. An empty cart drops the entry.
    pub fn put(&mut self, user_id: &str, table_number: &str, cart: Cart) {
        if cart.is_empty() {
            self.remove(user_id, table_number);
        } else {
            self.carts
                .insert((user_id.to_string(), table_number.to_string()), cart);
        }
    }

    pub fn take(&mut self, user_id: &str, table_number: &str) -> Cart {
        self.remove(user_id, table_number).unwrap_or_default()
    }

    pub fn remove(&mut self, user_id: &str, table_number: &str) -> Option<Cart> {
        self.carts
            .remove(&(user_id.to_string(), table_number.to_string()))
    }

    /// Number of tables holding a non-empty cart.
    pub fn len(&self) -> usize {
        self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_item(id: i64, name: &str, price: f64) -> MenuItem {
        MenuItem {
            id,
            name: name.to_string(),
            description: String::new(),
            price,
            category: "Mains".to_string(),
            available: true,
            preparation_time: 10,
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
    fn test_cart_totals_example() {
        let pizza = menu_item(1, "Margherita Pizza", 12.99);
        let salad = menu_item(2, "Caesar Salad", 8.99);

        let mut cart = Cart::new();
        cart.add_item(&pizza).unwrap();
        cart.add_item(&salad).unwrap();
        cart.add_item(&salad).unwrap();

        assert!((cart.total_amount() - 30.97).abs() < 0.001);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let pizza = menu_item(1, "Pizza", 10.0);
        let mut cart = Cart::new();
        cart.add_quantity(&pizza, 3).unwrap();

        cart.update_quantity(1, 5).unwrap();
        assert_eq!(cart.total_items(), 5);
        assert!((cart.items()[0].total - 50.0).abs() < 0.001);

        cart.update_quantity(1, 0).unwrap();
        assert!(cart.is_empty());

        cart.add_item(&pizza).unwrap();
        cart.update_quantity(1, -2).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let a = menu_item(1, "A", 3.5);
        let b = menu_item(2, "B", 1.25);
        let c = menu_item(3, "C", 7.0);
        let mut cart = Cart::new();

        cart.add_item(&a).unwrap();
        cart.add_quantity(&b, 4).unwrap();
        cart.add_item(&c).unwrap();
        cart.update_quantity(3, 2).unwrap();
        cart.remove_item(1);
        cart.add_item(&a).unwrap();
        cart.update_quantity(2, 1).unwrap();

        let expected: f64 = cart
            .items()
            .iter()
            .map(|line| line.price * line.quantity as f64)
            .sum();
        assert!((cart.total_amount() - expected).abs() < 1e-9);
        assert!((cart.total_amount() - 18.75).abs() < 0.001);
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        let pizza = menu_item(1, "Pizza", 10.0);
        let mut cart = Cart::new();
        cart.add_item(&pizza).unwrap();

        assert!(matches!(
            cart.update_quantity(1, i64::MAX),
            Err(AppError::Validation(_))
        ));
        assert_eq!(cart.total_items(), 1);

        cart.update_quantity(1, i64::from(u32::MAX)).unwrap();
        assert!(matches!(
            cart.add_item(&pizza),
            Err(AppError::Validation(_))
        ));
        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_update_unknown_id_is_ignored() {
        let mut cart = Cart::new();
        cart.update_quantity(42, 3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_book_isolates_tables() {
        let a = menu_item(1, "A", 3.0);
        let mut book = CartBook::new();
        let mut cart = Cart::new();
        cart.add_item(&a).unwrap();
        book.put("tenant", "1", cart);

        assert_eq!(book.get("tenant", "1").total_items(), 1);
        assert!(book.get("tenant", "2").is_empty());
        assert!(book.get("other", "1").is_empty());
    }

    #[test]
    fn test_cart_book_drops_emptied_carts() {
        let a = menu_item(1, "A", 3.0);
        let mut book = CartBook::new();

        let mut cart = Cart::new();
        cart.add_item(&a).unwrap();
        book.put("tenant", "1", cart);
        book.put("tenant", "2", Cart::new());
        assert_eq!(book.len(), 1);

        let taken = book.take("tenant", "1");
        assert_eq!(taken.total_items(), 1);
        assert!(book.is_empty());

        book.put("tenant", "1", Cart::new());
        assert!(book.is_empty());
    }
}
