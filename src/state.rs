use std::sync::Mutex;

use crate::cart::{Cart, CartBook};
use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::notify::TelegramNotifier;
use crate::watch::BillWatch;
use crate::workflow::OrderWorkflow;

pub struct AppState {
    pub db: Database,
    pub notifier: TelegramNotifier,
    pub config: AppConfig,
    pub carts: Mutex<CartBook>,
    pub watch: Mutex<BillWatch>,
}

impl AppState {
    pub fn new(db: Database, notifier: TelegramNotifier, config: AppConfig) -> Self {
        Self {
            db,
            notifier,
            config,
            carts: Mutex::new(CartBook::new()),
            watch: Mutex::new(BillWatch::new()),
        }
    }

    pub fn workflow(&self) -> OrderWorkflow<'_, Database, TelegramNotifier> {
        OrderWorkflow::new(&self.db, &self.notifier)
    }

    pub fn dashboard(&self) -> Dashboard<'_, Database, TelegramNotifier> {
        Dashboard::new(&self.db, &self.notifier, self.config.default_table_count)
    }

    pub fn cart(&self, user_id: &str, table_number: &str) -> Result<Cart> {
        Ok(self.lock_carts()?.get(user_id, table_number))
    }

    /// Apply `f` to a table's cart and return the cart afterwards.
    pub fn update_cart<T>(
        &self,
        user_id: &str,
        table_number: &str,
        f: impl FnOnce(&mut Cart) -> Result<T>,
    ) -> Result<Cart> {
        let mut carts = self.lock_carts()?;
        let mut cart = carts.take(user_id, table_number);
        let result = f(&mut cart);
        carts.put(user_id, table_number, cart.clone());
        result?;
        Ok(cart)
    }

    /// Take a table's cart out for submission. The async submit cannot hold
    /// the lock, so the cart is put back with [`AppState::put_cart`].
    pub fn take_cart(&self, user_id: &str, table_number: &str) -> Result<Cart> {
        Ok(self.lock_carts()?.take(user_id, table_number))
    }

    pub fn put_cart(&self, user_id: &str, table_number: &str, cart: Cart) -> Result<()> {
        self.lock_carts()?.put(user_id, table_number, cart);
        Ok(())
    }

    fn lock_carts(&self) -> Result<std::sync::MutexGuard<'_, CartBook>> {
        self.carts
            .lock()
            .map_err(|e| AppError::Internal(format!("Cart lock poisoned: {}", e)))
    }

    pub fn watch_table(&self, user_id: &str, table_number: &str) -> Result<()> {
        self.lock_watch()?.watch(user_id, table_number);
        Ok(())
    }

    /// Stop tracking a table's bill and forget its cart, for when the diner
    /// view leaves the table.
    pub fn unwatch_table(&self, user_id: &str, table_number: &str) -> Result<()> {
        self.lock_watch()?.unwatch(user_id, table_number);
        self.lock_carts()?.remove(user_id, table_number);
        Ok(())
    }

    fn lock_watch(&self) -> Result<std::sync::MutexGuard<'_, BillWatch>> {
        self.watch
            .lock()
            .map_err(|e| AppError::Internal(format!("Bill watch lock poisoned: {}", e)))
    }
}

#[cfg(feature = "desktop")]
pub trait AppStateExt {
    fn app_state(&self) -> &AppState;
}

#[cfg(feature = "desktop")]
impl AppStateExt for tauri::AppHandle {
    fn app_state(&self) -> &AppState {
        use tauri::Manager;
        self.state::<AppState>().inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateMenuItem;
    use crate::store::OrderStore;

    fn state() -> AppState {
        let config = AppConfig::default();
        let notifier = TelegramNotifier::new(config.telegram.clone()).unwrap();
        AppState::new(Database::open_in_memory().unwrap(), notifier, config)
    }

    #[test]
    fn test_leaving_a_table_releases_its_state() {
        let state = state();
        let item = state
            .db
            .create_menu_item(
                "tenant",
                &CreateMenuItem {
                    name: "Tea".to_string(),
                    description: String::new(),
                    price: 2.0,
                    category: "Drinks".to_string(),
                    available: Some(true),
                    preparation_time: None,
                    ingredients: None,
                    allergens: None,
                    photo: None,
                },
            )
            .unwrap();

        state.watch_table("tenant", "1").unwrap();
        state
            .update_cart("tenant", "1", |cart| cart.add_item(&item))
            .unwrap();
        assert_eq!(state.carts.lock().unwrap().len(), 1);

        state.unwatch_table("tenant", "1").unwrap();
        assert!(state.watch.lock().unwrap().targets().is_empty());
        assert!(state.carts.lock().unwrap().is_empty());
        assert!(state.cart("tenant", "1").unwrap().is_empty());
    }

    #[test]
    fn test_emptied_cart_is_not_kept() {
        let state = state();
        state
            .update_cart("tenant", "3", |cart| {
                cart.clear();
                Ok(())
            })
            .unwrap();
        assert!(state.carts.lock().unwrap().is_empty());

        let taken = state.take_cart("tenant", "3").unwrap();
        state.put_cart("tenant", "3", taken).unwrap();
        assert!(state.carts.lock().unwrap().is_empty());
    }
}
