pub mod cart;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod feedback;
pub mod logging;
pub mod models;
pub mod notify;
pub mod payment;
pub mod reports;
pub mod state;
pub mod store;
pub mod watch;
pub mod workflow;

#[cfg(feature = "desktop")]
mod commands;


#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::{bills, cart, feedback, menu, orders, reports};
    use tauri::Manager;
    use tracing::{error, info};

    use crate::config::AppConfig;
    use crate::db::Database;
    use crate::notify::TelegramNotifier;
    use crate::state::AppState;

    logging::init();
    let config = AppConfig::load();

    let result = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .setup(move |app| {
            let data_dir = app.path().app_data_dir()?;
            let db = Database::open(&data_dir.join(&config.database_file))?;
            info!(path = %data_dir.display(), "Database ready");

            let notifier = TelegramNotifier::new(config.telegram.clone())?;
            let poll = config.bill_poll_interval;
            app.manage(AppState::new(db, notifier, config.clone()));

            watch::spawn_bill_watcher(app.handle().clone(), poll);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Menu
            menu::get_menu,
            menu::get_menu_categories,
            menu::open_menu_item,
            menu::create_menu_item,
            menu::update_menu_item,
            // Cart
            cart::get_cart,
            cart::add_to_cart,
            cart::update_cart_quantity,
            cart::remove_from_cart,
            cart::clear_cart,
            // Orders and payment
            orders::place_order,
            orders::submit_payment,
            orders::settle_bill,
            orders::get_payment_instructions,
            orders::call_waiter,
            orders::request_bill,
            orders::get_table_bill,
            orders::watch_table_bill,
            orders::unwatch_table_bill,
            // Staff dashboard
            bills::load_dashboard,
            bills::approve_order,
            bills::reject_order,
            bills::add_item_to_bill,
            bills::remove_item_from_bill,
            bills::mark_bill_as_paid,
            // Reports
            reports::get_menu_stats,
            reports::get_daily_summary,
            reports::send_daily_summary,
            // Feedback
            feedback::submit_feedback,
            feedback::get_feedback,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        error!("Error while running tauri application: {e}");
        std::process::exit(1);
    }
}
