use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{
    ApprovedOrder, BillStatus, CreateMenuItem, DailySummary, ItemCount, MenuItem, MenuStats,
    MonthlyRevenue, NewPendingOrder, OrderItem, OrderPaymentMethod, OrderStatus, PaymentStatus,
    PendingOrder, PopularItem, ServiceCallKind, TableBill, UpdateMenuItem,
};
use crate::store::OrderStore;

pub struct Database {
    conn: Mutex<Connection>,
}

macro_rules! text_column {
    ($($ty:ty),* $(,)?) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: AppError| FromSqlError::Other(Box::new(e)))
            }
        }
    )*};
}

text_column!(
    OrderStatus,
    PaymentStatus,
    OrderPaymentMethod,
    BillStatus,
    ServiceCallKind,
);

const MENU_COLUMNS: &str = "id, name, description, price, category, available, preparation_time, \
     ingredients, allergens, popularity_score, views, orders, photo, last_updated";

const PENDING_COLUMNS: &str =
    "id, table_number, user_id, total_amount, created_at, status, payment_status, payment_method";

const BILL_COLUMNS: &str =
    "id, user_id, table_number, subtotal, tax, total, status, created_at, updated_at";

const APPROVED_COLUMNS: &str =
    "id, table_number, total_amount, submitted_at, approved_at";

const PENDING_ITEMS_SQL: &str = "SELECT menu_item_id, name, price, quantity FROM pending_order_items \
     WHERE pending_order_id = ?1 ORDER BY id";

const BILL_ITEMS_SQL: &str = "SELECT menu_item_id, name, price, quantity FROM table_bill_items \
     WHERE bill_id = ?1 ORDER BY id";

const APPROVED_ITEMS_SQL: &str = "SELECT menu_item_id, name, price, quantity FROM approved_order_items \
     WHERE approved_order_id = ?1 ORDER BY id";

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create data directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.initialize()?;
        info!("Opened database at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.initialize()?;
        Ok(db)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            -- Menu, namespaced by tenant
            CREATE TABLE IF NOT EXISTS menu_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                price REAL NOT NULL,
                category TEXT NOT NULL,
                available INTEGER NOT NULL DEFAULT 1,
                preparation_time INTEGER NOT NULL DEFAULT 0,
                popularity_score REAL NOT NULL DEFAULT 0,
                views INTEGER NOT NULL DEFAULT 0,
                orders INTEGER NOT NULL DEFAULT 0,
                photo TEXT,
                last_updated DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Orders waiting for staff approval
            CREATE TABLE IF NOT EXISTS pending_orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                table_number TEXT NOT NULL,
                total_amount REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending_approval',
                payment_status TEXT NOT NULL DEFAULT 'pending',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS pending_order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pending_order_id INTEGER NOT NULL,
                menu_item_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                quantity INTEGER NOT NULL,
                FOREIGN KEY (pending_order_id) REFERENCES pending_orders(id)
            );

            -- Running bills; paid bills are kept for revenue reporting
            CREATE TABLE IF NOT EXISTS table_bills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                table_number TEXT NOT NULL,
                subtotal REAL NOT NULL DEFAULT 0,
                tax REAL NOT NULL DEFAULT 0,
                total REAL NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'open',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                paid_at DATETIME
            );

            -- One open bill per table
            CREATE UNIQUE INDEX IF NOT EXISTS idx_table_bills_open
                ON table_bills (user_id, table_number) WHERE status = 'open';

            CREATE TABLE IF NOT EXISTS table_bill_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bill_id INTEGER NOT NULL,
                menu_item_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                quantity INTEGER NOT NULL,
                FOREIGN KEY (bill_id) REFERENCES table_bills(id)
            );

            -- Approved orders
            CREATE TABLE IF NOT EXISTS approved_orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pending_order_id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                table_number TEXT NOT NULL,
                total_amount REAL NOT NULL,
                payment_method TEXT,
                submitted_at DATETIME,
                approved_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS approved_order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                approved_order_id INTEGER NOT NULL,
                menu_item_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                quantity INTEGER NOT NULL,
                FOREIGN KEY (approved_order_id) REFERENCES approved_orders(id)
            );

            -- Waiter calls and bill requests
            CREATE TABLE IF NOT EXISTS service_calls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                table_number TEXT NOT NULL,
                kind TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Device-local key/value records
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        let menu_columns = table_columns(conn, "menu_items")?;
        if !menu_columns.contains(&"ingredients".to_string()) {
            conn.execute("ALTER TABLE menu_items ADD COLUMN ingredients TEXT", [])?;
        }
        if !menu_columns.contains(&"allergens".to_string()) {
            conn.execute("ALTER TABLE menu_items ADD COLUMN allergens TEXT", [])?;
        }

        let pending_columns = table_columns(conn, "pending_orders")?;
        if !pending_columns.contains(&"payment_method".to_string()) {
            conn.execute("ALTER TABLE pending_orders ADD COLUMN payment_method TEXT", [])?;
        }

        Ok(())
    }

    pub(crate) fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub(crate) fn kv_put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let columns = conn
        .prepare(&format!("PRAGMA table_info({})", table))?
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(columns)
}

fn menu_item_from_row(row: &Row) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        available: row.get(5)?,
        preparation_time: row.get(6)?,
        ingredients: row.get(7)?,
        allergens: row.get(8)?,
        popularity_score: row.get(9)?,
        views: row.get(10)?,
        orders: row.get(11)?,
        photo: row.get(12)?,
        last_updated: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
    })
}

fn pending_order_from_row(row: &Row) -> rusqlite::Result<PendingOrder> {
    Ok(PendingOrder {
        id: row.get(0)?,
        table_number: row.get(1)?,
        user_id: row.get(2)?,
        items: Vec::new(),
        total_amount: row.get(3)?,
        timestamp: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        status: row.get(5)?,
        payment_status: row.get(6)?,
        payment_method: row.get(7)?,
    })
}

fn bill_from_row(row: &Row) -> rusqlite::Result<TableBill> {
    Ok(TableBill {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        table_number: row.get(2)?,
        items: Vec::new(),
        subtotal: row.get(3)?,
        tax: row.get(4)?,
        total: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn approved_order_from_row(row: &Row) -> rusqlite::Result<ApprovedOrder> {
    Ok(ApprovedOrder {
        id: row.get(0)?,
        table_number: row.get(1)?,
        items: Vec::new(),
        total_amount: row.get(2)?,
        timestamp: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        approved_at: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

/// Load the lines of an order or bill, rejecting malformed rows.
fn load_lines(conn: &Connection, sql: &str, parent_id: i64) -> Result<Vec<OrderItem>> {
    let mut stmt = conn.prepare(sql)?;
    let items = stmt
        .query_map([parent_id], |row| {
            Ok(OrderItem::new(
                row.get(0)?,
                row.get::<_, String>(1)?,
                row.get(2)?,
                row.get(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for item in &items {
        item.validate()?;
    }
    Ok(items)
}

fn insert_lines(conn: &Connection, sql: &str, parent_id: i64, items: &[OrderItem]) -> Result<()> {
    let mut stmt = conn.prepare(sql)?;
    for item in items {
        stmt.execute(params![parent_id, item.id, item.name, item.price, item.quantity])?;
    }
    Ok(())
}

fn load_pending_order(conn: &Connection, user_id: &str, id: i64) -> Result<Option<PendingOrder>> {
    let order = conn
        .query_row(
            &format!(
                "SELECT {} FROM pending_orders WHERE user_id = ?1 AND id = ?2",
                PENDING_COLUMNS
            ),
            params![user_id, id],
            pending_order_from_row,
        )
        .optional()?;

    match order {
        Some(mut order) => {
            order.items = load_lines(conn, PENDING_ITEMS_SQL, order.id)?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

/// Attach lines and rebuild totals from them.
fn with_bill_lines(conn: &Connection, mut bill: TableBill) -> Result<TableBill> {
    let id = bill.id.unwrap_or_default();
    bill.items = load_lines(conn, BILL_ITEMS_SQL, id)?;
    bill.recompute();
    Ok(bill)
}

fn load_bill_by_id(conn: &Connection, id: i64) -> Result<TableBill> {
    let bill = conn.query_row(
        &format!("SELECT {} FROM table_bills WHERE id = ?1", BILL_COLUMNS),
        [id],
        bill_from_row,
    )?;
    with_bill_lines(conn, bill)
}

fn load_approved_order(conn: &Connection, id: i64) -> Result<ApprovedOrder> {
    let mut order = conn.query_row(
        &format!("SELECT {} FROM approved_orders WHERE id = ?1", APPROVED_COLUMNS),
        [id],
        approved_order_from_row,
    )?;
    order.items = load_lines(conn, APPROVED_ITEMS_SQL, order.id)?;
    Ok(order)
}

fn delete_pending(conn: &Connection, user_id: &str, id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pending_orders WHERE id = ?1 AND user_id = ?2)",
        params![id, user_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(false);
    }

    // Lines first, the parent row is referenced by them
    conn.execute(
        "DELETE FROM pending_order_items WHERE pending_order_id = ?1",
        [id],
    )?;
    conn.execute(
        "DELETE FROM pending_orders WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(true)
}

fn load_open_bill(conn: &Connection, user_id: &str, table_number: &str) -> Result<Option<TableBill>> {
    let bill = conn
        .query_row(
            &format!(
                "SELECT {} FROM table_bills WHERE user_id = ?1 AND table_number = ?2 AND status = 'open'",
                BILL_COLUMNS
            ),
            params![user_id, table_number],
            bill_from_row,
        )
        .optional()?;

    match bill {
        Some(bill) => Ok(Some(with_bill_lines(conn, bill)?)),
        None => Ok(None),
    }
}

fn archive_order(conn: &Connection, order: &PendingOrder) -> Result<ApprovedOrder> {
    conn.execute(
        "INSERT INTO approved_orders (pending_order_id, user_id, table_number, total_amount, payment_method, submitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            order.id,
            order.user_id,
            order.table_number,
            order.total_amount,
            order.payment_method,
            order.timestamp
        ],
    )?;

    let id = conn.last_insert_rowid();

    insert_lines(
        conn,
        "INSERT INTO approved_order_items (approved_order_id, menu_item_id, name, price, quantity)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        id,
        &order.items,
    )?;

    load_approved_order(conn, id)
}

/// Insert a new bill or overwrite an open one, lines included.
fn save_bill(conn: &Connection, bill: &TableBill) -> Result<TableBill> {
    for item in &bill.items {
        item.validate()?;
    }

    let id = match bill.id {
        Some(id) => {
            conn.execute(
                "UPDATE table_bills SET subtotal = ?1, tax = ?2, total = ?3, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?4 AND status = 'open'",
                params![bill.subtotal, bill.tax, bill.total, id],
            )?;
            if conn.changes() == 0 {
                return Err(AppError::not_found(format!(
                    "Open bill for table {}",
                    bill.table_number
                )));
            }
            conn.execute("DELETE FROM table_bill_items WHERE bill_id = ?1", [id])?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO table_bills (user_id, table_number, subtotal, tax, total, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    bill.user_id,
                    bill.table_number,
                    bill.subtotal,
                    bill.tax,
                    bill.total,
                    BillStatus::Open
                ],
            )?;
            conn.last_insert_rowid()
        }
    };

    insert_lines(
        conn,
        "INSERT INTO table_bill_items (bill_id, menu_item_id, name, price, quantity)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        id,
        &bill.items,
    )?;

    load_bill_by_id(conn, id)
}

impl OrderStore for Database {
    fn get_menu_items(&self, user_id: &str) -> Result<Vec<MenuItem>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM menu_items WHERE user_id = ?1 ORDER BY category, name",
            MENU_COLUMNS
        ))?;

        let rows = stmt
            .query_map([user_id], menu_item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let items = rows
            .into_iter()
            .filter(|item| match item.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!(item_id = item.id, "Skipping malformed menu item: {e}");
                    false
                }
            })
            .collect::<Vec<_>>();

        debug!(user_id, count = items.len(), "Loaded menu");
        Ok(items)
    }

    fn get_menu_item(&self, user_id: &str, id: i64) -> Result<Option<MenuItem>> {
        let conn = self.lock()?;

        let item = conn
            .query_row(
                &format!(
                    "SELECT {} FROM menu_items WHERE user_id = ?1 AND id = ?2",
                    MENU_COLUMNS
                ),
                params![user_id, id],
                menu_item_from_row,
            )
            .optional()?;

        if let Some(item) = &item {
            item.validate()?;
        }
        Ok(item)
    }

    fn create_menu_item(&self, user_id: &str, item: &CreateMenuItem) -> Result<MenuItem> {
        item.validate()?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO menu_items (user_id, name, description, price, category, available, preparation_time, ingredients, allergens, photo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user_id,
                item.name,
                item.description,
                item.price,
                item.category,
                item.available.unwrap_or(true),
                item.preparation_time.unwrap_or(0),
                item.ingredients,
                item.allergens,
                item.photo
            ],
        )?;

        let id = conn.last_insert_rowid();

        let created = conn.query_row(
            &format!("SELECT {} FROM menu_items WHERE id = ?1", MENU_COLUMNS),
            [id],
            menu_item_from_row,
        )?;

        info!(user_id, item_id = id, "Created menu item {}", created.name);
        Ok(created)
    }

    fn update_menu_item(&self, user_id: &str, item: &UpdateMenuItem) -> Result<MenuItem> {
        item.validate()?;
        let conn = self.lock()?;

        conn.execute(
            "UPDATE menu_items SET name = ?1, description = ?2, price = ?3, category = ?4, available = ?5,
                 preparation_time = ?6, ingredients = ?7, allergens = ?8, popularity_score = ?9, photo = ?10,
                 last_updated = CURRENT_TIMESTAMP
             WHERE id = ?11 AND user_id = ?12",
            params![
                item.name,
                item.description,
                item.price,
                item.category,
                item.available,
                item.preparation_time,
                item.ingredients,
                item.allergens,
                item.popularity_score,
                item.photo,
                item.id,
                user_id
            ],
        )?;

        if conn.changes() == 0 {
            return Err(AppError::not_found(format!("Menu item {}", item.id)));
        }

        let updated = conn.query_row(
            &format!("SELECT {} FROM menu_items WHERE id = ?1", MENU_COLUMNS),
            [item.id],
            menu_item_from_row,
        )?;

        Ok(updated)
    }

    fn record_item_view(&self, user_id: &str, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE menu_items SET views = views + 1 WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(())
    }

    fn record_item_orders(&self, user_id: &str, items: &[OrderItem]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for item in items {
            tx.execute(
                "UPDATE menu_items SET orders = orders + ?1 WHERE id = ?2 AND user_id = ?3",
                params![item.quantity, item.id, user_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn add_pending_order(&self, order: &NewPendingOrder) -> Result<PendingOrder> {
        order.validate()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO pending_orders (user_id, table_number, total_amount, status, payment_status, payment_method)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                order.user_id,
                order.table_number,
                order.total_amount,
                OrderStatus::PendingApproval,
                PaymentStatus::Pending,
                order.payment_method
            ],
        )?;

        let id = tx.last_insert_rowid();

        insert_lines(
            &tx,
            "INSERT INTO pending_order_items (pending_order_id, menu_item_id, name, price, quantity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            id,
            &order.items,
        )?;

        let created = load_pending_order(&tx, &order.user_id, id)?
            .ok_or_else(|| AppError::not_found(format!("Pending order {}", id)))?;
        tx.commit()?;

        Ok(created)
    }

    fn get_pending_orders(&self, user_id: &str) -> Result<Vec<PendingOrder>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pending_orders WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
            PENDING_COLUMNS
        ))?;

        let orders: Vec<PendingOrder> = stmt
            .query_map([user_id], pending_order_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut result = Vec::new();

        for mut order in orders {
            match load_lines(&conn, PENDING_ITEMS_SQL, order.id) {
                Ok(items) => {
                    order.items = items;
                    result.push(order);
                }
                Err(AppError::Validation(msg)) => {
                    warn!(order_id = order.id, "Skipping malformed pending order: {msg}");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    fn get_pending_order(&self, user_id: &str, id: i64) -> Result<Option<PendingOrder>> {
        let conn = self.lock()?;
        load_pending_order(&conn, user_id, id)
    }

    fn delete_pending_order(&self, user_id: &str, id: i64) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let deleted = delete_pending(&tx, user_id, id)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn approve_pending_order(
        &self,
        user_id: &str,
        order_id: i64,
    ) -> Result<(TableBill, ApprovedOrder)> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let order = load_pending_order(&tx, user_id, order_id)?
            .ok_or_else(|| AppError::not_found(format!("Pending order {}", order_id)))?;

        let mut bill = load_open_bill(&tx, user_id, &order.table_number)?
            .unwrap_or_else(|| TableBill::new(user_id, order.table_number.clone()));
        bill.merge_items(&order.items)?;

        let saved = save_bill(&tx, &bill)?;
        let archived = archive_order(&tx, &order)?;
        delete_pending(&tx, user_id, order_id)?;
        tx.commit()?;

        Ok((saved, archived))
    }

    fn get_table_bill(&self, user_id: &str, table_number: &str) -> Result<Option<TableBill>> {
        let conn = self.lock()?;
        load_open_bill(&conn, user_id, table_number)
    }

    fn get_table_bills(&self, user_id: &str) -> Result<Vec<TableBill>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM table_bills WHERE user_id = ?1 AND status = 'open' ORDER BY table_number",
            BILL_COLUMNS
        ))?;

        let bills: Vec<TableBill> = stmt
            .query_map([user_id], bill_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut result = Vec::new();
        for bill in bills {
            result.push(with_bill_lines(&conn, bill)?);
        }

        Ok(result)
    }

    fn save_table_bill(&self, bill: &TableBill) -> Result<TableBill> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let saved = save_bill(&tx, bill)?;
        tx.commit()?;
        Ok(saved)
    }

    fn mark_table_bill_paid(&self, user_id: &str, table_number: &str) -> Result<bool> {
        let conn = self.lock()?;

        conn.execute(
            "UPDATE table_bills SET status = 'paid', paid_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
             WHERE user_id = ?1 AND table_number = ?2 AND status = 'open'",
            params![user_id, table_number],
        )?;

        Ok(conn.changes() > 0)
    }

    fn record_service_call(
        &self,
        user_id: &str,
        table_number: &str,
        kind: ServiceCallKind,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO service_calls (user_id, table_number, kind) VALUES (?1, ?2, ?3)",
            params![user_id, table_number, kind],
        )?;
        Ok(())
    }

    fn menu_stats(&self, user_id: &str) -> Result<MenuStats> {
        let conn = self.lock()?;

        let total_revenue: f64 = conn.query_row(
            "SELECT COALESCE(SUM(total), 0) FROM table_bills WHERE user_id = ?1 AND status = 'paid'",
            [user_id],
            |row| row.get(0),
        )?;

        let total_orders: i64 = conn.query_row(
            "SELECT COUNT(*) FROM approved_orders WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;

        let total_views: i64 = conn.query_row(
            "SELECT COALESCE(SUM(views), 0) FROM menu_items WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;

        let popular_items = conn
            .prepare(
                "SELECT id, name, orders, views FROM menu_items
                 WHERE user_id = ?1
                 ORDER BY orders DESC, views DESC, name ASC
                 LIMIT 5",
            )?
            .query_map([user_id], |row| {
                Ok(PopularItem {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    orders: row.get(2)?,
                    views: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let recent_ids = conn
            .prepare(
                "SELECT id FROM approved_orders
                 WHERE user_id = ?1
                 ORDER BY approved_at DESC, id DESC
                 LIMIT 5",
            )?
            .query_map([user_id], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut recent_orders = Vec::new();
        for id in recent_ids {
            recent_orders.push(load_approved_order(&conn, id)?);
        }

        let monthly_revenue = conn
            .prepare(
                "SELECT strftime('%Y-%m', paid_at, 'localtime') AS month, SUM(total)
                 FROM table_bills
                 WHERE user_id = ?1 AND status = 'paid'
                 GROUP BY month
                 ORDER BY month ASC",
            )?
            .query_map([user_id], |row| {
                Ok(MonthlyRevenue {
                    month: row.get(0)?,
                    revenue: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(MenuStats {
            total_revenue,
            total_orders,
            total_views,
            popular_items,
            recent_orders,
            monthly_revenue,
        })
    }

    fn daily_summary(&self, user_id: &str, date: &str) -> Result<DailySummary> {
        let conn = self.lock()?;

        // Stored timestamps are UTC; compare in local time
        let (total_orders, total_revenue): (i64, f64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(total_amount), 0) FROM approved_orders
             WHERE user_id = ?1 AND date(approved_at, 'localtime') = ?2",
            params![user_id, date],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let most_ordered_items = conn
            .prepare(
                "SELECT i.name, SUM(i.quantity) AS count
                 FROM approved_order_items i
                 JOIN approved_orders o ON i.approved_order_id = o.id
                 WHERE o.user_id = ?1 AND date(o.approved_at, 'localtime') = ?2
                 GROUP BY i.menu_item_id, i.name
                 ORDER BY count DESC, i.name ASC
                 LIMIT 5",
            )?
            .query_map(params![user_id, date], |row| {
                Ok(ItemCount {
                    name: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let most_active_table: Option<String> = conn
            .query_row(
                "SELECT table_number FROM approved_orders
                 WHERE user_id = ?1 AND date(approved_at, 'localtime') = ?2
                 GROUP BY table_number
                 ORDER BY COUNT(*) DESC, table_number ASC
                 LIMIT 1",
                params![user_id, date],
                |row| row.get(0),
            )
            .optional()?;

        let count_calls = |kind: ServiceCallKind| -> Result<i64> {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM service_calls
                 WHERE user_id = ?1 AND kind = ?2 AND date(created_at, 'localtime') = ?3",
                params![user_id, kind, date],
                |row| row.get(0),
            )?;
            Ok(count)
        };

        Ok(DailySummary {
            date: date.to_string(),
            total_orders,
            total_revenue,
            most_ordered_items,
            most_active_table,
            waiter_calls: count_calls(ServiceCallKind::Waiter)?,
            bill_requests: count_calls(ServiceCallKind::Bill)?,
        })
    }
}
