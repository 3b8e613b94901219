// ==========================================
// PrintFlow APS - Product & preset repository
// ==========================================
// Products are loaded with their preset lists in
// one shot; the planner never wants one without
// the other.
// ==========================================

use crate::domain::product::{PlatePreset, Product};
use crate::domain::types::RiskLevel;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ProductRepository
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_preset(row: &Row<'_>) -> rusqlite::Result<PlatePreset> {
        Ok(PlatePreset {
            preset_id: row.get(0)?,
            product_id: row.get(1)?,
            name: row.get(2)?,
            units_per_plate: row.get(3)?,
            cycle_hours: row.get(4)?,
            risk_level: RiskLevel::from_db_str(&row.get::<_, String>(5)?),
            allowed_for_night_cycle: row.get::<_, i64>(6)? != 0,
            recommended: row.get::<_, i64>(7)? != 0,
            sort_order: row.get(8)?,
        })
    }

    pub fn upsert(&self, product: &Product) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"INSERT INTO products (product_id, name, grams_per_unit)
               VALUES (?, ?, ?)
               ON CONFLICT(product_id) DO UPDATE SET
                   name = excluded.name,
                   grams_per_unit = excluded.grams_per_unit"#,
            params![&product.product_id, &product.name, product.grams_per_unit],
        )?;

        // Preset list is replaced wholesale; order is the list order.
        tx.execute(
            "DELETE FROM plate_presets WHERE product_id = ?",
            params![&product.product_id],
        )?;
        for (i, preset) in product.presets.iter().enumerate() {
            tx.execute(
                r#"INSERT INTO plate_presets (
                    preset_id, product_id, name, units_per_plate, cycle_hours,
                    risk_level, allowed_for_night_cycle, recommended, sort_order
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &preset.preset_id,
                    &product.product_id,
                    &preset.name,
                    preset.units_per_plate,
                    preset.cycle_hours,
                    preset.risk_level.to_db_str(),
                    preset.allowed_for_night_cycle as i64,
                    preset.recommended as i64,
                    i as i32,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    pub fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|p| p.product_id == product_id))
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT preset_id, product_id, name, units_per_plate, cycle_hours,
                      risk_level, allowed_for_night_cycle, recommended, sort_order
               FROM plate_presets
               ORDER BY product_id, sort_order"#,
        )?;
        let presets = stmt
            .query_map([], Self::map_preset)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_product: HashMap<String, Vec<PlatePreset>> = HashMap::new();
        for preset in presets {
            by_product
                .entry(preset.product_id.clone())
                .or_default()
                .push(preset);
        }

        let mut stmt = conn.prepare(
            "SELECT product_id, name, grams_per_unit FROM products ORDER BY product_id",
        )?;
        let products = stmt
            .query_map([], |row| {
                Ok(Product {
                    product_id: row.get(0)?,
                    name: row.get(1)?,
                    grams_per_unit: row.get(2)?,
                    presets: vec![],
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products
            .into_iter()
            .map(|mut p| {
                p.presets = by_product.remove(&p.product_id).unwrap_or_default();
                p
            })
            .collect())
    }
}
