// ==========================================
// PrintFlow APS - Material availability view
// ==========================================
// Normalized color -> available grams. The color
// inventory table is authoritative; loose spools
// contribute only for colors the table does not
// cover. Spool counts drive the per-color printer
// concurrency cap.
// ==========================================

use crate::domain::spool::{ColorInventoryItem, Spool};
use crate::domain::types::SpoolState;
use crate::engine::colors::normalize_color;
use std::collections::{HashMap, HashSet};

// ==========================================
// MaterialView
// ==========================================
#[derive(Debug, Clone)]
pub struct MaterialView {
    grams_by_color: HashMap<String, f64>,
    spool_count_by_color: HashMap<String, i64>,
    spools: Vec<Spool>,
}

impl MaterialView {
    pub fn build(inventory: &[ColorInventoryItem], spools: &[Spool]) -> Self {
        let mut grams_by_color: HashMap<String, f64> = HashMap::new();
        let mut inventory_colors: HashSet<String> = HashSet::new();

        for item in inventory {
            let color = normalize_color(&item.color);
            inventory_colors.insert(color.clone());
            *grams_by_color.entry(color).or_insert(0.0) += item.total_grams();
        }

        // Spools fill in colors that the inventory table does not track.
        for spool in spools {
            if spool.state == SpoolState::Empty {
                continue;
            }
            let color = normalize_color(&spool.color);
            if !inventory_colors.contains(&color) {
                *grams_by_color.entry(color).or_insert(0.0) += spool.estimated_grams_remaining;
            }
        }

        let mut spool_count_by_color: HashMap<String, i64> = HashMap::new();
        for spool in spools {
            if spool.state == SpoolState::Empty {
                continue;
            }
            *spool_count_by_color
                .entry(normalize_color(&spool.color))
                .or_insert(0) += 1;
        }

        Self {
            grams_by_color,
            spool_count_by_color,
            spools: spools.to_vec(),
        }
    }

    pub fn available_grams(&self, color: &str) -> f64 {
        self.grams_by_color
            .get(&normalize_color(color))
            .copied()
            .unwrap_or(0.0)
    }

    /// Physical spools of a color, regardless of inventory bookkeeping.
    pub fn physical_spool_count(&self, color: &str) -> i64 {
        self.spool_count_by_color
            .get(&normalize_color(color))
            .copied()
            .unwrap_or(0)
    }

    /// Up to `limit` available spools of the color that each hold at
    /// least `required_grams`.
    pub fn suggest_spools(&self, color: &str, required_grams: f64, limit: usize) -> Vec<String> {
        let wanted = normalize_color(color);
        self.spools
            .iter()
            .filter(|s| {
                s.state == SpoolState::Available
                    && normalize_color(&s.color) == wanted
                    && s.estimated_grams_remaining >= required_grams
            })
            .take(limit)
            .map(|s| s.spool_id.clone())
            .collect()
    }
}
