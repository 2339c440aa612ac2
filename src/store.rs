//! In-memory storage for company catalogs and computed breakdowns.

use crate::models::{
    CalculatedRow, CalculationTotals, SalaryConfig, SalaryHeadDefinition, Valuation,
};
use crate::rates::{CompanyCatalog, EsiRule, PfRule};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// The persisted outcome of a salary calculation for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBreakdown {
    pub company_id: String,
    pub employee_id: String,
    pub rows: Vec<CalculatedRow>,
    pub totals: CalculationTotals,
    pub config: SalaryConfig,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    catalogs: RwLock<HashMap<String, CompanyCatalog>>,
    breakdowns: RwLock<HashMap<(String, String), StoredBreakdown>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a company's catalog.
    pub async fn insert_catalog(&self, catalog: CompanyCatalog) {
        self.catalogs
            .write()
            .await
            .insert(catalog.company_id.clone(), catalog);
    }

    /// The company's head definitions for `ids`, plus any head the
    /// selected percentage heads refer to by short name, in definition
    /// order.
    pub async fn heads_for_selection(
        &self,
        company_id: &str,
        ids: &[String],
    ) -> Vec<SalaryHeadDefinition> {
        let catalogs = self.catalogs.read().await;
        let Some(catalog) = catalogs.get(company_id) else {
            return Vec::new();
        };
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let referenced: HashSet<&str> = catalog
            .heads
            .iter()
            .filter(|head| ids.contains(head.id.as_str()))
            .filter_map(|head| match head.valuation() {
                Valuation::PercentOfHead(short_name) => Some(short_name),
                _ => None,
            })
            .collect();
        catalog
            .heads
            .iter()
            .filter(|head| {
                ids.contains(head.id.as_str()) || referenced.contains(head.short_name.as_str())
            })
            .cloned()
            .collect()
    }

    pub async fn latest_pf_rule(&self, company_id: &str, as_of: NaiveDate) -> Option<PfRule> {
        let catalogs = self.catalogs.read().await;
        catalogs
            .get(company_id)
            .and_then(|catalog| catalog.latest_pf_rule(as_of))
            .cloned()
    }

    pub async fn latest_esi_rule(&self, company_id: &str, as_of: NaiveDate) -> Option<EsiRule> {
        let catalogs = self.catalogs.read().await;
        catalogs
            .get(company_id)
            .and_then(|catalog| catalog.latest_esi_rule(as_of))
            .cloned()
    }

    /// Replaces an employee's previous breakdown, rows and config
    /// together, returning the one it replaced.
    pub async fn replace_breakdown(&self, breakdown: StoredBreakdown) -> Option<StoredBreakdown> {
        let key = (breakdown.company_id.clone(), breakdown.employee_id.clone());
        self.breakdowns.write().await.insert(key, breakdown)
    }

    pub async fn breakdown(&self, company_id: &str, employee_id: &str) -> Option<StoredBreakdown> {
        self.breakdowns
            .read()
            .await
            .get(&(company_id.to_string(), employee_id.to_string()))
            .cloned()
    }
}
