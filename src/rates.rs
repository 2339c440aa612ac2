//! Statutory contribution rules and company catalogs.
//!
//! The `rates` module defines the Provident Fund, Employee State
//! Insurance and Gratuity rules, the `Contribution` trait each of them
//! implements, and helpers for loading a company's head catalog and
//! versioned rate records from JSON files.

use crate::models::SalaryHeadDefinition;
use crate::money::{checked_sum, percent_of, round_money};
use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

fn active_by_default() -> bool {
    true
}

/// Employee and employer portions of a statutory contribution, rounded
/// to money scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Share {
    pub employee: Decimal,
    pub employer: Decimal,
}

/// A statutory scheme that takes a share of a head's base amount.
///
/// Rules are plain data and safe to share between threads, since a
/// payroll run evaluates many employees against the same rules.
pub trait Contribution: Send + Sync {
    /// Inactive rules contribute nothing.
    fn is_active(&self) -> bool;
    /// Computes the contribution on `base`, or `None` if it overflows.
    fn share(&self, base: Decimal) -> Option<Share>;
}

/// Provident Fund parameters.  All shares are percentages; an absent
/// `pf_wage_ceiling` means PF is levied on the whole base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfRule {
    #[serde(default)]
    pub emp_share_ac1: Decimal,
    #[serde(default)]
    pub er_share_ac2: Decimal,
    #[serde(default)]
    pub eps_ac21: Decimal,
    #[serde(default)]
    pub edli_charges_ac21: Decimal,
    #[serde(default)]
    pub admin_charges_ac10: Decimal,
    #[serde(default)]
    pub pf_wage_ceiling: Option<Decimal>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

impl PfRule {
    /// Sum of the four employer-side components.
    pub fn employer_rate(&self) -> Option<Decimal> {
        checked_sum([
            self.er_share_ac2,
            self.eps_ac21,
            self.edli_charges_ac21,
            self.admin_charges_ac10,
        ])
    }

    /// The portion of `base` PF is levied on.
    pub fn wage_base(&self, base: Decimal) -> Decimal {
        match self.pf_wage_ceiling {
            Some(ceiling) => base.min(ceiling),
            None => base,
        }
    }
}

impl Contribution for PfRule {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn share(&self, base: Decimal) -> Option<Share> {
        let pf_base = self.wage_base(base);
        Some(Share {
            employee: round_money(percent_of(pf_base, self.emp_share_ac1)?),
            employer: round_money(percent_of(pf_base, self.employer_rate()?)?),
        })
    }
}

/// Employee State Insurance parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiRule {
    #[serde(default)]
    pub emp_share: Decimal,
    #[serde(default)]
    pub employer_share: Decimal,
    #[serde(default)]
    pub esi_wage_ceiling: Option<Decimal>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

impl EsiRule {
    /// Whether a wage of `amount` is within the ESI ceiling.
    pub fn covers(&self, amount: Decimal) -> bool {
        self.esi_wage_ceiling.map_or(true, |ceiling| amount <= ceiling)
    }
}

impl Contribution for EsiRule {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn share(&self, base: Decimal) -> Option<Share> {
        Some(Share {
            employee: round_money(percent_of(base, self.emp_share)?),
            employer: round_money(percent_of(base, self.employer_share)?),
        })
    }
}

/// Gratuity accrual: `days_per_year` days of wages for every
/// `working_days` worked, spread over twelve months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GratuityRule {
    pub days_per_year: Decimal,
    pub working_days: Decimal,
}

impl Default for GratuityRule {
    fn default() -> Self {
        GratuityRule {
            days_per_year: dec!(15),
            working_days: dec!(26),
        }
    }
}

impl Contribution for GratuityRule {
    fn is_active(&self) -> bool {
        !self.working_days.is_zero()
    }

    fn share(&self, base: Decimal) -> Option<Share> {
        let accrual = base
            .checked_mul(self.days_per_year)?
            .checked_div(self.working_days)?
            .checked_div(dec!(12))?;
        Some(Share {
            employee: Decimal::ZERO,
            employer: round_money(accrual),
        })
    }
}

/// Computes `rule`'s share of `base` when the head is subject to it and an
/// active rule exists; otherwise nothing is contributed.  `None` only
/// when the contribution overflows.
pub fn statutory_share<C: Contribution>(
    rule: Option<&C>,
    applicable: bool,
    base: Decimal,
) -> Option<Share> {
    match rule {
        Some(rule) if applicable && rule.is_active() => rule.share(base),
        _ => Some(Share::default()),
    }
}

/// A rate rule of either type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rate_type", rename_all = "UPPERCASE")]
pub enum RateRule {
    Pf(PfRule),
    Esi(EsiRule),
}

/// A rate rule together with the date it takes effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub effective_from: NaiveDate,
    pub rule: RateRule,
}

/// Everything the engine needs to know about one company: its heads in
/// definition order and its rate history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyCatalog {
    pub company_id: String,
    pub heads: Vec<SalaryHeadDefinition>,
    #[serde(default)]
    pub rates: Vec<RateRecord>,
}

impl CompanyCatalog {
    /// The most recent active PF rule in effect on `as_of`.
    pub fn latest_pf_rule(&self, as_of: NaiveDate) -> Option<&PfRule> {
        self.latest(as_of, |rule| match rule {
            RateRule::Pf(pf) if pf.is_active => Some(pf),
            _ => None,
        })
    }

    /// The most recent active ESI rule in effect on `as_of`.
    pub fn latest_esi_rule(&self, as_of: NaiveDate) -> Option<&EsiRule> {
        self.latest(as_of, |rule| match rule {
            RateRule::Esi(esi) if esi.is_active => Some(esi),
            _ => None,
        })
    }

    fn latest<'a, T>(
        &'a self,
        as_of: NaiveDate,
        pick: impl Fn(&'a RateRule) -> Option<&'a T>,
    ) -> Option<&'a T> {
        self.rates
            .iter()
            .filter(|record| record.effective_from <= as_of)
            .filter_map(|record| pick(&record.rule).map(|rule| (record.effective_from, rule)))
            .max_by_key(|(effective_from, _)| *effective_from)
            .map(|(_, rule)| rule)
    }
}

/// Load all company catalogs from a directory.
///
/// Every `.json` file in `path` is parsed as a [`CompanyCatalog`].  Files
/// that fail to parse are logged and skipped.  A missing directory
/// yields no catalogs.
pub fn load_catalogs_from_dir(path: &std::path::Path) -> Result<Vec<CompanyCatalog>> {
    let mut catalogs = Vec::new();
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(ext) = entry.path().extension() {
                    if ext == "json" {
                        let data = std::fs::read_to_string(entry.path())?;
                        match serde_json::from_str::<CompanyCatalog>(&data) {
                            Ok(catalog) => catalogs.push(catalog),
                            Err(err) => {
                                tracing::warn!(path = ?entry.path(), %err, "failed to parse company catalog");
                            }
                        }
                    }
                }
            }
        }
    } else {
        tracing::warn!(path = ?path, "catalog directory not found");
    }
    Ok(catalogs)
}
