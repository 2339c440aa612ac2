//! Data models for the CTC Engine.
//!
//! The `models` module defines the serialisable structs and enums that
//! describe salary heads, the input to a calculation and the rows and
//! totals it produces.  These types derive `Serialize` and `Deserialize`
//! so that they can be loaded from catalog files, accepted over HTTP and
//! written to the breakdown store unchanged.

use crate::error::{ConfigurationError, ValidationError};
use crate::money::checked_sum;
use crate::rates::{EsiRule, GratuityRule, PfRule};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// System code that marks the balancing head.
pub const SPECIAL_ALLOWANCE: &str = "SPECIAL_ALLOWANCE";

/// Reserved `percentage_of` tokens meaning "of the overall input amount".
const INPUT_AMOUNT_TOKENS: [&str; 3] = ["CTC", "GROSS", "Amount"];

/// Largest monthly input amount accepted, in whole currency units.
pub const MAX_INPUT_AMOUNT: i64 = 1_000_000_000_000;

/// Whether a head adds to or is withheld from pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Earning,
    Deduction,
}

/// Statutory schemes a head participates in.  Only `pf`, `esi` and
/// `gratuity` influence the calculation; the remaining flags are carried
/// through for the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Applicability {
    pub pf: bool,
    pub esi: bool,
    pub gratuity: bool,
    pub bonus: bool,
    pub pt: bool,
    pub lwf: bool,
    pub leave_encashment: bool,
}

/// A named payroll component configured for a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryHeadDefinition {
    /// Stable identifier of the head.
    pub id: String,
    pub name: String,
    /// Key other heads use to express "percentage of this head".  Expected
    /// to be unique among a company's active heads.
    pub short_name: String,
    pub field_type: FieldType,
    /// Selects between a fixed amount and a percentage rule.
    #[serde(default)]
    pub is_percentage: bool,
    /// The percentage, or the fixed monthly amount.
    #[serde(default)]
    pub value: Option<Decimal>,
    /// `"CTC"`, `"GROSS"`, `"Amount"`, or another head's `short_name`.
    #[serde(default)]
    pub percentage_of: Option<String>,
    #[serde(default)]
    pub applicable_for: Applicability,
    /// [`SPECIAL_ALLOWANCE`] designates the balancing head.
    #[serde(default)]
    pub system_code: Option<String>,
}

/// What a head's value is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valuation<'a> {
    Fixed,
    PercentOfInput,
    PercentOfHead(&'a str),
}

impl SalaryHeadDefinition {
    pub fn is_balancing(&self) -> bool {
        self.system_code.as_deref() == Some(SPECIAL_ALLOWANCE)
    }

    pub fn valuation(&self) -> Valuation<'_> {
        if !self.is_percentage {
            return Valuation::Fixed;
        }
        match self.percentage_of.as_deref() {
            None => Valuation::PercentOfInput,
            Some(token) if INPUT_AMOUNT_TOKENS.contains(&token) => Valuation::PercentOfInput,
            Some(short_name) => Valuation::PercentOfHead(short_name),
        }
    }

    /// The configured value, with an absent value treated as zero.
    pub fn value_or_zero(&self) -> Decimal {
        self.value.unwrap_or(Decimal::ZERO)
    }
}

/// Whether the input amount is a cost-to-company or a gross figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SalaryMode {
    Ctc,
    Gross,
}

impl FromStr for SalaryMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CTC" => Ok(SalaryMode::Ctc),
            "GROSS" => Ok(SalaryMode::Gross),
            other => Err(ValidationError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for SalaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SalaryMode::Ctc => f.write_str("CTC"),
            SalaryMode::Gross => f.write_str("GROSS"),
        }
    }
}

/// Input to the calculation engine.
///
/// `heads` is the company's head catalog (or the part of it relevant to
/// the selection) in definition order.  `selected_head_ids` may be in any
/// order and may contain duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationInput {
    pub mode: SalaryMode,
    pub input_amount: Decimal,
    pub heads: Vec<SalaryHeadDefinition>,
    pub selected_head_ids: Vec<String>,
    #[serde(default)]
    pub pf_rule: Option<PfRule>,
    #[serde(default)]
    pub esi_rule: Option<EsiRule>,
    #[serde(default)]
    pub gratuity_rule: GratuityRule,
}

impl CalculationInput {
    /// Checks performed by callers before the engine is invoked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.input_amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.input_amount));
        }
        let max = Decimal::from(MAX_INPUT_AMOUNT);
        if self.input_amount > max {
            return Err(ValidationError::AmountTooLarge(self.input_amount, max));
        }
        Ok(())
    }
}

/// A calculation as submitted over the wire.  The mode is kept as text
/// so that an unknown mode is reported as a [`ValidationError`] rather
/// than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub mode: String,
    pub input_amount: Decimal,
    pub heads: Vec<SalaryHeadDefinition>,
    pub selected_head_ids: Vec<String>,
    #[serde(default)]
    pub pf_rule: Option<PfRule>,
    #[serde(default)]
    pub esi_rule: Option<EsiRule>,
    #[serde(default)]
    pub gratuity_rule: GratuityRule,
}

impl CalculationRequest {
    /// Parses the mode and validates the resulting input.
    pub fn into_input(self) -> Result<CalculationInput, ValidationError> {
        let input = CalculationInput {
            mode: self.mode.parse()?,
            input_amount: self.input_amount,
            heads: self.heads,
            selected_head_ids: self.selected_head_ids,
            pf_rule: self.pf_rule,
            esi_rule: self.esi_rule,
            gratuity_rule: self.gratuity_rule,
        };
        input.validate()?;
        Ok(input)
    }
}

impl From<CalculationInput> for CalculationRequest {
    fn from(input: CalculationInput) -> Self {
        CalculationRequest {
            mode: input.mode.to_string(),
            input_amount: input.input_amount,
            heads: input.heads,
            selected_head_ids: input.selected_head_ids,
            pf_rule: input.pf_rule,
            esi_rule: input.esi_rule,
            gratuity_rule: input.gratuity_rule,
        }
    }
}

/// One computed line of the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedRow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable description of how `base_amount` was derived.
    pub formula: String,
    pub base_amount: Decimal,
    /// Base amount less the employee share of PF and ESI.
    pub monthly: Decimal,
    pub annual: Decimal,
    pub pf_employee: Decimal,
    pub pf_employer: Decimal,
    pub esi_employee: Decimal,
    pub esi_employer: Decimal,
    pub gratuity_employer: Decimal,
    pub is_special_allowance: bool,
}

/// Sums across every row of a breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationTotals {
    /// Sum of `base_amount`.
    pub total_gross: Decimal,
    pub total_monthly: Decimal,
    pub total_annual: Decimal,
    pub total_pf_employee: Decimal,
    pub total_pf_employer: Decimal,
    pub total_esi_employee: Decimal,
    pub total_esi_employer: Decimal,
    pub total_gratuity_employer: Decimal,
    pub net_in_hand: Decimal,
    /// Gross plus every employer-side contribution.
    pub ctc: Decimal,
}

/// A degradation the engine absorbed instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculationWarning {
    /// The selected heads already exceed the input amount.
    NegativeBalance { head_id: String, amount: Decimal },
    /// A percentage-of-head rule was applied to the input amount because
    /// the referenced head had no computed amount.
    ReferenceFallback { head_id: String, reference: String },
    DependencyCycle { head_ids: Vec<String> },
    DuplicateBalancingHead { head_id: String },
}

/// Output of the calculation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Rows in evaluation order, balancing head last.
    pub rows: Vec<CalculatedRow>,
    pub totals: CalculationTotals,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CalculationWarning>,
}

/// A calculation request for a single employee within a payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSalaryInput {
    pub employee_id: String,
    #[serde(flatten)]
    pub request: CalculationRequest,
}

/// What happened to one employee in a payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BreakdownOutcome {
    Computed { result: CalculationResult },
    Rejected { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeBreakdown {
    pub employee_id: String,
    #[serde(flatten)]
    pub outcome: BreakdownOutcome,
}

/// Point-in-time record of how an employee's salary was configured,
/// stored next to the breakdown rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryConfig {
    pub salary_mode: SalaryMode,
    pub input_amount: Decimal,
    /// Monthly take-home plus the employee PF and ESI shares.
    pub gross_salary: Decimal,
    pub net_salary: Decimal,
    pub annual_ctc: Decimal,
    pub pf_rule: Option<PfRule>,
    pub esi_rule: Option<EsiRule>,
    pub gratuity_rule: GratuityRule,
}

impl SalaryConfig {
    pub fn snapshot(
        input: &CalculationInput,
        result: &CalculationResult,
    ) -> Result<Self, ConfigurationError> {
        let totals = &result.totals;
        let gross_salary = checked_sum([
            totals.total_monthly,
            totals.total_pf_employee,
            totals.total_esi_employee,
        ])
        .ok_or_else(|| ConfigurationError::overflow("gross salary"))?;
        let annual_ctc = totals
            .ctc
            .checked_mul(Decimal::from(12))
            .ok_or_else(|| ConfigurationError::overflow("annual CTC"))?;
        Ok(SalaryConfig {
            salary_mode: input.mode,
            input_amount: input.input_amount,
            gross_salary,
            net_salary: totals.net_in_hand,
            annual_ctc,
            pf_rule: input.pf_rule.clone(),
            esi_rule: input.esi_rule.clone(),
            gratuity_rule: input.gratuity_rule.clone(),
        })
    }
}
