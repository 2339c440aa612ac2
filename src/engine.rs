//! Salary decomposition engine.
//!
//! The `engine` module turns a [`CalculationInput`] into a
//! [`CalculationResult`].  A calculation runs in three passes over the
//! resolved heads:
//!
//! 1. every regular head gets its base amount, PF and Gratuity, in
//!    evaluation order, followed by the balancing head which absorbs the
//!    remainder of the input amount;
//! 2. the total gross is known, so ESI eligibility is decided once and
//!    ESI shares are computed for the rows subject to it;
//! 3. the rows are summed into [`CalculationTotals`].
//!
//! [`run_payroll`] uses [`rayon`] to compute many employees' breakdowns in
//! parallel.  Calculations share no state, so each employee succeeds or
//! fails on its own.

use crate::error::ConfigurationError;
use crate::models::{
    BreakdownOutcome, CalculatedRow, CalculationInput, CalculationResult, CalculationTotals,
    CalculationWarning, EmployeeBreakdown, EmployeeSalaryInput, SalaryHeadDefinition, Valuation,
};
use crate::money::{checked_sum, percent_of, round_money};
use crate::rates::{statutory_share, Contribution};
use crate::resolver::resolve_heads;
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Calculates the salary breakdown for a single input.
///
/// Fails when a non-empty selection matches none of the supplied head
/// definitions, or when the configured values push an amount outside the
/// decimal range.  Every other irregularity is absorbed into the result
/// and reported through [`CalculationResult::warnings`].
pub fn calculate(input: &CalculationInput) -> Result<CalculationResult, ConfigurationError> {
    // Resolve the selection into ordered regular heads plus the balancing head.
    let resolved = resolve_heads(&input.heads, &input.selected_head_ids);
    if resolved.is_empty() && !input.selected_head_ids.is_empty() {
        return Err(ConfigurationError::NoHeadsResolved {
            requested: input.selected_head_ids.len(),
        });
    }
    let mut warnings = resolved.warnings;
    let amount = input.input_amount;

    // Base amounts by head id, and the id each short name resolves to.
    let mut computed: HashMap<&str, Decimal> = HashMap::new();
    let mut short_names: HashMap<&str, &str> = HashMap::new();
    for head in &resolved.regular {
        short_names
            .entry(head.short_name.as_str())
            .or_insert(head.id.as_str());
    }

    // Value the regular heads in evaluation order.
    let mut rows = Vec::with_capacity(resolved.regular.len() + 1);
    let mut esi_applicable = Vec::with_capacity(resolved.regular.len() + 1);
    let mut total_allocated = Decimal::ZERO;
    for head in &resolved.regular {
        let (base, formula) = match head.valuation() {
            Valuation::Fixed => (
                Some(head.value_or_zero()),
                format!("Fixed {}", head.value_or_zero()),
            ),
            Valuation::PercentOfInput => (
                percent_of(amount, head.value_or_zero()),
                format!("{}% of {}", head.value_or_zero(), input.mode),
            ),
            Valuation::PercentOfHead(reference) => {
                let referenced = short_names
                    .get(reference)
                    .and_then(|id| computed.get(id))
                    .copied();
                match referenced {
                    Some(referenced) => (
                        percent_of(referenced, head.value_or_zero()),
                        format!("{}% of {}", head.value_or_zero(), reference),
                    ),
                    None => {
                        tracing::warn!(
                            head_id = %head.id,
                            reference,
                            "referenced head not computed, applying percentage to input amount"
                        );
                        warnings.push(CalculationWarning::ReferenceFallback {
                            head_id: head.id.clone(),
                            reference: reference.to_string(),
                        });
                        (
                            percent_of(amount, head.value_or_zero()),
                            format!(
                                "{}% of {} ({} unavailable)",
                                head.value_or_zero(),
                                input.mode,
                                reference
                            ),
                        )
                    }
                }
            }
        };
        let base = round_money(base.ok_or_else(|| overflow("base amount", &head.id))?);
        computed.insert(head.id.as_str(), base);
        total_allocated = total_allocated
            .checked_add(base)
            .ok_or_else(|| overflow("allocated total", &head.id))?;
        rows.push(allocate(input, head, base, formula, false)?);
        esi_applicable.push(head.applicable_for.esi);
    }

    // The balancing head takes whatever is left, negative or not.
    if let Some(head) = resolved.balancing {
        let balance = amount
            .checked_sub(total_allocated)
            .ok_or_else(|| overflow("balance", &head.id))?;
        if balance < Decimal::ZERO {
            tracing::warn!(head_id = %head.id, %balance, "selected heads exceed the input amount");
            warnings.push(CalculationWarning::NegativeBalance {
                head_id: head.id.clone(),
                amount: balance,
            });
        }
        computed.insert(head.id.as_str(), balance);
        let formula = format!("{} - {} allocated", input.mode, total_allocated);
        rows.push(allocate(input, head, balance, formula, true)?);
        esi_applicable.push(head.applicable_for.esi);
    }

    // ESI needs the total gross, so it runs once every base is known.
    apply_esi(input, &mut rows, &esi_applicable)?;

    // Take-home per row, then the totals.
    for row in &mut rows {
        row.monthly = row
            .base_amount
            .checked_sub(row.pf_employee)
            .and_then(|monthly| monthly.checked_sub(row.esi_employee))
            .ok_or_else(|| overflow("monthly amount", &row.id))?;
        row.annual = row
            .monthly
            .checked_mul(Decimal::from(12))
            .ok_or_else(|| overflow("annual amount", &row.id))?;
    }
    let totals = aggregate(&rows)?;
    tracing::debug!(
        rows = rows.len(),
        ctc = %totals.ctc,
        net_in_hand = %totals.net_in_hand,
        "salary breakdown calculated"
    );
    Ok(CalculationResult {
        rows,
        totals,
        warnings,
    })
}

fn overflow(what: &str, head_id: &str) -> ConfigurationError {
    ConfigurationError::overflow(format!("{what} of head {head_id}"))
}

/// Builds a row with its base amount and the contributions that do not
/// depend on the other rows.
fn allocate(
    input: &CalculationInput,
    head: &SalaryHeadDefinition,
    base: Decimal,
    formula: String,
    is_special_allowance: bool,
) -> Result<CalculatedRow, ConfigurationError> {
    let pf = statutory_share(input.pf_rule.as_ref(), head.applicable_for.pf, base)
        .ok_or_else(|| overflow("PF", &head.id))?;
    let gratuity = statutory_share(Some(&input.gratuity_rule), head.applicable_for.gratuity, base)
        .ok_or_else(|| overflow("gratuity", &head.id))?;
    Ok(CalculatedRow {
        id: head.id.clone(),
        name: head.name.clone(),
        field_type: head.field_type,
        formula,
        base_amount: base,
        monthly: Decimal::ZERO,
        annual: Decimal::ZERO,
        pf_employee: pf.employee,
        pf_employer: pf.employer,
        esi_employee: Decimal::ZERO,
        esi_employer: Decimal::ZERO,
        gratuity_employer: gratuity.employer,
        is_special_allowance,
    })
}

/// Fills in ESI shares once the total gross is known.
///
/// ESI applies only when both the input amount and the computed gross
/// are within the wage ceiling; otherwise no row carries ESI.
fn apply_esi(
    input: &CalculationInput,
    rows: &mut [CalculatedRow],
    applicable: &[bool],
) -> Result<(), ConfigurationError> {
    let Some(rule) = input.esi_rule.as_ref().filter(|rule| rule.is_active()) else {
        return Ok(());
    };
    let total_gross = checked_sum(rows.iter().map(|row| row.base_amount))
        .ok_or_else(|| ConfigurationError::overflow("total gross"))?;
    if !rule.covers(input.input_amount) || !rule.covers(total_gross) {
        tracing::debug!(%total_gross, "gross above ESI wage ceiling, ESI not applied");
        return Ok(());
    }
    for (row, &esi) in rows.iter_mut().zip(applicable) {
        if !esi {
            continue;
        }
        let share = rule
            .share(row.base_amount)
            .ok_or_else(|| overflow("ESI", &row.id))?;
        row.esi_employee = share.employee;
        row.esi_employer = share.employer;
    }
    Ok(())
}

/// Sums the rows into totals.
pub fn aggregate(rows: &[CalculatedRow]) -> Result<CalculationTotals, ConfigurationError> {
    let column = |name: &str, field: fn(&CalculatedRow) -> Decimal| {
        checked_sum(rows.iter().map(field)).ok_or_else(|| ConfigurationError::overflow(name))
    };
    let mut totals = CalculationTotals {
        total_gross: column("total gross", |row| row.base_amount)?,
        total_monthly: column("total monthly", |row| row.monthly)?,
        total_annual: column("total annual", |row| row.annual)?,
        total_pf_employee: column("total employee PF", |row| row.pf_employee)?,
        total_pf_employer: column("total employer PF", |row| row.pf_employer)?,
        total_esi_employee: column("total employee ESI", |row| row.esi_employee)?,
        total_esi_employer: column("total employer ESI", |row| row.esi_employer)?,
        total_gratuity_employer: column("total gratuity", |row| row.gratuity_employer)?,
        ..CalculationTotals::default()
    };
    totals.net_in_hand = totals.total_monthly;
    totals.ctc = checked_sum([
        totals.total_gross,
        totals.total_pf_employer,
        totals.total_esi_employer,
        totals.total_gratuity_employer,
    ])
    .ok_or_else(|| ConfigurationError::overflow("CTC"))?;
    Ok(totals)
}

/// Runs the calculation for every employee in a payroll run.
///
/// Inputs are parsed, validated and calculated independently in
/// parallel; a rejected employee does not affect the others.  Results
/// keep the order of `batch`.
pub fn run_payroll(batch: Vec<EmployeeSalaryInput>) -> Vec<EmployeeBreakdown> {
    batch
        .into_par_iter()
        .map(|EmployeeSalaryInput { employee_id, request }| {
            let outcome = match request
                .into_input()
                .map_err(|err| err.to_string())
                .and_then(|input| calculate(&input).map_err(|err| err.to_string()))
            {
                Ok(result) => BreakdownOutcome::Computed { result },
                Err(error) => {
                    tracing::warn!(%employee_id, %error, "employee rejected from payroll run");
                    BreakdownOutcome::Rejected { error }
                }
            };
            EmployeeBreakdown {
                employee_id,
                outcome,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Applicability, FieldType, SalaryMode, SPECIAL_ALLOWANCE};
    use crate::rates::{EsiRule, GratuityRule, PfRule};
    use rust_decimal_macros::dec;

    fn fixed(id: &str, value: Decimal) -> SalaryHeadDefinition {
        SalaryHeadDefinition {
            id: id.into(),
            name: id.to_uppercase(),
            short_name: id.to_uppercase(),
            field_type: FieldType::Earning,
            is_percentage: false,
            value: Some(value),
            percentage_of: None,
            applicable_for: Applicability::default(),
            system_code: None,
        }
    }

    fn percent(id: &str, value: Decimal, of: &str) -> SalaryHeadDefinition {
        SalaryHeadDefinition {
            is_percentage: true,
            percentage_of: Some(of.into()),
            ..fixed(id, value)
        }
    }

    fn special_allowance(id: &str) -> SalaryHeadDefinition {
        SalaryHeadDefinition {
            name: "Special Allowance".into(),
            value: None,
            system_code: Some(SPECIAL_ALLOWANCE.into()),
            ..fixed(id, Decimal::ZERO)
        }
    }

    fn with_flags(mut head: SalaryHeadDefinition, pf: bool, esi: bool, gratuity: bool) -> SalaryHeadDefinition {
        head.applicable_for.pf = pf;
        head.applicable_for.esi = esi;
        head.applicable_for.gratuity = gratuity;
        head
    }

    fn pf_rule() -> PfRule {
        PfRule {
            emp_share_ac1: dec!(12),
            er_share_ac2: dec!(3.67),
            eps_ac21: dec!(8.33),
            edli_charges_ac21: dec!(0.5),
            admin_charges_ac10: dec!(0.5),
            pf_wage_ceiling: Some(dec!(15000)),
            is_active: true,
        }
    }

    fn esi_rule() -> EsiRule {
        EsiRule {
            emp_share: dec!(0.75),
            employer_share: dec!(3.25),
            esi_wage_ceiling: Some(dec!(21000)),
            is_active: true,
        }
    }

    fn input(amount: Decimal, heads: Vec<SalaryHeadDefinition>, selected: &[&str]) -> CalculationInput {
        CalculationInput {
            mode: SalaryMode::Ctc,
            input_amount: amount,
            heads,
            selected_head_ids: selected.iter().map(|s| s.to_string()).collect(),
            pf_rule: None,
            esi_rule: None,
            gratuity_rule: GratuityRule::default(),
        }
    }

    fn row<'a>(result: &'a CalculationResult, id: &str) -> &'a CalculatedRow {
        result.rows.iter().find(|r| r.id == id).unwrap()
    }

    fn payroll_heads() -> Vec<SalaryHeadDefinition> {
        vec![
            with_flags(fixed("basic", dec!(20000)), true, false, false),
            percent("hra", dec!(50), "BASIC"),
            with_flags(special_allowance("sa"), true, false, false),
        ]
    }

    #[test]
    fn end_to_end_ctc_breakdown() {
        let mut input = input(dec!(50000), payroll_heads(), &["basic", "hra", "sa"]);
        input.pf_rule = Some(pf_rule());
        let result = calculate(&input).unwrap();

        let ids: Vec<&str> = result.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["basic", "hra", "sa"]);

        let basic = row(&result, "basic");
        assert_eq!(basic.base_amount, dec!(20000));
        assert_eq!(basic.pf_employee, dec!(1800));
        assert_eq!(basic.pf_employer, dec!(1950));
        assert_eq!(basic.monthly, dec!(18200));
        assert_eq!(basic.annual, dec!(218400));

        let hra = row(&result, "hra");
        assert_eq!(hra.base_amount, dec!(10000));
        assert_eq!(hra.pf_employee, Decimal::ZERO);

        let sa = row(&result, "sa");
        assert!(sa.is_special_allowance);
        assert_eq!(sa.base_amount, dec!(20000));
        assert_eq!(sa.pf_employee, dec!(1800));
        assert_eq!(sa.pf_employer, dec!(1950));

        let totals = &result.totals;
        assert_eq!(totals.total_gross, dec!(50000));
        assert_eq!(totals.total_pf_employee, dec!(3600));
        assert_eq!(totals.total_pf_employer, dec!(3900));
        assert_eq!(totals.net_in_hand, dec!(46400));
        assert_eq!(totals.total_annual, dec!(556800));
        assert_eq!(totals.ctc, dec!(53900));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn balancing_head_conserves_input_amount() {
        let heads = vec![
            percent("basic", dec!(33.33), "CTC"),
            percent("hra", dec!(17.77), "BASIC"),
            fixed("conv", dec!(1600)),
            special_allowance("sa"),
        ];
        let result = calculate(&input(dec!(47123.45), heads, &["sa", "conv", "hra", "basic"])).unwrap();
        assert_eq!(result.totals.total_gross, dec!(47123.45));
    }

    #[test]
    fn selection_order_does_not_matter() {
        let mut a = input(dec!(50000), payroll_heads(), &["sa", "hra", "basic"]);
        a.pf_rule = Some(pf_rule());
        let mut b = a.clone();
        b.selected_head_ids = vec!["basic".into(), "sa".into(), "hra".into(), "hra".into()];
        assert_eq!(calculate(&a).unwrap(), calculate(&b).unwrap());
    }

    #[test]
    fn fixed_and_percentage_heads() {
        let heads = vec![fixed("fixed", dec!(5000)), percent("basic", dec!(40), "CTC")];
        for amount in [dec!(50000), dec!(90000)] {
            let result = calculate(&input(amount, heads.clone(), &["fixed", "basic"])).unwrap();
            assert_eq!(row(&result, "fixed").base_amount, dec!(5000));
        }
        let result = calculate(&input(dec!(50000), heads, &["basic"])).unwrap();
        assert_eq!(row(&result, "basic").base_amount, dec!(20000));
    }

    #[test]
    fn percentage_of_another_head() {
        let heads = vec![fixed("a", dec!(10000)), percent("b", dec!(50), "A")];
        let result = calculate(&input(dec!(50000), heads, &["a", "b"])).unwrap();
        assert_eq!(row(&result, "b").base_amount, dec!(5000));
        assert_eq!(row(&result, "b").formula, "50% of A");
    }

    #[test]
    fn reference_defined_later_is_still_resolved() {
        let heads = vec![percent("b", dec!(50), "A"), fixed("a", dec!(10000))];
        let result = calculate(&input(dec!(50000), heads, &["a", "b"])).unwrap();
        assert_eq!(row(&result, "b").base_amount, dec!(5000));
        assert_eq!(result.rows[0].id, "a");
    }

    #[test]
    fn missing_reference_falls_back_to_input_amount() {
        let heads = vec![fixed("a", dec!(10000)), percent("b", dec!(10), "A")];
        let result = calculate(&input(dec!(50000), heads, &["b"])).unwrap();
        assert_eq!(row(&result, "b").base_amount, dec!(5000));
        assert_eq!(
            result.warnings,
            vec![CalculationWarning::ReferenceFallback {
                head_id: "b".into(),
                reference: "A".into()
            }]
        );
    }

    #[test]
    fn missing_value_counts_as_zero() {
        let mut head = fixed("a", Decimal::ZERO);
        head.value = None;
        let result = calculate(&input(dec!(50000), vec![head], &["a"])).unwrap();
        assert_eq!(row(&result, "a").base_amount, Decimal::ZERO);
    }

    #[test]
    fn pf_respects_wage_ceiling() {
        let heads = vec![with_flags(fixed("basic", dec!(20000)), true, false, false)];
        let mut input = input(dec!(20000), heads, &["basic"]);
        input.pf_rule = Some(pf_rule());
        let result = calculate(&input).unwrap();
        assert_eq!(row(&result, "basic").pf_employee, dec!(1800));
    }

    #[test]
    fn absent_pf_rule_contributes_nothing() {
        let heads = vec![with_flags(fixed("basic", dec!(20000)), true, false, false)];
        let result = calculate(&input(dec!(20000), heads, &["basic"])).unwrap();
        let basic = row(&result, "basic");
        assert_eq!(basic.pf_employee, Decimal::ZERO);
        assert_eq!(basic.pf_employer, Decimal::ZERO);
        assert_eq!(basic.monthly, dec!(20000));
    }

    #[test]
    fn gratuity_accrues_on_base_amount() {
        let heads = vec![with_flags(fixed("basic", dec!(26000)), false, false, true)];
        let result = calculate(&input(dec!(26000), heads, &["basic"])).unwrap();
        let basic = row(&result, "basic");
        assert_eq!(basic.gratuity_employer, dec!(1250.0));
        assert_eq!(basic.monthly, dec!(26000));
        assert_eq!(result.totals.ctc, dec!(27250));
    }

    #[test]
    fn esi_applies_within_ceiling() {
        let heads = vec![
            with_flags(fixed("basic", dec!(12000)), false, true, false),
            with_flags(special_allowance("sa"), false, true, false),
        ];
        let mut input = input(dec!(20000), heads, &["basic", "sa"]);
        input.esi_rule = Some(esi_rule());
        let result = calculate(&input).unwrap();
        let basic = row(&result, "basic");
        assert_eq!(basic.esi_employee, dec!(90));
        assert_eq!(basic.esi_employer, dec!(390));
        assert_eq!(basic.monthly, dec!(11910));
        let sa = row(&result, "sa");
        assert_eq!(sa.esi_employee, dec!(60));
        assert_eq!(sa.esi_employer, dec!(260));
        assert_eq!(result.totals.total_esi_employee, dec!(150));
    }

    #[test]
    fn inactive_esi_rule_contributes_nothing() {
        let heads = vec![
            with_flags(fixed("basic", dec!(12000)), false, true, false),
            with_flags(special_allowance("sa"), false, true, false),
        ];
        let mut input = input(dec!(20000), heads, &["basic", "sa"]);
        input.esi_rule = Some(EsiRule {
            is_active: false,
            ..esi_rule()
        });
        let result = calculate(&input).unwrap();
        for row in &result.rows {
            assert_eq!(row.esi_employee, Decimal::ZERO);
            assert_eq!(row.esi_employer, Decimal::ZERO);
            assert_eq!(row.monthly, row.base_amount);
        }
        assert_eq!(result.totals.total_esi_employer, Decimal::ZERO);
        assert_eq!(result.totals.ctc, dec!(20000));
    }

    #[test]
    fn esi_dropped_when_computed_gross_exceeds_ceiling() {
        // Input is under the ceiling but the fixed heads add up above it.
        let heads = vec![
            with_flags(fixed("basic", dec!(15000)), false, true, false),
            with_flags(fixed("conv", dec!(8000)), false, true, false),
        ];
        let mut input = input(dec!(20000), heads, &["basic", "conv"]);
        input.esi_rule = Some(esi_rule());
        let result = calculate(&input).unwrap();
        assert_eq!(result.totals.total_gross, dec!(23000));
        for row in &result.rows {
            assert_eq!(row.esi_employee, Decimal::ZERO);
            assert_eq!(row.esi_employer, Decimal::ZERO);
        }
    }

    #[test]
    fn esi_dropped_when_input_exceeds_ceiling() {
        let heads = vec![with_flags(fixed("basic", dec!(10000)), false, true, false)];
        let mut input = input(dec!(25000), heads, &["basic"]);
        input.esi_rule = Some(esi_rule());
        let result = calculate(&input).unwrap();
        assert_eq!(row(&result, "basic").esi_employee, Decimal::ZERO);
    }

    #[test]
    fn negative_balance_is_returned_with_warning() {
        let heads = vec![fixed("basic", dec!(30000)), special_allowance("sa")];
        let result = calculate(&input(dec!(25000), heads, &["basic", "sa"])).unwrap();
        assert_eq!(row(&result, "sa").base_amount, dec!(-5000));
        assert_eq!(result.totals.total_gross, dec!(25000));
        assert_eq!(
            result.warnings,
            vec![CalculationWarning::NegativeBalance {
                head_id: "sa".into(),
                amount: dec!(-5000)
            }]
        );
    }

    #[test]
    fn unmatched_selection_is_a_configuration_error() {
        let err = calculate(&input(dec!(50000), vec![], &["basic", "hra"])).unwrap_err();
        assert_eq!(err, ConfigurationError::NoHeadsResolved { requested: 2 });
    }

    #[test]
    fn empty_selection_yields_empty_breakdown() {
        let result = calculate(&input(dec!(50000), payroll_heads(), &[])).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.totals, CalculationTotals::default());
    }

    #[test]
    fn payroll_run_isolates_failures() {
        let ok = input(dec!(50000), payroll_heads(), &["basic", "hra", "sa"]);
        let invalid = input(Decimal::ZERO, payroll_heads(), &["basic"]);
        let misconfigured = input(dec!(50000), vec![], &["basic"]);
        let batch = vec![
            EmployeeSalaryInput { employee_id: "e1".into(), request: ok.into() },
            EmployeeSalaryInput { employee_id: "e2".into(), request: invalid.into() },
            EmployeeSalaryInput { employee_id: "e3".into(), request: misconfigured.into() },
        ];
        let results = run_payroll(batch);
        let ids: Vec<&str> = results.iter().map(|r| r.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);
        assert!(matches!(results[0].outcome, BreakdownOutcome::Computed { .. }));
        assert!(matches!(&results[1].outcome, BreakdownOutcome::Rejected { error } if error.contains("positive")));
        assert!(matches!(&results[2].outcome, BreakdownOutcome::Rejected { error } if error.contains("no salary heads")));
    }

    fn huge() -> Decimal {
        Decimal::from_i128_with_scale(10_i128.pow(28), 0)
    }

    #[test]
    fn overflowing_percentage_is_a_configuration_error() {
        let heads = vec![percent("basic", dec!(50), "CTC"), special_allowance("sa")];
        let err = calculate(&input(huge(), heads, &["basic", "sa"])).unwrap_err();
        assert!(matches!(err, ConfigurationError::AmountOverflow { .. }));
    }

    #[test]
    fn overflowing_annual_and_totals_are_configuration_errors() {
        let single = vec![fixed("basic", huge())];
        let err = calculate(&input(dec!(50000), single, &["basic"])).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::AmountOverflow {
                context: "annual amount of head basic".into()
            }
        );

        // Each annual figure fits, their sum does not.
        let large = Decimal::from_i128_with_scale(4 * 10_i128.pow(27), 0);
        let pair = vec![fixed("a", large), fixed("b", large)];
        let err = calculate(&input(dec!(50000), pair, &["a", "b"])).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::AmountOverflow {
                context: "total annual".into()
            }
        );
    }

    #[test]
    fn overflowing_pf_base_is_a_configuration_error() {
        let heads = vec![with_flags(fixed("basic", huge()), true, false, false)];
        let mut input = input(dec!(50000), heads, &["basic"]);
        input.pf_rule = Some(PfRule {
            pf_wage_ceiling: None,
            ..pf_rule()
        });
        assert_eq!(
            calculate(&input).unwrap_err(),
            ConfigurationError::AmountOverflow {
                context: "PF of head basic".into()
            }
        );
    }

    #[test]
    fn payroll_run_rejects_only_the_overflowing_employee() {
        let ok = input(dec!(50000), payroll_heads(), &["basic", "hra", "sa"]);
        let heads = vec![
            fixed("basic", Decimal::from_i128_with_scale(10_i128.pow(27), 0)),
            percent("hra", dec!(500), "BASIC"),
        ];
        let overflowing = input(dec!(50000), heads, &["basic", "hra"]);
        let batch = vec![
            EmployeeSalaryInput { employee_id: "e1".into(), request: ok.into() },
            EmployeeSalaryInput { employee_id: "e2".into(), request: overflowing.into() },
        ];
        let results = run_payroll(batch);
        assert!(matches!(results[0].outcome, BreakdownOutcome::Computed { .. }));
        assert!(matches!(&results[1].outcome, BreakdownOutcome::Rejected { error } if error.contains("overflowed")));
    }
}
