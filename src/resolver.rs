//! Head resolution.
//!
//! Turns a company's head definitions and a selection of head ids into
//! the list of regular heads in the order they must be evaluated, plus
//! the balancing head if one was selected.
//!
//! Evaluation order is derived from the definitions rather than the
//! selection: heads are visited in definition order, and a head whose
//! percentage refers to another selected head is placed after that head.
//! References to unselected heads, self references and references that
//! close a cycle are leaves; the engine applies them to the input amount.

use crate::models::{CalculationWarning, SalaryHeadDefinition, Valuation};
use std::collections::{HashMap, HashSet};

/// The selected heads split into regular heads, in evaluation order, and
/// the balancing head.
#[derive(Debug)]
pub struct ResolvedHeads<'a> {
    pub regular: Vec<&'a SalaryHeadDefinition>,
    pub balancing: Option<&'a SalaryHeadDefinition>,
    pub warnings: Vec<CalculationWarning>,
}

impl ResolvedHeads<'_> {
    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.balancing.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    OnPath,
    Done,
}

pub fn resolve_heads<'a>(
    heads: &'a [SalaryHeadDefinition],
    selected_head_ids: &[String],
) -> ResolvedHeads<'a> {
    let wanted: HashSet<&str> = selected_head_ids.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut warnings = Vec::new();
    let mut balancing = None;
    let mut regular = Vec::new();

    for head in heads {
        if !wanted.contains(head.id.as_str()) || !seen.insert(head.id.as_str()) {
            continue;
        }
        if head.is_balancing() {
            if balancing.is_none() {
                balancing = Some(head);
            } else {
                tracing::warn!(head_id = %head.id, "ignoring second special allowance head");
                warnings.push(CalculationWarning::DuplicateBalancingHead {
                    head_id: head.id.clone(),
                });
            }
        } else {
            regular.push(head);
        }
    }

    for id in wanted.iter().filter(|id| !seen.contains(*id)) {
        tracing::debug!(head_id = %id, "selected head has no definition");
    }

    let regular = order_by_dependency(regular, &mut warnings);
    ResolvedHeads {
        regular,
        balancing,
        warnings,
    }
}

/// Orders `heads` so that every resolvable reference is evaluated after
/// the head it refers to, keeping definition order wherever possible.
fn order_by_dependency<'a>(
    heads: Vec<&'a SalaryHeadDefinition>,
    warnings: &mut Vec<CalculationWarning>,
) -> Vec<&'a SalaryHeadDefinition> {
    let mut by_short_name: HashMap<&str, usize> = HashMap::new();
    for (index, head) in heads.iter().enumerate() {
        by_short_name.entry(head.short_name.as_str()).or_insert(index);
    }
    // Each head depends on at most one other head.
    let depends_on: Vec<Option<usize>> = heads
        .iter()
        .enumerate()
        .map(|(index, head)| match head.valuation() {
            Valuation::PercentOfHead(short_name) => by_short_name
                .get(short_name)
                .copied()
                .filter(|&target| target != index),
            _ => None,
        })
        .collect();

    let mut state = vec![Visit::Pending; heads.len()];
    let mut order = Vec::with_capacity(heads.len());
    for start in 0..heads.len() {
        let mut path: Vec<usize> = Vec::new();
        let mut cursor = Some(start);
        while let Some(index) = cursor {
            match state[index] {
                Visit::Done => break,
                Visit::OnPath => {
                    let from = path.iter().position(|&i| i == index).unwrap_or(0);
                    let head_ids: Vec<String> =
                        path[from..].iter().map(|&i| heads[i].id.clone()).collect();
                    tracing::warn!(?head_ids, "percentage references form a cycle");
                    warnings.push(CalculationWarning::DependencyCycle { head_ids });
                    break;
                }
                Visit::Pending => {
                    state[index] = Visit::OnPath;
                    path.push(index);
                    cursor = depends_on[index];
                }
            }
        }
        for &index in path.iter().rev() {
            state[index] = Visit::Done;
            order.push(heads[index]);
        }
    }
    order
}
