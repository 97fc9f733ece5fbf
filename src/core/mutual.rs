//! Folding a system of mutually recursive functions down to the single
//! [`RecurrenceRelation`] the solver pipeline consumes (spec.md §4.2).
//!
//! The fold is a deliberate approximation: it walks every call reachable
//! from the entry point, collects each call's `(a_i, b_i)` term into one
//! flat divide-and-conquer recurrence, and sums every visited
//! component's local cost into a single combine-cost term. This loses
//! the distinction between "cost incurred once" and "cost incurred per
//! recursive call," which is exact only when every component in the
//! cycle has the same recursion depth -- acceptable for the asymptotic
//! bound this crate reports, not for exact constant-factor accounting
//! (that is `crate::bench`'s job).

use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use super::expr::{BinOp, ComplexityExpression};
use super::recurrence::{DivideRecurrence, DivideTerm, MutualRecurrenceSystem, RecurrenceRelation};
use super::variable::Variable;

/// Collapse `system` into a single [`RecurrenceRelation::Divide`].
pub fn fold_mutual_recursion(system: &MutualRecurrenceSystem) -> RecurrenceRelation {
    let variable = system
        .components
        .get(&system.entry_point)
        .map(|c| c.variable.clone())
        .unwrap_or_else(Variable::n);

    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(system.entry_point.clone());
    let mut raw_terms = Vec::new();
    let mut local_costs = Vec::new();

    while let Some(name) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let component = match system.components.get(&name) {
            Some(c) => c,
            None => continue,
        };
        local_costs.push(component.local_cost.clone());
        for (callee, term) in &component.calls {
            raw_terms.push(term.clone());
            if !visited.contains(callee) {
                queue.push_back(callee.clone());
            }
        }
    }

    let combine_cost = local_costs
        .into_iter()
        .reduce(|acc, c| ComplexityExpression::Binary {
            op: BinOp::Add,
            left: Rc::new(acc),
            right: Rc::new(c),
        })
        .unwrap_or(ComplexityExpression::Constant(0.0));

    RecurrenceRelation::Divide(DivideRecurrence::new(variable, merge_terms(raw_terms), combine_cost))
}

/// Combine terms that share a size divisor by summing their subproblem
/// counts, e.g. two distinct call sites each halving `n` fold into one
/// `2*T(n/2)`-shaped term.
fn merge_terms(terms: Vec<DivideTerm>) -> Vec<DivideTerm> {
    let mut merged: Vec<DivideTerm> = Vec::new();
    for term in terms {
        if let Some(existing) = merged
            .iter_mut()
            .find(|m| (m.size_divisor - term.size_divisor).abs() < 1e-9)
        {
            existing.subproblem_count += term.subproblem_count;
        } else {
            merged.push(term);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recurrence::MutualComponent;

    #[test]
    fn fold_collects_all_reachable_components() {
        let n = Variable::n();
        let even = MutualComponent::new(
            "is_even",
            n.clone(),
            ComplexityExpression::Constant(1.0),
        )
        .with_call("is_odd", DivideTerm::new(1.0, 1.0));
        let odd = MutualComponent::new(
            "is_odd",
            n.clone(),
            ComplexityExpression::Constant(1.0),
        )
        .with_call("is_even", DivideTerm::new(1.0, 1.0));
        let system = MutualRecurrenceSystem::new("is_even")
            .with_component(even)
            .with_component(odd);

        let folded = fold_mutual_recursion(&system);
        match folded {
            RecurrenceRelation::Divide(d) => {
                assert_eq!(d.variable, n);
                assert_eq!(d.terms.len(), 1);
                assert_eq!(d.terms[0].subproblem_count, 2.0);
            }
            _ => panic!("expected a Divide recurrence"),
        }
    }
}
