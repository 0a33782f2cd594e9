/*!
The two classical DPLL simplification rules: unit propagation and pure literal elimination.

Both rules append the literals they assign to the running assignment and report every destructive
change of the formula to `record`, which lets the trail-based search undo them later.
*/

use std::collections::BTreeSet;

use crate::formula::{Change, Cnf, Literal};

/// The current branch cannot be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict;

/// Assigns unit clauses until none remain.
pub fn propagate_units(
    formula: &mut Cnf,
    assignment: &mut Vec<Literal>,
    record: &mut impl FnMut(Change),
) -> Result<(), Conflict> {
    loop {
        let units = formula.unit_literals();
        if units.is_empty() {
            return Ok(());
        }

        if units.len() > 1 {
            if let Some(&literal) = units.iter().find(|&&literal| units.contains(&!literal)) {
                trace!("Complementary unit clauses on variable {}", literal.variable());
                return Err(Conflict);
            }
        }

        trace!("Unit propagation assigns {}", display(&units));
        assign_round(formula, assignment, &units, record)?;
    }
}

/// Assigns pure literals until none remain.
pub fn eliminate_pure_literals(
    formula: &mut Cnf,
    assignment: &mut Vec<Literal>,
    record: &mut impl FnMut(Change),
) -> Result<(), Conflict> {
    loop {
        let pure = formula.pure_literals();
        if pure.is_empty() {
            return Ok(());
        }

        trace!("Pure literal elimination assigns {}", display(&pure));
        assign_round(formula, assignment, &pure, record)?;
    }
}

/// Runs both rules to a fixpoint, unit propagation first.
pub fn simplify(
    formula: &mut Cnf,
    assignment: &mut Vec<Literal>,
    record: &mut impl FnMut(Change),
) -> Result<(), Conflict> {
    if formula.has_empty_clause() {
        return Err(Conflict);
    }

    propagate_units(formula, assignment, record)?;
    eliminate_pure_literals(formula, assignment, record)
}

fn assign_round(
    formula: &mut Cnf,
    assignment: &mut Vec<Literal>,
    literals: &BTreeSet<Literal>,
    record: &mut impl FnMut(Change),
) -> Result<(), Conflict> {
    assignment.extend(literals.iter().copied());
    formula.assign_all_with(literals, record);

    if formula.has_empty_clause() {
        trace!("Empty clause found");
        Err(Conflict)
    } else {
        Ok(())
    }
}

fn display(literals: &BTreeSet<Literal>) -> String {
    literals
        .iter()
        .map(|literal| literal.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
