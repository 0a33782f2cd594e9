use crate::formula::{Change, Cnf, Literal, Model};

use super::{simplify::simplify, Solver};

/// Undo log of the changes applied to the formula.
#[derive(Debug, Default)]
struct Trail {
    changes: Vec<Change>,
}

impl Trail {
    fn mark(&self) -> usize {
        self.changes.len()
    }

    fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Undoes every change recorded after `mark`, newest first.
    fn rollback(&mut self, formula: &mut Cnf, mark: usize) {
        for change in self.changes.drain(mark..).rev() {
            formula.undo(change);
        }
    }
}

/// DPLL search that keeps a single formula and undoes its changes on backtrack.
///
/// Explores the same branches in the same order as [`super::DpllSolver`], so both find the same
/// model.
#[derive(Debug)]
pub struct TrailSolver {
    formula: Cnf,
    trail: Trail,
    assignment: Vec<Literal>,
}

impl Solver for TrailSolver {
    fn new(formula: Cnf) -> Self {
        let num_variables = formula.num_variables();

        TrailSolver {
            formula,
            trail: Trail::default(),
            assignment: Vec::with_capacity(num_variables),
        }
    }

    fn solve(self) -> Option<Model> {
        fn solve_inner(
            formula: &mut Cnf,
            trail: &mut Trail,
            assignment: &mut Vec<Literal>,
            depth: usize,
        ) -> bool {
            if simplify(formula, assignment, &mut |change| trail.push(change)).is_err() {
                return false;
            }

            // No clause left, unassigned variables are irrelevant.
            let literal = match formula.branching_literal() {
                Some(literal) => literal,
                None => return formula.is_empty(),
            };

            trace!("Decision {} at depth {}", literal, depth);
            let rollback = assignment.len();
            let mark = trail.mark();

            assignment.push(literal);
            formula.assign_literal_with(literal, &mut |change| trail.push(change));
            if solve_inner(formula, trail, assignment, depth + 1) {
                return true;
            }

            trace!("Backtrack {} at depth {}", literal, depth);
            trail.rollback(formula, mark);
            assignment.truncate(rollback);
            assignment.push(!literal);
            formula.assign_literal_with(!literal, &mut |change| trail.push(change));
            solve_inner(formula, trail, assignment, depth + 1)
        }

        let TrailSolver {
            mut formula,
            mut trail,
            mut assignment,
        } = self;
        let num_variables = formula.num_variables();

        if solve_inner(&mut formula, &mut trail, &mut assignment, 0) {
            debug!(
                "SAT after assigning {} literals ({} changes on the trail)",
                assignment.len(),
                trail.mark()
            );
            Some(Model::complete(num_variables, assignment))
        } else {
            debug!("UNSAT");
            None
        }
    }
}
