use crate::formula::{Change, Cnf, Literal, Model};

use super::{simplify::simplify, Solver};

/// DPLL search that clones the formula at every decision.
///
/// The clone explores the branch where the decision literal is true. The branch where it is
/// false keeps working on the original formula, which is no longer needed by anyone else.
#[derive(Debug)]
pub struct DpllSolver {
    formula: Cnf,
    /// Literals assigned so far, in the order they were assigned
    assignment: Vec<Literal>,
}

impl Solver for DpllSolver {
    fn new(formula: Cnf) -> Self {
        let num_variables = formula.num_variables();

        DpllSolver {
            formula,
            assignment: Vec::with_capacity(num_variables),
        }
    }

    fn solve(mut self) -> Option<Model> {
        fn solve_inner(mut formula: Cnf, assignment: &mut Vec<Literal>, depth: usize) -> bool {
            if simplify(&mut formula, assignment, &mut |_: Change| {}).is_err() {
                return false;
            }

            // No clause left, unassigned variables are irrelevant.
            let literal = match formula.branching_literal() {
                Some(literal) => literal,
                None => return formula.is_empty(),
            };

            trace!("Decision {} at depth {}", literal, depth);
            let rollback = assignment.len();

            let mut duplicate = formula.clone();
            assignment.push(literal);
            duplicate.assign_literal(literal);
            if solve_inner(duplicate, assignment, depth + 1) {
                return true;
            }

            trace!("Backtrack {} at depth {}", literal, depth);
            assignment.truncate(rollback);
            assignment.push(!literal);
            formula.assign_literal(!literal);
            solve_inner(formula, assignment, depth + 1)
        }

        let num_variables = self.formula.num_variables();
        if solve_inner(self.formula, &mut self.assignment, 0) {
            debug!("SAT after assigning {} literals", self.assignment.len());
            Some(Model::complete(num_variables, self.assignment))
        } else {
            debug!("UNSAT");
            None
        }
    }
}
