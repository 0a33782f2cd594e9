use crate::formula::{Cnf, Model};

mod dpll;
pub mod simplify;
mod trail;

pub use dpll::DpllSolver;
pub use trail::TrailSolver;

pub trait Solver {
    /// Creates a new solver instance.
    fn new(formula: Cnf) -> Self;

    /// Solves a CNF SAT problem with the solver.
    /// Returns `Some(Model)` if satisfiable, `None` otherwise.
    fn solve(self) -> Option<Model>;
}
