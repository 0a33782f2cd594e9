/*!
A module to represent conjunctive normal form formula.

The [`Cnf`] is also the clause database the DPLL search works on: it is simplified destructively
while the search goes deeper, and restored either by cloning it before a decision or by replaying
the [`Change`]s recorded by [`Cnf::assign_literal_with`] in reverse.
*/

use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
    fmt::Display,
    num::NonZeroU32,
    str::FromStr,
};

use typed_index_collections::TiVec;

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum VariableParseError {
    #[snafu(display("Failed to parse Variable ID"))]
    ParseIntError { source: std::num::ParseIntError },
    #[snafu(display("Variable ID must be non-zero"))]
    ZeroVariable,
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: usize },
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    pub const MAX_VARIABLE_ID: usize = std::u32::MAX as usize;
}

impl Variable {
    /// Creates a variable from its DIMACS ID.
    /// Returns `None` if the ID is zero or too large.
    pub fn new(id: usize) -> Option<Self> {
        let id = u32::try_from(id).ok()?;
        Some(Variable(NonZeroU32::new(id)?))
    }

    pub fn id(&self) -> usize {
        self.0.get() as usize
    }

    pub fn as_index(&self) -> usize {
        self.id() - 1
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        Variable::new(index.checked_add(1)?)
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<usize>().context(ParseIntError)?;
        ensure!(num != 0, ZeroVariable);
        Variable::new(num).context(RangeError { num })
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A variable or its negation.
///
/// Literals are ordered by their signed DIMACS value, so `-3 < -1 < 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }

    /// Signed DIMACS representation of the literal.
    pub fn to_dimacs(&self) -> i64 {
        let id = self.id.id() as i64;
        if self.positive {
            id
        } else {
            -id
        }
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_dimacs().cmp(&other.to_dimacs())
    }
}

impl FromStr for Literal {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (positive, id) = match s.strip_prefix('-') {
            Some(rest) => (false, rest.parse()?),
            None => (true, s.parse()?),
        };

        Ok(Literal { id, positive })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "-" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals.
/// Invariant: no variable occurs twice, so a clause is never a tautology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    /// Builds a clause, keeping the first occurrence of repeated literals.
    /// Returns `None` if the literals contain a variable with both polarities.
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Option<Self> {
        let mut seen = HashMap::new();
        let mut tautology = false;
        let mut kept = Vec::new();

        for literal in literals {
            match seen.get(&literal.variable()) {
                Some(&positive) if positive == literal.positive() => continue,
                Some(_) => tautology = true,
                None => {
                    seen.insert(literal.variable(), literal.positive());
                    kept.push(literal);
                }
            }
        }

        if tautology {
            None
        } else {
            Some(Clause { literals: kept })
        }
    }

    pub fn num_literals(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn contains(&self, literal: Literal) -> bool {
        self.literals.contains(&literal)
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClauseIdx(usize);

impl From<usize> for ClauseIdx {
    fn from(index: usize) -> Self {
        ClauseIdx(index)
    }
}

impl From<ClauseIdx> for usize {
    fn from(index: ClauseIdx) -> Self {
        index.0
    }
}

/// A single destructive step performed by [`Cnf::assign_literal_with`].
///
/// Indices are positions at the time of the change, so undoing changes in reverse order
/// restores the clause database exactly, including clause and literal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A satisfied clause was removed from `index`.
    RemovedClause { index: ClauseIdx, clause: Clause },
    /// A falsified literal was removed from `position` of clause `clause`.
    RemovedLiteral {
        clause: ClauseIdx,
        position: usize,
        literal: Literal,
    },
    /// The formula started to contain an empty clause.
    FoundEmptyClause,
}

/// Formula representation in Conjunctive Normal Form
#[derive(Debug, Clone)]
pub struct Cnf {
    num_variables: usize,
    clauses: TiVec<ClauseIdx, Clause>,
    has_empty_clause: bool,
    dropped_tautologies: usize,
}

impl Cnf {
    /// Creates a formula without clauses.
    ///
    /// # Panics
    ///
    /// Panics when `num_variables` exceeds [`Variable::MAX_VARIABLE_ID`].
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: TiVec::new(),
            has_empty_clause: false,
            dropped_tautologies: 0,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn clauses(&self) -> &TiVec<ClauseIdx, Clause> {
        &self.clauses
    }

    pub fn add_clause(&mut self, clause: Clause) {
        if clause.is_empty() {
            self.has_empty_clause = true;
        }
        self.clauses.push(clause);
    }

    /// Records a clause that was dropped while reading because it was always true.
    pub fn add_tautology(&mut self) {
        self.dropped_tautologies += 1;
    }

    pub fn dropped_tautologies(&self) -> usize {
        self.dropped_tautologies
    }

    /// No clause remains, so everything assigned so far satisfies the formula.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Some clause lost all of its literals, so the formula cannot be satisfied.
    pub fn has_empty_clause(&self) -> bool {
        self.has_empty_clause
    }

    /// Literals that occur alone in a clause.
    pub fn unit_literals(&self) -> BTreeSet<Literal> {
        self.clauses
            .iter()
            .filter(|clause| clause.num_literals() == 1)
            .flat_map(|clause| clause.iter())
            .collect()
    }

    /// Literals whose negation occurs in no clause.
    pub fn pure_literals(&self) -> BTreeSet<Literal> {
        let mut candidates = BTreeSet::new();
        let mut mixed = BTreeSet::new();

        for literal in self.clauses.iter().flat_map(|clause| clause.iter()) {
            if mixed.contains(&literal.variable()) || candidates.contains(&literal) {
                continue;
            }
            if candidates.remove(&!literal) {
                mixed.insert(literal.variable());
            } else {
                candidates.insert(literal);
            }
        }

        candidates
    }

    /// First literal of the first remaining clause.
    pub fn branching_literal(&self) -> Option<Literal> {
        self.clauses.first().and_then(|clause| clause.iter().next())
    }

    /// Makes `literal` true: removes satisfied clauses and falsified occurrences of `!literal`.
    /// Stops as soon as a clause becomes empty.
    pub fn assign_literal(&mut self, literal: Literal) {
        self.assign_literal_with(literal, &mut |_: Change| {});
    }

    /// Same as [`Cnf::assign_literal`], reporting every destructive step to `record`.
    pub fn assign_literal_with(&mut self, literal: Literal, record: &mut impl FnMut(Change)) {
        let clauses = std::mem::take(&mut self.clauses.raw);
        for clause in clauses {
            if clause.contains(literal) {
                record(Change::RemovedClause {
                    index: self.clauses.len().into(),
                    clause,
                });
            } else {
                self.clauses.push(clause);
            }
        }

        let falsified = !literal;
        for (index, clause) in self.clauses.raw.iter_mut().enumerate() {
            let position = match clause.literals.iter().position(|&l| l == falsified) {
                Some(position) => position,
                None => continue,
            };

            clause.literals.remove(position);
            record(Change::RemovedLiteral {
                clause: index.into(),
                position,
                literal: falsified,
            });

            if clause.is_empty() {
                if !self.has_empty_clause {
                    self.has_empty_clause = true;
                    record(Change::FoundEmptyClause);
                }
                return;
            }
        }
    }

    /// Assigns every literal in order, stopping early once an empty clause shows up.
    pub fn assign_all(&mut self, literals: &BTreeSet<Literal>) {
        self.assign_all_with(literals, &mut |_: Change| {});
    }

    pub fn assign_all_with(
        &mut self,
        literals: &BTreeSet<Literal>,
        record: &mut impl FnMut(Change),
    ) {
        for &literal in literals {
            self.assign_literal_with(literal, record);
            if self.has_empty_clause {
                break;
            }
        }
    }

    /// Reverts a change recorded by [`Cnf::assign_literal_with`].
    /// Changes must be undone in the reverse order they were recorded.
    pub fn undo(&mut self, change: Change) {
        match change {
            Change::RemovedClause { index, clause } => self.clauses.insert(index, clause),
            Change::RemovedLiteral {
                clause,
                position,
                literal,
            } => self.clauses[clause].literals.insert(position, literal),
            Change::FoundEmptyClause => self.has_empty_clause = false,
        }
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Represents a satisfying assignment for a formula.
/// Invariant: exactly one literal per variable, sorted by variable ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    literals: Vec<Literal>,
}

impl Model {
    /// Completes a partial assignment over `num_variables` variables.
    /// Variables that were never assigned default to true.
    pub fn complete(num_variables: usize, mut partial: Vec<Literal>) -> Self {
        partial.sort_by_key(|literal| literal.variable());
        debug_assert!(partial
            .windows(2)
            .all(|pair| pair[0].variable() != pair[1].variable()));

        let missing = (0..num_variables)
            .filter_map(Variable::from_index)
            .filter(|&variable| {
                partial
                    .binary_search_by_key(&variable, |literal| literal.variable())
                    .is_err()
            })
            .map(|variable| Literal::new(variable, true))
            .collect::<Vec<_>>();

        partial.extend(missing);
        partial.sort_by_key(|literal| literal.variable());

        Model { literals: partial }
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Value assigned to `variable`, if the model covers it.
    pub fn value(&self, variable: Variable) -> Option<bool> {
        self.literals
            .binary_search_by_key(&variable, |literal| literal.variable())
            .ok()
            .map(|index| self.literals[index].positive())
    }

    /// Whether every clause of `formula` has a literal made true by this model.
    pub fn satisfies(&self, formula: &Cnf) -> bool {
        !formula.has_empty_clause()
            && formula.clauses().iter().all(|clause| {
                clause
                    .iter()
                    .any(|literal| self.value(literal.variable()) == Some(literal.positive()))
            })
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v")?;
        for literal in &self.literals {
            write!(f, " {}", literal)?;
        }
        write!(f, " 0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(num: i64) -> Literal {
        num.to_string().parse().unwrap()
    }

    fn clause(nums: &[i64]) -> Clause {
        Clause::new(nums.iter().copied().map(lit)).unwrap()
    }

    fn cnf(num_variables: usize, clauses: &[&[i64]]) -> Cnf {
        let mut cnf = Cnf::new(num_variables);
        for nums in clauses {
            cnf.add_clause(clause(nums));
        }
        cnf
    }

    fn dimacs(literals: &BTreeSet<Literal>) -> Vec<i64> {
        literals.iter().map(Literal::to_dimacs).collect()
    }

    fn snapshot(cnf: &Cnf) -> Vec<Vec<i64>> {
        cnf.clauses()
            .iter()
            .map(|clause| clause.iter().map(|l| l.to_dimacs()).collect())
            .collect()
    }

    #[test]
    fn literal_parse_and_order() {
        assert_eq!(lit(-3).variable(), Variable::new(3).unwrap());
        assert!(!lit(-3).positive());
        assert_eq!(!lit(-3), lit(3));
        assert!(lit(-3) < lit(-1));
        assert!(lit(-1) < lit(2));
        assert_eq!(lit(-12).to_string(), "-12");

        assert!("0".parse::<Literal>().is_err());
        assert!("-0".parse::<Literal>().is_err());
        assert!("x1".parse::<Literal>().is_err());
        assert!("4294967296".parse::<Literal>().is_err());
    }

    #[test]
    fn clause_collapses_duplicates() {
        let clause = clause(&[1, -2, 1, -2, 3]);
        assert_eq!(clause.iter().map(|l| l.to_dimacs()).collect::<Vec<_>>(), vec![1, -2, 3]);
    }

    #[test]
    fn clause_rejects_tautology() {
        assert!(Clause::new(vec![lit(1), lit(2), lit(-1)]).is_none());
        assert!(Clause::new(vec![lit(-4), lit(4)]).is_none());
    }

    #[test]
    fn empty_clause_is_remembered() {
        let mut cnf = Cnf::new(1);
        assert!(!cnf.has_empty_clause());
        cnf.add_clause(Clause::new(vec![]).unwrap());
        assert!(cnf.has_empty_clause());
        assert!(!cnf.is_empty());
    }

    #[test]
    fn unit_literals_are_sorted() {
        let cnf = cnf(4, &[&[3], &[1, 2], &[-4], &[3]]);
        assert_eq!(dimacs(&cnf.unit_literals()), vec![-4, 3]);
    }

    #[test]
    fn pure_literals_skip_mixed_variables() {
        let cnf = cnf(4, &[&[1, -2], &[2, 3], &[-4, 1], &[-4, -1]]);
        assert_eq!(dimacs(&cnf.pure_literals()), vec![-4, 3]);
    }

    #[test]
    fn pure_literal_mixed_variable_stays_disqualified() {
        // 1 and -1 cancel, a later 1 must not bring the variable back
        let cnf = cnf(2, &[&[1], &[-1, 2], &[1, 2]]);
        assert_eq!(dimacs(&cnf.pure_literals()), vec![2]);
    }

    #[test]
    fn assign_removes_satisfied_and_falsified() {
        let mut cnf = cnf(3, &[&[1, 2], &[-1, 3], &[2, 3], &[-1, -3, 2]]);
        cnf.assign_literal(lit(1));
        assert_eq!(snapshot(&cnf), vec![vec![3], vec![2, 3], vec![-3, 2]]);
        assert!(!cnf.has_empty_clause());
        assert_eq!(cnf.branching_literal(), Some(lit(3)));
    }

    #[test]
    fn assign_detects_empty_clause() {
        let mut cnf = cnf(2, &[&[1, 2], &[-2]]);
        cnf.assign_literal(lit(2));
        assert!(cnf.has_empty_clause());
    }

    #[test]
    fn assign_all_stops_on_empty_clause() {
        let mut cnf = cnf(3, &[&[1], &[-1], &[3]]);
        let units = cnf.unit_literals();
        cnf.assign_all(&units);
        assert!(cnf.has_empty_clause());
        // -1 falsified the clause `1`, so 3 was never assigned
        assert_eq!(snapshot(&cnf), vec![vec![], vec![3]]);
    }

    #[test]
    fn assign_all_to_empty_formula() {
        let mut cnf = cnf(2, &[&[1, 2], &[1, -2]]);
        cnf.assign_all(&[lit(1)].iter().copied().collect());
        assert!(cnf.is_empty());
        assert_eq!(cnf.branching_literal(), None);
    }

    #[test]
    fn undo_restores_exact_state() {
        let original = cnf(
            4,
            &[&[1, 2], &[-1, 3], &[4, -2], &[-1, -4], &[2, -3, 1], &[-1]],
        );
        let mut cnf = original.clone();
        let mut changes = Vec::new();

        cnf.assign_literal_with(lit(1), &mut |change| changes.push(change));
        cnf.assign_literal_with(lit(-2), &mut |change| changes.push(change));
        assert!(cnf.has_empty_clause());
        assert_ne!(snapshot(&cnf), snapshot(&original));

        for change in changes.into_iter().rev() {
            cnf.undo(change);
        }
        assert_eq!(snapshot(&cnf), snapshot(&original));
        assert!(!cnf.has_empty_clause());
    }

    #[test]
    fn model_completion_fills_gaps_with_true() {
        let model = Model::complete(5, vec![lit(4), lit(-2)]);
        assert_eq!(model.to_string(), "v 1 -2 3 4 5 0");
        assert_eq!(model.value(Variable::new(2).unwrap()), Some(false));
        assert_eq!(model.value(Variable::new(6).unwrap()), None);
    }

    #[test]
    #[should_panic]
    fn cnf_rejects_unrepresentable_variable_count() {
        Cnf::new(Variable::MAX_VARIABLE_ID + 1);
    }

    #[test]
    fn model_without_variables() {
        assert_eq!(Model::complete(0, vec![]).to_string(), "v 0");
    }

    #[test]
    fn model_satisfaction() {
        let formula = cnf(3, &[&[1, 2], &[-1, 3]]);
        assert!(Model::complete(3, vec![lit(-1), lit(2)]).satisfies(&formula));
        assert!(!Model::complete(3, vec![lit(-1), lit(-2)]).satisfies(&formula));
    }
}
