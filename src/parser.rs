use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, Literal, Variable, VariableParseError};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Cannot open file '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("I/O error occurred while reading CNF input"))]
    ReadError { source: std::io::Error },
    #[snafu(display("Invalid DIMACS, unknown letter at line {}", line))]
    UnknownLineStart { line: usize },
    #[snafu(display("Problem line 'p cnf <num_variables> <num_clauses>' is not found"))]
    MissingProblemDefinition,
    #[snafu(display(
        "Problem line '{}' does not match 'p cnf <num_variables> <num_clauses>'",
        line
    ))]
    MalformedProblemDefinition { line: String },
    #[snafu(display(
        "Too many variables: {} declared, at most {} supported",
        num_variables,
        max_variables
    ))]
    TooManyVariables {
        num_variables: usize,
        max_variables: usize,
    },
    #[snafu(display("Failed to parse line '{}' as clause", clause))]
    MalformedClause { clause: String },
    #[snafu(display("Invalid literal found in clause '{}'", clause))]
    MalformedLiteral {
        clause: String,
        source: VariableParseError,
    },
    #[snafu(display(
        "Literal {} is out of range (the problem line declares {} variables)",
        literal,
        num_variables
    ))]
    VariableOutOfRange {
        literal: Literal,
        num_variables: usize,
    },
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

/// Parse a line to a clause.
/// Returns `None` if the clause contains a literal and its negation.
fn parse_line(line: &str, num_variables: usize) -> Result<Option<Clause>, Error> {
    let mut literals = Vec::new();
    let mut terminated = false;

    for token in line.split_whitespace() {
        if token == "0" {
            terminated = true;
            break;
        }

        let literal = token.parse::<Literal>().with_context(|| MalformedLiteral {
            clause: line.to_owned(),
        })?;
        ensure!(
            literal.variable().id() <= num_variables,
            VariableOutOfRange {
                literal,
                num_variables,
            }
        );
        literals.push(literal);
    }

    ensure!(
        terminated,
        MalformedClause {
            clause: line.to_owned(),
        }
    );

    Ok(Clause::new(literals))
}

/// Parse the problem line into `(num_variables, num_clauses)`
fn parse_problem_line(line: &str) -> Result<(usize, usize), Error> {
    let splitted = line.split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        MalformedProblemDefinition { line }
    );

    match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
        (Ok(num_variables), Ok(num_clauses)) => Ok((num_variables, num_clauses)),
        _ => MalformedProblemDefinition { line }.fail(),
    }
}

/// Parses CNF formula from a buffered reader.
///
/// Fails with [`Error::TooManyVariables`] right after the problem line if it declares more than
/// `max_variables` variables, without looking at any clause.
pub fn parse_reader(reader: impl BufRead, max_variables: usize) -> Result<Cnf, Error> {
    let max_variables = max_variables.min(Variable::MAX_VARIABLE_ID);
    let mut lines = reader.lines().enumerate();

    // skip comments until we find the problem definition
    let prob_line = loop {
        let (index, line) = lines.next().context(MissingProblemDefinition)?;
        let line = line.context(ReadError)?;
        if line.trim().is_empty() {
            continue;
        }

        match line.chars().next() {
            Some('c') => continue,
            Some('p') => break line,
            _ => return UnknownLineStart { line: index + 1 }.fail(),
        }
    };

    let (num_variables, num_clauses) = parse_problem_line(&prob_line)?;
    ensure!(
        num_variables <= max_variables,
        TooManyVariables {
            num_variables,
            max_variables,
        }
    );

    let mut cnf = Cnf::new(num_variables);
    let mut found = 0;

    for (_, line) in lines {
        if found == num_clauses {
            break;
        }

        let line = line.context(ReadError)?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            // empty line, comment
            continue;
        }

        match parse_line(trimmed, num_variables)? {
            Some(clause) => cnf.add_clause(clause),
            None => cnf.add_tautology(),
        }
        found += 1;
    }

    ensure!(
        found == num_clauses,
        ClauseCountMismatch {
            found,
            expected: num_clauses,
        }
    );

    debug!(
        "Parsed CNF with {} variables and {} clauses ({} tautologies dropped)",
        cnf.num_variables(),
        cnf.clauses().len(),
        cnf.dropped_tautologies()
    );
    trace!("{}", cnf);

    Ok(cnf)
}

/// Parses CNF formula from a string
pub fn parse_str(input: &str, max_variables: usize) -> Result<Cnf, Error> {
    parse_reader(input.as_bytes(), max_variables)
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>, max_variables: usize) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path).context(IoError {
        path: path.to_owned(),
    })?);

    parse_reader(file, max_variables)
}
