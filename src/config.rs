/*!
Runtime configuration of the solver binary.

Settings come from environment variables so that limits can be raised without rebuilding:

- `PURITY_MAX_VARIABLES`: the largest variable count a problem line may declare (default 1500)
- `PURITY_BACKTRACK`: `copy` to clone the formula at every decision, `trail` to undo changes instead
*/

use std::{env, str::FromStr};

use crate::prelude::*;

pub const MAX_VARIABLES_VAR: &str = "PURITY_MAX_VARIABLES";
pub const BACKTRACK_VAR: &str = "PURITY_BACKTRACK";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{} must be a non-negative integer, found '{}'", MAX_VARIABLES_VAR, value))]
    InvalidMaxVariables {
        value: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display(
        "{} must be either 'copy' or 'trail', found '{}'",
        BACKTRACK_VAR,
        value
    ))]
    UnknownBacktrack { value: String },
}

/// How the search restores the formula when a decision fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backtrack {
    /// Clone the formula before every decision.
    Copy,
    /// Record every change and undo it on backtrack.
    Trail,
}

impl FromStr for Backtrack {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" => Ok(Backtrack::Copy),
            "trail" => Ok(Backtrack::Trail),
            _ => UnknownBacktrack { value: s }.fail(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub max_variables: usize,
    pub backtrack: Backtrack,
}

impl Config {
    pub const DEFAULT_MAX_VARIABLES: usize = 1500;

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key-value source, unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Config::default();

        if let Some(value) = lookup(MAX_VARIABLES_VAR) {
            config.max_variables = value
                .trim()
                .parse()
                .context(InvalidMaxVariables { value: &value })?;
        }

        if let Some(value) = lookup(BACKTRACK_VAR) {
            config.backtrack = value.trim().parse()?;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_variables: Self::DEFAULT_MAX_VARIABLES,
            backtrack: Backtrack::Copy,
        }
    }
}
