/*!
Error printer for the `purity` binary.

`main` returns `Result<(), Report>`, and the standard library prints the `Debug` form of the
error before exiting with code 1. The `Debug` form here is the human-readable message followed by
every underlying cause, so an unreadable input file shows the operating system error as well.
*/

use std::error::Error as StdError;
use std::fmt;

pub struct Report(Box<dyn StdError>);

impl Report {
    /// Iterates over the causes of the reported error, nearest first.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        std::iter::successors(self.0.source(), |&e| e.source())
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.0)?;

        let mut causes = self.causes().peekable();
        if causes.peek().is_some() {
            writeln!(f, "\nCaused by:")?;
            for (i, e) in causes.enumerate() {
                writeln!(f, "  {}: {}", i, e)?;
            }
        }

        Ok(())
    }
}

impl<E: Into<Box<dyn StdError>>> From<E> for Report {
    fn from(e: E) -> Self {
        Report(e.into())
    }
}
