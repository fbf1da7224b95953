use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies an issued region fetch.
///
/// Sequences only ever grow, so comparing a response's sequence with the
/// latest issued one is enough to tell whether it has been superseded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sequence(pub u64);

impl Sequence {
    pub fn next(self) -> Self {
        Sequence(self.0 + 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
