use serde::Serialize;

use super::CounterState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Increment,
    Add { a: i64, b: i64 },
    Reset,
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Operation::Increment | Operation::Reset)
    }
}

/// Result of an [`Operation`]: either the full counter state or a computed sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    State(CounterState),
    Sum(i64),
}
