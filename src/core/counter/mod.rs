pub mod error;
pub mod operation;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub use error::CounterError;
pub use operation::{Operation, Outcome};

/// Externally visible shape of a counter, `{"counter": <int>}`.
///
/// The same record is what gets written to storage under the counter's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub counter: i64,
}

impl CounterState {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        debug!("Serialized counter state: {:?}", self);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let state = serde_json::from_slice(bytes)?;
        debug!("Deserialized counter state: {:?}", state);
        Ok(state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    name: String,
    value: i64,
}

impl Counter {
    pub fn new(name: impl Into<String>, initial_value: i64) -> Self {
        let name = name.into();
        tracing::info!("Creating counter '{}' with initial value: {}", name, initial_value);
        Self { name, value: initial_value }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn to_state(&self) -> CounterState {
        CounterState { counter: self.value }
    }

    #[instrument(name = "increment_counter", level = "debug", skip(self))]
    pub fn increment(&mut self) -> Result<CounterState, CounterError> {
        self.value = self.value.checked_add(1).ok_or_else(|| CounterError::Overflow {
            name: self.name.clone(),
        })?;
        tracing::info!("Counter '{}' incremented to: {}", self.name, self.value);
        Ok(self.to_state())
    }

    #[instrument(name = "reset_counter", level = "debug", skip(self))]
    pub fn reset(&mut self) -> CounterState {
        self.value = 0;
        tracing::info!("Counter '{}' reset", self.name);
        self.to_state()
    }

    /// Sum of two operands. Never reads or writes the stored value.
    pub fn add(a: i64, b: i64) -> Result<i64, CounterError> {
        a.checked_add(b).ok_or(CounterError::SumOverflow { a, b })
    }
}
