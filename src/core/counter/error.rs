use thiserror::Error;

use crate::core::storage::StorageError;

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("storage failure for counter: {0}")]
    Storage(#[from] StorageError),

    /// Stored record for this counter could not be encoded or decoded.
    #[error("bad record for counter '{name}': {source}")]
    Codec {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("counter '{name}' cannot be incremented past {}", i64::MAX)]
    Overflow { name: String },

    #[error("sum overflows: {a} + {b}")]
    SumOverflow { a: i64, b: i64 },
}
