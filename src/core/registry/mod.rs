use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::core::counter::{Counter, CounterError, CounterState, Operation, Outcome};
use crate::core::storage::{run_blocking, FsStorage, KvStorage, MemoryStorage, StorageError};

pub type BoxedStorage = Arc<dyn KvStorage>;

/// Process-wide map from counter name to its single live instance.
///
/// Instances are created on first lookup, loading whatever value storage holds
/// for the name. Cloning the registry shares the same map.
#[derive(Clone)]
pub struct CounterRegistry {
    storage: BoxedStorage,
    instances: Arc<Mutex<HashMap<String, Arc<OnceCell<DurableCounter>>>>>,
}

impl CounterRegistry {
    pub fn new(storage: BoxedStorage) -> Self {
        Self {
            storage,
            instances: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    #[instrument(name = "registry_get", level = "debug", skip(self))]
    pub async fn get(&self, name: &str) -> Result<DurableCounter, CounterError> {
        // the map lock only covers finding the slot; loading happens on the slot itself
        let slot = {
            let mut instances = self
                .instances
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            instances.entry(name.to_owned()).or_default().clone()
        };

        let counter = slot
            .get_or_try_init(|| async {
                let counter = DurableCounter::load(name, self.storage.clone()).await?;
                info!("Registered durable counter '{}'", name);
                Ok::<_, CounterError>(counter)
            })
            .await?;

        Ok(counter.clone())
    }

    pub fn names(&self) -> Vec<String> {
        let instances = self
            .instances
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = instances
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

#[instrument(name = "create_registry", level = "info")]
pub fn create_registry(data_dir: Option<&Path>) -> Result<CounterRegistry, StorageError> {
    match data_dir {
        Some(dir) => {
            let storage = FsStorage::new(dir)?;
            let stored = storage.list()?;
            info!("Found {} stored counter(s) under {}", stored.len(), storage.path().display());
            Ok(CounterRegistry::new(Arc::new(storage)))
        }
        None => {
            info!("No data directory configured, counters are kept in memory");
            Ok(CounterRegistry::in_memory())
        }
    }
}

/// Handle to one named counter. All clones share the same value and lock.
#[derive(Clone)]
pub struct DurableCounter {
    name: Arc<str>,
    counter: Arc<tokio::sync::Mutex<Counter>>,
    storage: BoxedStorage,
}

impl DurableCounter {
    async fn load(name: &str, storage: BoxedStorage) -> Result<Self, CounterError> {
        let key = name.to_owned();
        let value = match run_blocking(&storage, move |storage| storage.get(&key)).await? {
            Some(bytes) => {
                CounterState::from_bytes(&bytes)
                    .map_err(|source| CounterError::Codec {
                        name: name.to_owned(),
                        source,
                    })?
                    .counter
            }
            None => 0,
        };

        Ok(Self {
            name: Arc::from(name),
            counter: Arc::new(tokio::sync::Mutex::new(Counter::new(name, value))),
            storage,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "apply_operation", level = "debug", skip(self), fields(counter = %self.name))]
    pub async fn apply(&self, operation: Operation) -> Result<Outcome, CounterError> {
        debug!(mutation = operation.is_mutation(), "Applying operation");
        match operation {
            Operation::Read => Ok(Outcome::State(self.to_state().await)),
            Operation::Increment => self.increment().await.map(Outcome::State),
            Operation::Add { a, b } => self.add(a, b).map(Outcome::Sum),
            Operation::Reset => self.reset().await.map(Outcome::State),
        }
    }

    pub async fn to_state(&self) -> CounterState {
        self.counter.lock().await.to_state()
    }

    pub async fn increment(&self) -> Result<CounterState, CounterError> {
        self.mutate(Counter::increment).await
    }

    pub async fn reset(&self) -> Result<CounterState, CounterError> {
        self.mutate(|counter| Ok(counter.reset())).await
    }

    pub fn add(&self, a: i64, b: i64) -> Result<i64, CounterError> {
        Counter::add(a, b)
    }

    /// Applies `change` to a copy, persists it, and only then swaps it in.
    async fn mutate<F>(&self, change: F) -> Result<CounterState, CounterError>
    where
        F: FnOnce(&mut Counter) -> Result<CounterState, CounterError>,
    {
        let mut counter = self.counter.lock().await;
        let mut next = counter.clone();
        let state = change(&mut next)?;

        if let Err(err) = self.persist(&state).await {
            warn!("Failed to persist counter '{}', keeping value {}: {}", counter.name(), counter.value(), err);
            return Err(err);
        }

        *counter = next;
        Ok(state)
    }

    async fn persist(&self, state: &CounterState) -> Result<(), CounterError> {
        let bytes = state.to_bytes().map_err(|source| CounterError::Codec {
            name: self.name.to_string(),
            source,
        })?;
        let key = self.name.clone();
        run_blocking(&self.storage, move |storage| storage.set(&key, &bytes)).await?;
        Ok(())
    }
}
