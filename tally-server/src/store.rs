use {
    std::{collections::HashMap, sync::{Arc, Mutex}},
    async_trait::async_trait,
    thiserror::Error,
    redis::{AsyncCommands, aio::MultiplexedConnection},
    crate::config::{ServerConfig, StoreConfig},
};

/// Durable numeric record storage. The store is opaque to the rest of the
/// server: the only required capability is an atomic add that returns the
/// post-update value. A missing record counts as zero, so the first add
/// creates it.
#[async_trait]
pub trait CounterStore {
    async fn add(&self, key: &str, delta: u64) -> Result<u64, StoreError>;
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("counter store is unavailable: {reason}")]
    Unavailable { reason: String },

    /// The store answered, but the record or the reply does not hold a number.
    #[error("counter store returned a malformed response: {reason}")]
    MalformedResponse { reason: String },
}

#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Connects once; the multiplexed connection is cloned per invocation.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|err| StoreError::Unavailable { reason: format!("failed to create redis client: {err:?}") })?;
        let connection = client.get_multiplexed_async_connection().await
            .map_err(|err| StoreError::Unavailable { reason: format!("failed to connect to redis: {err:?}") })?;
        Ok(Self {
            connection,
        })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn add(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        let mut connection = self.connection.clone();
        // INCRBY is a single atomic command and upserts a missing key at 0
        let quantity: u64 = connection.incr(key, delta).await
            .map_err(map_redis_error)?;
        Ok(quantity)
    }
}

fn map_redis_error(err: redis::RedisError) -> StoreError {
    match err.kind() {
        redis::ErrorKind::TypeError => StoreError::MalformedResponse { reason: format!("{err:?}") },
        _ => StoreError::Unavailable { reason: format!("{err:?}") },
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, u64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn add(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        let mut records = self.records.lock()
            .map_err(|err| StoreError::Unavailable { reason: format!("failed to acquire records lock: {err:?}") })?;
        let quantity = records.entry(key.to_owned()).or_insert(0);
        *quantity += delta;
        Ok(*quantity)
    }
}

pub struct NamespacedStore<T> {
    namespace: String,
    inner: T,
}

impl<T> NamespacedStore<T> {
    pub fn new(namespace: impl Into<String>, inner: T) -> Self {
        Self {
            namespace: namespace.into(),
            inner,
        }
    }

    fn namespaced_key(&self, key: &str) -> String {
        format!("{}/{}", self.namespace, key)
    }
}

#[async_trait]
impl<T: CounterStore + Send + Sync> CounterStore for NamespacedStore<T> {
    async fn add(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        self.inner.add(&self.namespaced_key(key), delta).await
    }
}

#[derive(Clone)]
pub struct BoxedStore {
    inner: Arc<Box<dyn CounterStore + Send + Sync>>,
}

impl BoxedStore {
    pub fn new<T: CounterStore + Send + Sync + 'static>(inner: T) -> Self {
        Self {
            inner: Arc::new(Box::new(inner)),
        }
    }
}

#[async_trait]
impl CounterStore for BoxedStore {
    async fn add(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        self.inner.add(key, delta).await
    }
}

pub async fn store_from_config(config: &ServerConfig) -> Result<BoxedStore, StoreError> {
    let store = match &config.store {
        StoreConfig::Redis { url } => BoxedStore::new(RedisStore::connect(url).await?),
        StoreConfig::Memory => BoxedStore::new(MemoryStore::new()),
    };
    Ok(BoxedStore::new(NamespacedStore::new(config.counter_table.clone(), store)))
}
