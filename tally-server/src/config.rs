use {
    std::env,
    thiserror::Error,
};

const ENV_COUNTER_TABLE: &str = "COUNTER_TABLE";
const ENV_STORE_DRIVER: &str = "COUNTER_STORE_DRIVER";

#[derive(Debug)]
pub struct ServerConfig {
    /// Identifier of the table holding the counter record. Applied as a key
    /// namespace, so multiple deployments can share one store instance.
    pub counter_table: String,

    pub store: StoreConfig,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum StoreConfig {
    Redis {
        url: String,
    },
    Memory,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable is not set: {name}")]
    MissingEnv { name: String },

    #[error("unknown counter store driver: {driver:?}")]
    UnknownStoreDriver { driver: String },
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let counter_table = lookup(ENV_COUNTER_TABLE)
            .ok_or(ConfigError::MissingEnv { name: ENV_COUNTER_TABLE.to_owned() })?;

        let store = match lookup(ENV_STORE_DRIVER).unwrap_or_else(|| "redis".to_owned()).as_str() {
            "redis" => StoreConfig::Redis { url: redis_url_from_lookup(&lookup) },
            "memory" => StoreConfig::Memory,
            other => return Err(ConfigError::UnknownStoreDriver { driver: other.to_owned() }),
        };

        Ok(Self {
            counter_table,
            store,
        })
    }
}

fn redis_url_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> String {
    let protocol = lookup("REDIS_PROTOCOL").unwrap_or_else(|| "redis".to_owned());
    let host = lookup("REDIS_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
    let port = lookup("REDIS_PORT").unwrap_or_else(|| "6379".to_owned());
    let password = lookup("REDIS_PASSWORD").unwrap_or_default();
    format!("{}://:{}@{}:{}", protocol, password, host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| (*v).to_owned())
    }

    #[test]
    fn missing_table_identifier_is_an_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[])).err().unwrap();
        match err {
            ConfigError::MissingEnv { name } => assert_eq!("COUNTER_TABLE", name),
            other => panic!("unexpected error: {other:?}, expected MissingEnv"),
        }
    }

    #[test]
    fn defaults_to_redis_driver() {
        let config = ServerConfig::from_lookup(lookup_from(&[("COUNTER_TABLE", "visitors")])).unwrap();
        assert_eq!("visitors", config.counter_table);
        assert_eq!(StoreConfig::Redis { url: "redis://:@127.0.0.1:6379".to_owned() }, config.store);
    }

    #[test]
    fn redis_url_uses_configured_connection_params() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("COUNTER_TABLE", "visitors"),
            ("REDIS_PROTOCOL", "rediss"),
            ("REDIS_HOST", "redis.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_PASSWORD", "hunter2"),
        ])).unwrap();
        assert_eq!(StoreConfig::Redis { url: "rediss://:hunter2@redis.internal:6380".to_owned() }, config.store);
    }

    #[test]
    fn memory_driver_is_selectable() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("COUNTER_TABLE", "visitors"),
            ("COUNTER_STORE_DRIVER", "memory"),
        ])).unwrap();
        assert_eq!(StoreConfig::Memory, config.store);
    }

    #[test]
    fn unknown_driver_is_an_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[
            ("COUNTER_TABLE", "visitors"),
            ("COUNTER_STORE_DRIVER", "dynamo"),
        ])).err().unwrap();
        match err {
            ConfigError::UnknownStoreDriver { driver } => assert_eq!("dynamo", driver),
            other => panic!("unexpected error: {other:?}, expected UnknownStoreDriver"),
        }
    }
}
