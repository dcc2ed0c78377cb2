use anyhow::Context;
use argon2::Params;
use serde::Deserialize;

/// Argon2 work factor applied to every stored password.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub host: String,
    pub port: u16,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mongo_uri = var("MONGO_URI")
            .filter(|v| !v.is_empty())
            .context("MONGO_URI not set")?;
        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or(&var, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&var, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&var, "PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };
        Ok(Self {
            mongo_uri,
            mongo_database: var("MONGO_DATABASE").unwrap_or_else(|| "example-db".into()),
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "PORT", 8080)?,
            password,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().with_context(|| format!("invalid {key}: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_uri_is_set() {
        let cfg = AppConfig::from_vars(vars(&[("MONGO_URI", "mongodb://localhost:27017")]))
            .expect("config should load");
        assert_eq!(cfg.mongo_uri, "mongodb://localhost:27017");
        assert_eq!(cfg.mongo_database, "example-db");
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.password.memory_kib, Params::DEFAULT_M_COST);
        assert_eq!(cfg.password.iterations, Params::DEFAULT_T_COST);
    }

    #[test]
    fn missing_uri_is_an_error() {
        let err = AppConfig::from_vars(vars(&[("PORT", "9000")])).unwrap_err();
        assert!(err.to_string().contains("MONGO_URI"));

        let err = AppConfig::from_vars(vars(&[("MONGO_URI", "")])).unwrap_err();
        assert!(err.to_string().contains("MONGO_URI"));
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = AppConfig::from_vars(vars(&[
            ("MONGO_URI", "mongodb://db:27017"),
            ("MONGO_DATABASE", "users-test"),
            ("PORT", "9090"),
            ("PASSWORD_HASH_ITERATIONS", "3"),
        ]))
        .expect("config should load");
        assert_eq!(cfg.mongo_database, "users-test");
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.password.iterations, 3);
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = AppConfig::from_vars(vars(&[
            ("MONGO_URI", "mongodb://db:27017"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
