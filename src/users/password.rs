use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// One-way salted password hashing.
pub trait PasswordHashing: Send + Sync {
    fn hash(&self, plain: &str) -> anyhow::Result<String>;
}

/// Hashes on the blocking pool so a slow work factor does not stall the runtime.
pub async fn hash_password(
    hasher: &Arc<dyn PasswordHashing>,
    plain: String,
) -> anyhow::Result<String> {
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.hash(&plain))
        .await
        .context("password hashing task")?
}

/// Argon2id bound to the configured work factor.
#[derive(Clone)]
pub struct Argon2Hashing {
    params: Params,
}

impl Argon2Hashing {
    pub fn new(cfg: PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self { params })
    }
}

impl PasswordHashing for Argon2Hashing {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }
}

/// Checks `plain` against a PHC hash string, using the parameters encoded in it.
#[cfg(test)]
pub(crate) fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
pub(crate) fn cheap_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}
