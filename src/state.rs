use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::users::{
    password::{Argon2Hashing, PasswordHashing},
    repo::{MongoUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub passwords: Arc<dyn PasswordHashing>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let passwords = Arc::new(Argon2Hashing::new(config.password)?) as Arc<dyn PasswordHashing>;
        let db = db::connect(&config).await?;
        let users = Arc::new(MongoUserStore::new(&db)) as Arc<dyn UserStore>;

        Ok(Self::from_parts(users, passwords, Arc::new(config)))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        passwords: Arc<dyn PasswordHashing>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            passwords,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake(users: Arc<dyn UserStore>) -> Self {
        let passwords = Argon2Hashing::new(crate::users::password::cheap_config())
            .expect("cheap params are valid");
        Self::fake_with(users, Arc::new(passwords))
    }

    #[cfg(test)]
    pub fn fake_with(users: Arc<dyn UserStore>, passwords: Arc<dyn PasswordHashing>) -> Self {
        use crate::users::password::cheap_config;

        let config = Arc::new(AppConfig {
            mongo_uri: "mongodb://localhost:27017".into(),
            mongo_database: "test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            password: cheap_config(),
        });
        Self::from_parts(users, passwords, config)
    }
}
