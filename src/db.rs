use anyhow::Context;
use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Database,
};
use tracing::info;

use crate::config::AppConfig;

/// Connects to MongoDB and checks the server answers a `ping`.
///
/// Any failure here is fatal to startup; there is no retry.
pub async fn connect(config: &AppConfig) -> anyhow::Result<Database> {
    let mut options = ClientOptions::parse(&config.mongo_uri)
        .await
        .context("parse MONGO_URI")?;
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

    let client = Client::with_options(options).context("build mongodb client")?;
    let db = client.database(&config.mongo_database);

    db.run_command(doc! { "ping": 1 })
        .await
        .context("ping mongodb")?;

    info!(database = %config.mongo_database, "connected to mongodb");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // requires a running MongoDB
    async fn connects_to_local_mongodb() {
        let uri = std::env::var("MONGO_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let config = AppConfig::from_vars(|key| match key {
            "MONGO_URI" => Some(uri.clone()),
            _ => None,
        })
        .expect("config");
        assert!(connect(&config).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_malformed_uri() {
        let config = AppConfig::from_vars(|key| match key {
            "MONGO_URI" => Some("not-a-mongo-uri".to_string()),
            _ => None,
        })
        .expect("config");
        let err = connect(&config).await.unwrap_err();
        assert!(err.to_string().contains("MONGO_URI"));
    }
}
