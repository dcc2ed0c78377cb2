use anyhow::Context;
use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database,
};
use tracing::debug;

use crate::users::repo_types::{User, UserChanges, UserDocument, USERS_COLLECTION};

/// Single-document operations against the user collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: ObjectId) -> anyhow::Result<Option<User>>;
    /// Applies `changes` with one partial update. Succeeds whether or not
    /// a document matched.
    async fn update(&self, id: ObjectId, changes: &UserChanges) -> anyhow::Result<()>;
    /// Removes the document. Succeeds whether or not a document matched.
    async fn delete(&self, id: ObjectId) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct MongoUserStore {
    collection: Collection<UserDocument>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(USERS_COLLECTION),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        self.collection
            .insert_one(UserDocument::from(user))
            .await
            .context("mongodb insert_one users")?;
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> anyhow::Result<Option<User>> {
        let found = self
            .collection
            .find_one(doc! { "_id": id })
            .await
            .context("mongodb find_one users")?;
        found.map(User::try_from).transpose()
    }

    async fn update(&self, id: ObjectId, changes: &UserChanges) -> anyhow::Result<()> {
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": changes.to_set_document() })
            .await
            .context("mongodb update_one users")?;
        debug!(user_id = %id, matched = result.matched_count, "user update applied");
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> anyhow::Result<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .context("mongodb delete_one users")?;
        debug!(user_id = %id, deleted = result.deleted_count, "user delete applied");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryUserStore;
    use super::*;

    fn user(email: &str) -> User {
        User::new(email.into(), "hash".into(), "A".into(), "B".into()).unwrap()
    }

    #[tokio::test]
    async fn memory_store_partial_update_and_delete() {
        let store = MemoryUserStore::default();
        let u = user("a@b.com");
        store.insert(&u).await.unwrap();

        let changes = UserChanges {
            email: Some("c@d.com".into()),
            ..Default::default()
        };
        store.update(u.id, &changes).await.unwrap();
        let got = store.find_by_id(u.id).await.unwrap().unwrap();
        assert_eq!(got.email, "c@d.com");
        assert_eq!(got.first_name, "A");

        store.delete(u.id).await.unwrap();
        assert!(store.find_by_id(u.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_ids_are_not_errors() {
        let store = MemoryUserStore::default();
        let id = ObjectId::new();
        store.update(id, &UserChanges::default()).await.unwrap();
        store.delete(id).await.unwrap();
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    #[ignore] // requires a running MongoDB
    async fn mongo_store_roundtrip() {
        let config = crate::config::AppConfig::from_vars(|key| match key {
            "MONGO_URI" => std::env::var("MONGO_URI")
                .ok()
                .or_else(|| Some("mongodb://localhost:27017".into())),
            "MONGO_DATABASE" => Some("users-api-test".into()),
            _ => None,
        })
        .unwrap();
        let db = crate::db::connect(&config).await.unwrap();
        let store = MongoUserStore::new(&db);

        let u = user("mongo@b.com");
        store.insert(&u).await.unwrap();
        assert_eq!(store.find_by_id(u.id).await.unwrap(), Some(u.clone()));

        store.delete(u.id).await.unwrap();
        assert!(store.find_by_id(u.id).await.unwrap().is_none());
    }
}
