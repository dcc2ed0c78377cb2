use anyhow::Context;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Name of the collection holding user documents.
pub const USERS_COLLECTION: &str = "users";

/// User record as held in memory by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: ObjectId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub join_date: OffsetDateTime,
}

impl User {
    /// Builds a fresh record: new id, joined now (millisecond precision, as stored).
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            id: ObjectId::new(),
            email,
            password_hash,
            first_name,
            last_name,
            join_date: from_bson_datetime(bson::DateTime::now())?,
        })
    }
}

/// On-disk form of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub join_date: bson::DateTime,
}

impl From<&User> for UserDocument {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            password: u.password_hash.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            join_date: to_bson_datetime(u.join_date),
        }
    }
}

impl TryFrom<UserDocument> for User {
    type Error = anyhow::Error;

    fn try_from(d: UserDocument) -> anyhow::Result<Self> {
        Ok(Self {
            id: d.id,
            email: d.email,
            password_hash: d.password,
            first_name: d.first_name,
            last_name: d.last_name,
            join_date: from_bson_datetime(d.join_date)?,
        })
    }
}

/// Field-level changes to an existing user. `None` leaves the field untouched.
/// The password is already hashed by the time it lands here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserChanges {
    /// Body of the `$set` operator for these changes.
    pub fn to_set_document(&self) -> Document {
        let mut set = doc! {};
        if let Some(v) = &self.email {
            set.insert("email", v.as_str());
        }
        if let Some(v) = &self.password_hash {
            set.insert("password", v.as_str());
        }
        if let Some(v) = &self.first_name {
            set.insert("firstName", v.as_str());
        }
        if let Some(v) = &self.last_name {
            set.insert("lastName", v.as_str());
        }
        set
    }

    #[cfg(test)]
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        if let Some(v) = &self.password_hash {
            user.password_hash = v.clone();
        }
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
    }
}

fn to_bson_datetime(t: OffsetDateTime) -> bson::DateTime {
    let millis = t.unix_timestamp_nanos() / 1_000_000;
    bson::DateTime::from_millis(i64::try_from(millis).unwrap_or(i64::MAX))
}

fn from_bson_datetime(t: bson::DateTime) -> anyhow::Result<OffsetDateTime> {
    let nanos = i128::from(t.timestamp_millis()) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).context("joinDate out of range")
}
