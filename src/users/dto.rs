use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::users::repo_types::User;

/// Request body for user creation. Absent fields decode as empty strings;
/// `id` and `joinDate` are ignored if sent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl CreateUserRequest {
    pub fn has_required_fields(&self) -> bool {
        !(self.email.is_empty()
            || self.password.is_empty()
            || self.first_name.is_empty()
            || self.last_name.is_empty())
    }
}

/// Update request after the allow-list (`email`, `firstName`, `lastName`,
/// `password`) has been applied. The password is still plaintext here.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UserUpdateRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}

impl TryFrom<Map<String, Value>> for UserUpdateRequest {
    type Error = ApiError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, ApiError> {
        let mut req = Self::default();
        for (key, value) in fields {
            let slot = match key.as_str() {
                "email" => &mut req.email,
                "password" => &mut req.password,
                "firstName" => &mut req.first_name,
                "lastName" => &mut req.last_name,
                _ => continue,
            };
            match value {
                Value::String(s) => *slot = Some(s),
                _ => return Err(ApiError::BadRequest("Invalid input")),
            }
        }
        Ok(req)
    }
}

/// Public JSON form of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub join_date: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_hex(),
            email: u.email,
            password: u.password_hash,
            first_name: u.first_name,
            last_name: u.last_name,
            join_date: u.join_date,
        }
    }
}

/// Success envelope: `{status, message, data?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn with_data(status: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn create_request_defaults_missing_fields_to_empty() {
        let req: CreateUserRequest =
            serde_json::from_value(json!({"email": "a@b.com", "id": "x", "joinDate": 5})).unwrap();
        assert_eq!(req.email, "a@b.com");
        assert!(req.password.is_empty());
        assert!(!req.has_required_fields());
    }

    #[test]
    fn update_request_drops_unknown_keys() {
        let req = UserUpdateRequest::try_from(fields(json!({
            "id": "x",
            "joinDate": "2020-01-01T00:00:00Z",
            "firstName": "Ada"
        })))
        .unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Ada"));
        assert!(req.email.is_none());

        let only_unknown = UserUpdateRequest::try_from(fields(json!({"id": "x"}))).unwrap();
        assert!(only_unknown.is_empty());
    }

    #[test]
    fn update_request_rejects_non_string_values() {
        let err = UserUpdateRequest::try_from(fields(json!({"email": 42}))).unwrap_err();
        assert_eq!(err.message(), "Invalid input");
        assert!(UserUpdateRequest::try_from(fields(json!({"password": null}))).is_err());
    }

    #[test]
    fn allow_list_matches_parsed_keys() {
        for key in ["email", "firstName", "lastName", "password"] {
            let mut m = Map::new();
            m.insert(key.to_string(), json!("v"));
            let req = UserUpdateRequest::try_from(m).unwrap();
            assert!(!req.is_empty(), "{key} should be honoured");
        }
    }

    #[test]
    fn message_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::message(200, "ok")).unwrap();
        assert_eq!(json, json!({"status": 200, "message": "ok"}));
    }
}
