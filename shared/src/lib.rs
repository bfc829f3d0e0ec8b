use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Longest accepted item name, in characters (matches the `VARCHAR(255)` column).
pub const MAX_NAME_LEN: usize = 255;

/// Page size used by `GET /items` when no `limit` is given.
pub const DEFAULT_LIMIT: i64 = 100;

/// Health check response from `/api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Number of stored items.
    pub items: i64,
}

/// An item as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for `PUT /items/{id}`.
///
/// Each field is tri-state: `None` means the field was absent from the
/// payload and must be left untouched, `Some(None)` means it was sent as an
/// explicit `null`, and `Some(Some(v))` carries a new value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

/// Query string for `GET /items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListItemsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// Shape validation applied at the HTTP boundary, after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

impl Validate for CreateItemRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_name(&self.name, &mut errors);
        finish(errors)
    }
}

impl Validate for UpdateItemRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        match &self.name {
            Some(None) => errors.push(FieldError::new("name", "name may not be null")),
            Some(Some(name)) => check_name(name, &mut errors),
            None => {}
        }
        finish(errors)
    }
}

impl ListItemsQuery {
    /// Resolves defaults and checks bounds, returning `(skip, limit)`.
    pub fn resolve(&self) -> Result<(i64, i64), Vec<FieldError>> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        let mut errors = Vec::new();
        if skip < 0 {
            errors.push(FieldError::new("skip", "skip must be zero or greater"));
        }
        if limit < 1 {
            errors.push(FieldError::new("limit", "limit must be at least 1"));
        }
        finish(errors).map(|()| (skip, limit))
    }
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "name must not be empty"));
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("name must be at most {} characters", MAX_NAME_LEN),
        ));
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// Only called when the key is present, so an explicit `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_description_is_optional() {
        let req: CreateItemRequest = serde_json::from_str(r#"{"name":"a"}"#).unwrap();
        assert_eq!(req.name, "a");
        assert!(req.description.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn create_request_requires_name() {
        let parsed = serde_json::from_str::<CreateItemRequest>(r#"{"description":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn create_request_rejects_blank_and_long_names() {
        let blank = CreateItemRequest {
            name: "   ".to_string(),
            description: None,
        };
        let errors = blank.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");

        let long = CreateItemRequest {
            name: "x".repeat(MAX_NAME_LEN + 1),
            description: None,
        };
        assert!(long.validate().is_err());

        let max = CreateItemRequest {
            name: "x".repeat(MAX_NAME_LEN),
            description: None,
        };
        assert!(max.validate().is_ok());
    }

    #[test]
    fn update_request_distinguishes_absent_from_null() {
        let absent: UpdateItemRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.name, None);
        assert_eq!(absent.description, None);

        let cleared: UpdateItemRequest =
            serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.name, None);
        assert_eq!(cleared.description, Some(None));

        let set: UpdateItemRequest =
            serde_json::from_str(r#"{"name":"b","description":"x"}"#).unwrap();
        assert_eq!(set.name, Some(Some("b".to_string())));
        assert_eq!(set.description, Some(Some("x".to_string())));
    }

    #[test]
    fn update_request_rejects_null_name() {
        let req: UpdateItemRequest = serde_json::from_str(r#"{"name":null}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", "name may not be null")]);
    }

    #[test]
    fn update_request_rejects_wrong_type() {
        assert!(serde_json::from_str::<UpdateItemRequest>(r#"{"name":5}"#).is_err());
    }

    #[test]
    fn list_query_defaults() {
        assert_eq!(ListItemsQuery::default().resolve().unwrap(), (0, DEFAULT_LIMIT));
    }

    #[test]
    fn list_query_bounds() {
        let query = ListItemsQuery {
            skip: Some(-1),
            limit: Some(0),
        };
        let errors = query.resolve().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["skip", "limit"]);
    }

    #[test]
    fn item_serializes_null_description_and_utc_timestamps() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let item = Item {
            id: 1,
            name: "a".to_string(),
            description: None,
            created_at: at,
            updated_at: at,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 1);
        assert!(json["description"].is_null());
        assert_eq!(json["created_at"], "2024-05-01T12:00:00Z");
    }
}
