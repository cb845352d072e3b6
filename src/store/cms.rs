//! Strapi content API client for vendor and studio listings

use reqwest::Client;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::Config;

pub const VENDORS_COLLECTION: &str = "vendors";
pub const STUDIOS_COLLECTION: &str = "studios";

/// Read-only client for the content API
#[derive(Clone)]
pub struct CmsClient {
    client: Client,
    base_url: Option<String>,
    api_token: Option<String>,
}

impl CmsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.cms_url.clone(),
            api_token: config.cms_token.clone(),
        }
    }

    /// Get the REST URL for a collection
    fn collection_url(&self, collection: &str) -> Result<String, CmsError> {
        let base = self.base_url.as_deref().ok_or(CmsError::NotConfigured)?;
        Ok(format!("{}/api/{}", base, collection))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// List every entry of a collection, flattened to plain objects
    pub async fn list(&self, collection: &str) -> Result<Vec<Value>, CmsError> {
        let url = self.collection_url(collection)?;

        let response = self
            .authorized(self.client.get(&url))
            .query(&[("populate", "*")])
            .send()
            .await
            .map_err(CmsError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CmsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(CmsError::Parse)?;
        normalize_collection(body)
    }

    /// Fetch one entry by id. Ids that are not a single plain path segment
    /// never reach the content API.
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, CmsError> {
        if !is_entry_id(id) {
            warn!(collection, id, "Refused malformed content entry id");
            return Ok(None);
        }
        let url = format!("{}/{}", self.collection_url(collection)?, id);

        let response = self
            .authorized(self.client.get(&url))
            .query(&[("populate", "*")])
            .send()
            .await
            .map_err(CmsError::Request)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CmsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(CmsError::Parse)?;
        match body.get("data") {
            Some(Value::Null) | None => Ok(None),
            Some(entry) => normalize_entry(entry.clone()).map(Some),
        }
    }
}

/// Numeric ids (v4) and document ids (v5): ASCII letters, digits, `-` and `_`
pub fn is_entry_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Unwrap `{ data: [...] }` into flat entries
pub fn normalize_collection(body: Value) -> Result<Vec<Value>, CmsError> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(entries)) => entries.into_iter().map(normalize_entry).collect(),
            _ => Err(CmsError::UnexpectedShape),
        },
        _ => Err(CmsError::UnexpectedShape),
    }
}

/// Flatten a v4 entry `{ id, attributes: {...} }`; v5 entries are already flat
pub fn normalize_entry(entry: Value) -> Result<Value, CmsError> {
    let Value::Object(mut map) = entry else {
        return Err(CmsError::UnexpectedShape);
    };

    if let Some(Value::Object(attributes)) = map.remove("attributes") {
        let mut flat = Map::new();
        if let Some(id) = map.remove("id") {
            flat.insert("id".to_string(), id);
        }
        for (k, v) in attributes {
            flat.entry(k).or_insert(v);
        }
        for (k, v) in map {
            flat.entry(k).or_insert(v);
        }
        return Ok(Value::Object(flat));
    }

    Ok(Value::Object(map))
}

/// Content API errors
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    #[error("Content API is not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("Unexpected response shape")]
    UnexpectedShape,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn v4_entries_are_flattened() {
        let body = json!({
            "data": [
                { "id": 7, "attributes": { "name": "Lens & Light", "category": "photography" } }
            ],
            "meta": { "pagination": { "total": 1 } }
        });
        let entries = normalize_collection(body).unwrap();
        assert_eq!(
            entries,
            vec![json!({ "id": 7, "name": "Lens & Light", "category": "photography" })]
        );
    }

    #[test]
    fn v5_entries_pass_through() {
        let body = json!({ "data": [ { "id": 3, "documentId": "abc", "name": "Studio A" } ] });
        let entries = normalize_collection(body).unwrap();
        assert_eq!(entries[0]["name"], "Studio A");
        assert_eq!(entries[0]["documentId"], "abc");
    }

    #[test]
    fn body_without_data_array_is_rejected() {
        assert!(matches!(
            normalize_collection(json!({ "error": "nope" })),
            Err(CmsError::UnexpectedShape)
        ));
        assert!(matches!(
            normalize_collection(json!([1, 2])),
            Err(CmsError::UnexpectedShape)
        ));
    }

    #[test]
    fn entry_ids_are_single_plain_segments() {
        assert!(is_entry_id("7"));
        assert!(is_entry_id("zq4h0c2kx9a_b-1"));
        assert!(!is_entry_id(""));
        assert!(!is_entry_id("../users?x="));
        assert!(!is_entry_id("7/../../users"));
        assert!(!is_entry_id("7?populate=deep"));
        assert!(!is_entry_id("7%2F"));
    }

    #[tokio::test]
    async fn unconfigured_client_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let client = CmsClient::new(&Config::for_tests(dir.path().to_path_buf()));
        assert!(matches!(
            client.list(VENDORS_COLLECTION).await,
            Err(CmsError::NotConfigured)
        ));
    }
}
