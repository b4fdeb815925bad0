use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, field};

use crate::store::{QueryFilter, RemoteStore, StoreError};

#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Database host, with or without scheme. A bare host implies https.
    pub database_url: String,

    /// Database secret or ID token, sent as the `auth` query parameter.
    pub auth: Option<String>,

    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Realtime-database REST client: every path maps to `{base}/{path}.json`.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    auth: Option<String>,
}

impl RestStore {
    pub fn new(config: RestConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let base_url = config.database_url.trim_end_matches('/');
        let base_url = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("https://{base_url}")
        };

        Ok(Self {
            client,
            base_url,
            auth: config.auth,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.endpoint(path));
        match &self.auth {
            Some(auth) => request.query(&[("auth", auth)]),
            None => request,
        }
    }
}

/// Body of a successful response, or the datastore's error reason.
async fn body(response: Response) -> Result<Vec<u8>, StoreError> {
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    if !status.is_success() {
        let reason = serde_json::from_slice::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(StoreError::Remote {
            status: status.as_u16(),
            reason,
        });
    }

    debug!(response = field::display(status), "success");
    Ok(body)
}

fn document(body: &[u8]) -> Result<Option<Value>, StoreError> {
    let value: Value = serde_json::from_slice(body)?;
    Ok((!value.is_null()).then_some(value))
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn query(&self, path: &str, filter: &QueryFilter) -> Result<Option<Value>, StoreError> {
        debug!(path, ?filter, "querying datastore");
        let response = self
            .request(Method::GET, path)
            .query(&filter.params())
            .send()
            .await?;

        // an unmatched query answers with an empty object rather than null
        let result = document(&body(response).await?)?;
        Ok(result.filter(|value| !matches!(value, Value::Object(map) if map.is_empty())))
    }

    async fn push(&self, path: &str, document: &Value) -> Result<String, StoreError> {
        debug!(path, "pushing document");
        let response = self
            .request(Method::POST, path)
            .json(document)
            .send()
            .await?;

        let PushResponse { name } = serde_json::from_slice(&body(response).await?)?;
        Ok(name)
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        debug!(path, "fetching document");
        let response = self.request(Method::GET, path).send().await?;

        document(&body(response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn test_config(database_url: String) -> RestConfig {
        RestConfig {
            database_url,
            auth: Some("secret".to_string()),
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn bare_host_defaults_to_https() {
        let store = RestStore::new(test_config("example.firebaseio.com/".to_string())).unwrap();

        assert_eq!(
            store.endpoint("/devices/d1"),
            "https://example.firebaseio.com/devices/d1.json"
        );
    }

    #[tokio::test]
    async fn get_sends_auth_and_returns_document() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/devices/d1.json")
            .match_query(Matcher::UrlEncoded("auth".into(), "secret".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"isMeasuring": true, "interval": 30000}"#)
            .create_async()
            .await;

        let store = RestStore::new(test_config(server.url())).unwrap();
        let document = store.get("devices/d1").await.unwrap();

        assert_eq!(document, Some(json!({"isMeasuring": true, "interval": 30000})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_null_is_no_data() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/devices/missing.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let store = RestStore::new(test_config(server.url())).unwrap();

        assert_eq!(store.get("devices/missing").await.unwrap(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn query_encodes_filter() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/devices.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("auth".into(), "secret".into()),
                Matcher::UrlEncoded("orderBy".into(), "\"mac\"".into()),
                Matcher::UrlEncoded("equalTo".into(), "\"AA:BB\"".into()),
                Matcher::UrlEncoded("limitToFirst".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"-Nx1": {"mac": "AA:BB", "isMeasuring": false}}"#)
            .create_async()
            .await;

        let store = RestStore::new(test_config(server.url())).unwrap();
        let filter = QueryFilter::new()
            .order_by("mac")
            .equal_to("AA:BB")
            .limit_to_first(1);
        let document = store.query("devices", &filter).await.unwrap();

        assert_eq!(
            document,
            Some(json!({"-Nx1": {"mac": "AA:BB", "isMeasuring": false}}))
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_query_result_is_no_data() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/devices.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let store = RestStore::new(test_config(server.url())).unwrap();
        let filter = QueryFilter::new().order_by("mac").equal_to("AA:BB");

        assert_eq!(store.query("devices", &filter).await.unwrap(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn push_returns_generated_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/measurements.json")
            .match_query(Matcher::UrlEncoded("auth".into(), "secret".into()))
            .match_body(Matcher::Json(json!({"pressure": 101325})))
            .with_status(200)
            .with_body(r#"{"name": "-Nx2"}"#)
            .create_async()
            .await;

        let store = RestStore::new(test_config(server.url())).unwrap();
        let key = store
            .push("measurements", &json!({"pressure": 101325}))
            .await
            .unwrap();

        assert_eq!(key, "-Nx2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_carries_reason() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/devices/d1.json")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error": "Permission denied"}"#)
            .create_async()
            .await;

        let store = RestStore::new(test_config(server.url())).unwrap();
        let err = store.get("devices/d1").await.unwrap_err();

        match err {
            StoreError::Remote { status, reason } => {
                assert_eq!(status, 401);
                assert_eq!(reason, "Permission denied");
            }
            other => panic!("unexpected error: {other}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let mut config = test_config("http://127.0.0.1:1".to_string());
        config.timeout = Duration::from_secs(2);
        let store = RestStore::new(config).unwrap();

        let err = store.get("devices/d1").await.unwrap_err();

        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[tokio::test]
    async fn garbage_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/devices/d1.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let store = RestStore::new(test_config(server.url())).unwrap();
        let err = store.get("devices/d1").await.unwrap_err();

        assert!(matches!(err, StoreError::Decode(_)));
    }
}
