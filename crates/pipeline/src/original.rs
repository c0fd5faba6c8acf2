//! The `original` stage: loads the raw API description into `record.source`.

use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use genapi_core::config::{Inputs, JsonSource};
use genapi_core::{ConfigRead, Error, Result};

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Fetches or reads the description named by `record.inputs`.
pub async fn load_source(mut record: ConfigRead) -> Result<ConfigRead> {
    let source = match &record.inputs {
        Inputs::Uri(uri) => match remote_url(uri) {
            Some(url) => fetch(&url).await?,
            None => read_file(&local_path(uri)).await?,
        },
        Inputs::Json(JsonSource::Path(path)) => read_file(Path::new(path)).await?,
        Inputs::Json(JsonSource::Inline(object)) => Value::Object(object.clone()),
    };
    record.source = Some(source);
    Ok(record)
}

/// `http(s)` URLs are fetched; anything else is a file.
fn remote_url(uri: &str) -> Option<Url> {
    Url::parse(uri)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

fn local_path(uri: &str) -> std::path::PathBuf {
    Url::parse(uri)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| uri.into())
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|err| {
            warn!(error = %err, "Failed to build HTTP client.");
            Error::Fetch {
                uri: String::new(),
                reason: format!("failed to build HTTP client: {err}"),
            }
        })
}

async fn fetch(url: &Url) -> Result<Value> {
    let fetch_error = |reason: String| Error::Fetch {
        uri: url.to_string(),
        reason,
    };
    let client = build_client()?;
    debug!(%url, "Fetching API description.");
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|err| fetch_error(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        warn!(%url, %status, "API description request failed.");
        return Err(fetch_error(format!("server responded with {status}")));
    }
    let body = response
        .text()
        .await
        .map_err(|err| fetch_error(err.to_string()))?;
    debug!(%url, bytes = body.len(), "Fetched API description.");
    parse_document(&body, url.path())
}

async fn read_file(path: &Path) -> Result<Value> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| Error::io(path, err))?;
    debug!(path = %path.display(), bytes = contents.len(), "Read API description.");
    parse_document(&contents, &path.to_string_lossy())
}

/// JSON unless the name says YAML; JSON is a YAML subset so a YAML
/// document without an extension hint still parses on the fallback.
fn parse_document(contents: &str, name: &str) -> Result<Value> {
    let is_yaml = name.ends_with(".yaml") || name.ends_with(".yml");
    if !is_yaml && let Ok(value) = serde_json::from_str(contents) {
        return Ok(value);
    }
    serde_yaml::from_str(contents)
        .map_err(|err| Error::Parse(format!("{name} is neither JSON nor YAML: {err}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use genapi_core::Config;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(inputs: Inputs) -> ConfigRead {
        ConfigRead::new(inputs, Config::default(), Vec::new())
    }

    #[tokio::test]
    async fn test_inline_payload() {
        let Value::Object(object) = json!({ "swagger": "2.0" }) else {
            unreachable!();
        };
        let loaded = load_source(record(Inputs::Json(JsonSource::Inline(object))))
            .await
            .unwrap();
        assert_eq!(loaded.source, Some(json!({ "swagger": "2.0" })));
    }

    #[tokio::test]
    async fn test_files_by_path_and_uri() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("spec.json");
        std::fs::write(&json_path, r#"{ "openapi": "3.0.0" }"#).unwrap();
        let yaml_path = dir.path().join("spec.yaml");
        std::fs::write(&yaml_path, "swagger: '2.0'\npaths: {}\n").unwrap();

        let loaded = load_source(record(Inputs::Json(JsonSource::Path(
            json_path.to_string_lossy().into_owned(),
        ))))
        .await
        .unwrap();
        assert_eq!(loaded.source, Some(json!({ "openapi": "3.0.0" })));

        let loaded = load_source(record(Inputs::Uri(
            yaml_path.to_string_lossy().into_owned(),
        )))
        .await
        .unwrap();
        assert_eq!(loaded.source, Some(json!({ "swagger": "2.0", "paths": {} })));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = load_source(record(Inputs::Uri("./no/such/spec.json".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[tokio::test]
    async fn test_remote_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spec.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{ "swagger": "2.0" }"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loaded = load_source(record(Inputs::Uri(format!("{}/spec.json", server.uri()))))
            .await
            .unwrap();
        assert_eq!(loaded.source, Some(json!({ "swagger": "2.0" })));

        let err = load_source(record(Inputs::Uri(format!("{}/missing.json", server.uri()))))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { ref reason, .. } if reason.contains("404")));
    }

    #[test]
    fn test_unparsable_document() {
        let err = parse_document("{ not: [valid", "spec.json").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
