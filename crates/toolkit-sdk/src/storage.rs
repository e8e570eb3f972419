//! Blob storage client
//!
//! Storage-backed ports (images, audio, video, PDFs, CSVs) travel between
//! nodes as file names; the bytes live in the storage service behind
//! `/storage/`. Credentials are sent as bearer-token cookies.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the storage service lives and how to authenticate with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub host: String,
    pub access_token: String,
    pub refresh_token: String,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl StorageConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            access_token: String::new(),
            refresh_token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_tokens(mut self, access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        self.access_token = access_token.into();
        self.refresh_token = refresh_token.into();
        self
    }

    /// Read `TOOLKIT_STORAGE_HOST`, `TOOLKIT_STORAGE_ACCESS_TOKEN`,
    /// `TOOLKIT_STORAGE_REFRESH_TOKEN` and `TOOLKIT_STORAGE_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("TOOLKIT_STORAGE_HOST")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SdkError::Storage("TOOLKIT_STORAGE_HOST is not set".to_string()))?;

        let timeout_secs = match lookup("TOOLKIT_STORAGE_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                SdkError::Storage(format!("TOOLKIT_STORAGE_TIMEOUT_SECS is not a number: '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            host,
            access_token: lookup("TOOLKIT_STORAGE_ACCESS_TOKEN").unwrap_or_default(),
            refresh_token: lookup("TOOLKIT_STORAGE_REFRESH_TOKEN").unwrap_or_default(),
            timeout_secs,
        })
    }

    /// Base URL of the service; a bare host is reached over plain HTTP
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        }
    }
}

/// HTTP client for the storage service
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
}

impl StorageClient {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let cookie = format!(
            "access_token=Bearer {}; refresh_token=Bearer {}",
            config.access_token, config.refresh_token
        );
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie)
                .map_err(|e| SdkError::Storage(format!("invalid storage credentials: {}", e)))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url(),
        })
    }

    pub fn object_url(&self, file_name: &str) -> String {
        format!("{}/storage/{}", self.base_url, file_name)
    }

    /// Download an object's bytes
    pub async fn get(&self, file_name: &str) -> Result<Vec<u8>> {
        let url = self.object_url(file_name);
        log::debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SdkError::Storage(format!(
                "failed to read from storage ({}): {}",
                status, body
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Upload bytes under `file_name`; returns the name the service stored them as
    pub async fn post(&self, file_name: &str, data: Vec<u8>, mimetype: &str) -> Result<String> {
        let url = self.object_url("");
        log::debug!("POST {} ({} bytes, {})", url, data.len(), mimetype);

        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mimetype)?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SdkError::Storage(format!(
                "failed to write to storage ({}): {}",
                status, body
            )));
        }
        Ok(response.json::<String>().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_from_lookup() {
        let config = StorageConfig::from_lookup(lookup(&[
            ("TOOLKIT_STORAGE_HOST", "storage.local:8000"),
            ("TOOLKIT_STORAGE_ACCESS_TOKEN", "abc"),
            ("TOOLKIT_STORAGE_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.host, "storage.local:8000");
        assert_eq!(config.access_token, "abc");
        assert_eq!(config.refresh_token, "");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_requires_host() {
        assert!(matches!(
            StorageConfig::from_lookup(lookup(&[])),
            Err(SdkError::Storage(_))
        ));
        assert!(StorageConfig::from_lookup(lookup(&[
            ("TOOLKIT_STORAGE_HOST", "h"),
            ("TOOLKIT_STORAGE_TIMEOUT_SECS", "soon"),
        ]))
        .is_err());
    }

    #[test]
    fn test_config_deserialize_fills_defaults() {
        let config: StorageConfig = serde_json::from_str(r#"{"host": "storage:8000"}"#).unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.access_token, "");
    }

    #[test]
    fn test_base_url() {
        assert_eq!(StorageConfig::new("storage:8000").base_url(), "http://storage:8000");
        assert_eq!(
            StorageConfig::new("https://storage.example.com/").base_url(),
            "https://storage.example.com"
        );
    }

    #[test]
    fn test_object_url() {
        let client = StorageClient::new(&StorageConfig::new("storage:8000").with_tokens("a", "r")).unwrap();
        assert_eq!(client.object_url("x.png"), "http://storage:8000/storage/x.png");
        assert_eq!(client.object_url(""), "http://storage:8000/storage/");
    }

    #[test]
    fn test_newline_in_token_is_rejected() {
        let config = StorageConfig::new("storage").with_tokens("bad\ntoken", "r");
        assert!(matches!(StorageClient::new(&config), Err(SdkError::Storage(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_http_error() {
        let config = StorageConfig {
            timeout_secs: 2,
            ..StorageConfig::new("127.0.0.1:1")
        };
        let client = StorageClient::new(&config).unwrap();
        assert!(matches!(client.get("x.png").await, Err(SdkError::Http(_))));
    }
}
