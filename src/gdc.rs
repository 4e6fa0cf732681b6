use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::KiraError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.gdc.cancer.gov";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileHit {
    pub file_id: String,
    pub file_name: String,
}

pub trait GdcClient: Send + Sync {
    fn query_files(&self, file_names: &[String]) -> Result<Vec<FileHit>, KiraError>;
    fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>, KiraError>;
}

impl<T: GdcClient + ?Sized> GdcClient for &T {
    fn query_files(&self, file_names: &[String]) -> Result<Vec<FileHit>, KiraError> {
        (**self).query_files(file_names)
    }

    fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>, KiraError> {
        (**self).fetch_file(file_id)
    }
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    data: FilesData,
}

#[derive(Debug, Deserialize)]
struct FilesData {
    #[serde(default)]
    hits: Vec<FileHit>,
}

#[derive(Clone)]
pub struct GdcHttpClient {
    client: Client,
    base_url: String,
}

impl GdcHttpClient {
    pub fn new(base_url: &str) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-cm/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::GdcHttp(err.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| KiraError::GdcHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    pub fn data_url(&self, file_id: &str) -> String {
        format!("{}/data/{}", self.base_url, file_id)
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, KiraError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tracing::debug!(status, attempt, "retrying GDC request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tracing::debug!(error = %err, attempt, "retrying GDC request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(KiraError::GdcHttp(err.to_string()));
                }
            }
        }
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, KiraError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "GDC request failed".to_string());
        Err(KiraError::GdcStatus { status, message })
    }
}

impl GdcClient for GdcHttpClient {
    fn query_files(&self, file_names: &[String]) -> Result<Vec<FileHit>, KiraError> {
        if file_names.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.files_url();
        let body = files_query(file_names);
        let response = self.send_with_retries(|| self.client.post(&url).json(&body))?;
        let response = Self::handle_status(response)?;
        let parsed: FilesResponse = response
            .json()
            .map_err(|err| KiraError::GdcResponse(err.to_string()))?;
        Ok(parsed.data.hits)
    }

    fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>, KiraError> {
        let url = self.data_url(file_id);
        let response = self.send_with_retries(|| self.client.get(&url))?;
        let response = Self::handle_status(response)?;
        let bytes = response
            .bytes()
            .map_err(|err| KiraError::GdcHttp(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// the endpoint pages at 10 hits unless `size` is given
pub fn files_query(file_names: &[String]) -> serde_json::Value {
    json!({
        "filters": {
            "op": "in",
            "content": {
                "field": "file_name",
                "value": file_names,
            }
        },
        "fields": "file_id,file_name",
        "format": "JSON",
        "size": file_names.len(),
    })
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
