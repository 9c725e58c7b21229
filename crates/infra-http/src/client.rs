//! REST client for the recognition backend
//!
//! Endpoints:
//! - `POST /api/ocr` (multipart, synchronous)
//! - `POST /api/async_ocr` (JSON batch)
//! - `GET /api/ocr_status/<job_id>`
//! - `GET /api/languages`

use crate::config::HttpBackendConfig;
use crate::convert;
use crate::error::HttpError;
use crate::wire::{
    WireBatchAccepted, WireBatchRequest, WireErrorBody, WireJobStatus, WireLanguages,
    WireSyncResponse,
};
use async_trait::async_trait;
use ocrdeck_core::port::{
    BackendError, BatchAccepted, BatchSubmission, JobSnapshot, RecognitionBackend,
    SyncRecognition, SyncRequest,
};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// HTTP implementation of [`RecognitionBackend`]
pub struct HttpRecognitionBackend {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpRecognitionBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool)
    pub fn with_client(client: reqwest::Client, config: HttpBackendConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }

    async fn post_document(&self, request: SyncRequest) -> Result<SyncRecognition, HttpError> {
        let mime = mime_guess::from_path(&request.filename).first_or_octet_stream();
        let part = Part::bytes(request.bytes)
            .file_name(request.filename.clone())
            .mime_str(mime.as_ref())?;
        let form = Form::new()
            .part("file", part)
            .text("language", request.language)
            .text("job_id", request.job_id);

        let response = self
            .client
            .post(self.config.endpoint("/api/ocr"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let parsed: WireSyncResponse = serde_json::from_str(&body)?;
            return Ok(convert::sync_recognition(parsed));
        }
        // a 400 with the timing envelope still carries the full result
        if status == StatusCode::BAD_REQUEST {
            if let Ok(parsed) = serde_json::from_str::<WireSyncResponse>(&body) {
                if parsed.job_id.is_some() && parsed.result.error.is_some() {
                    return Ok(convert::sync_recognition(parsed));
                }
            }
        }

        Err(HttpError::Api {
            status: status.as_u16(),
            message: WireErrorBody::describe(&body),
        })
    }

    async fn post_batch(&self, batch: BatchSubmission) -> Result<BatchAccepted, BackendError> {
        let request = WireBatchRequest {
            files: batch.files.into_iter().map(convert::batch_file).collect(),
        };
        let response = self
            .client
            .post(self.config.endpoint("/api/async_ocr"))
            .json(&request)
            .send()
            .await
            .map_err(HttpError::from)?;

        let accepted: WireBatchAccepted = Self::parse_response(response).await?;
        convert::batch_accepted(accepted)
    }

    async fn get_status(&self, job_id: &str) -> Result<JobSnapshot, BackendError> {
        let response = self
            .client
            .get(self.config.endpoint(&format!("/api/ocr_status/{}", job_id)))
            .send()
            .await
            .map_err(HttpError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(job_id, "Backend does not know job");
            return Err(BackendError::NotFound(job_id.to_string()));
        }

        let status: WireJobStatus = Self::parse_response(response).await?;
        convert::job_snapshot(job_id, status)
    }

    // ---- private helpers ----

    /// Non-2xx responses become [`HttpError::Api`] with the body's message
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(HttpError::Api {
                status: status.as_u16(),
                message: WireErrorBody::describe(&body),
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HttpError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RecognitionBackend for HttpRecognitionBackend {
    async fn recognize(&self, request: SyncRequest) -> Result<SyncRecognition, BackendError> {
        let filename = request.filename.clone();
        self.post_document(request).await.map_err(|e| {
            warn!(filename = %filename, error = %e, "Synchronous recognition failed");
            BackendError::from(e)
        })
    }

    async fn submit_batch(&self, batch: BatchSubmission) -> Result<BatchAccepted, BackendError> {
        let files = batch.files.len();
        let accepted = self.post_batch(batch).await?;
        debug!(job_id = %accepted.job_id, files, "Batch accepted");
        Ok(accepted)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, BackendError> {
        self.get_status(job_id).await
    }

    async fn languages(&self) -> Result<BTreeMap<String, String>, BackendError> {
        let response = self
            .client
            .get(self.config.endpoint("/api/languages"))
            .send()
            .await
            .map_err(HttpError::from)?;
        let languages: WireLanguages = Self::parse_response(response).await?;
        Ok(languages.languages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocrdeck_core::domain::JobStatus;
    use ocrdeck_core::port::BatchItem;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    /// Answers every connection with one canned response and records the
    /// raw requests
    async fn canned_server(
        status_line: &'static str,
        body: String,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let raw = read_request(&mut socket).await;
                seen.lock().unwrap().push(raw);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), requests)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            let Some(head_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let head = text[..head_end].to_ascii_lowercase();
            let body_len = buf.len() - head_end - 4;
            if let Some(len) = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
            {
                if body_len >= len {
                    break;
                }
            } else if !head.contains("transfer-encoding: chunked") || text.ends_with("0\r\n\r\n")
            {
                break;
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn backend(base_url: String) -> HttpRecognitionBackend {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpRecognitionBackend::with_client(client, HttpBackendConfig::new(base_url))
    }

    #[tokio::test]
    async fn test_languages() {
        let (url, _) = canned_server(
            "200 OK",
            r#"{"languages": {"en": "English", "de": "Deutsch"}}"#.to_string(),
        )
        .await;
        let languages = assert_ok!(backend(url).languages().await);
        assert_eq!(languages.len(), 2);
        assert_eq!(languages["de"], "Deutsch");
    }

    #[tokio::test]
    async fn test_job_status_not_found() {
        let (url, requests) = canned_server(
            "404 Not Found",
            r#"{"status": "not_found", "message": "Job abc not found."}"#.to_string(),
        )
        .await;
        let err = assert_err!(backend(url).job_status("abc").await);
        assert_eq!(err, BackendError::NotFound("abc".into()));
        assert!(requests.lock().unwrap()[0].starts_with("GET /api/ocr_status/abc "));
    }

    #[tokio::test]
    async fn test_job_status_in_progress() {
        let (url, _) = canned_server(
            "200 OK",
            r#"{"job_id": "abc", "status": "in_progress", "results": [{"filename": "a.png", "text": "x", "error": null, "ocr_data": []}],
                "overall_start_time": "2026-02-23T12:00:00", "overall_end_time": null, "overall_duration": null, "error": null}"#
                .to_string(),
        )
        .await;
        let snapshot = assert_ok!(backend(url).job_status("abc").await);
        assert_eq!(snapshot.status, JobStatus::InProgress);
        assert_eq!(snapshot.results.len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_rejection() {
        let (url, _) = canned_server(
            "500 Internal Server Error",
            r#"{"error": "Tesseract not found"}"#.to_string(),
        )
        .await;
        let err = backend(url).job_status("abc").await.unwrap_err();
        assert_eq!(
            err,
            BackendError::Rejected {
                status: 500,
                message: "Tesseract not found".into()
            }
        );
    }

    #[tokio::test]
    async fn test_submit_batch_posts_json() {
        let (url, requests) = canned_server(
            "200 OK",
            r#"{"job_id": "b-1", "status": "pending", "message": "Job submitted"}"#.to_string(),
        )
        .await;
        let accepted = backend(url)
            .submit_batch(BatchSubmission {
                files: vec![BatchItem::Url {
                    url: "https://example.com/a.pdf".into(),
                    language: "en".into(),
                }],
            })
            .await
            .unwrap();
        assert_eq!(accepted.job_id, "b-1");
        assert_eq!(accepted.message.as_deref(), Some("Job submitted"));

        let raw = requests.lock().unwrap()[0].clone();
        assert!(raw.starts_with("POST /api/async_ocr "));
        assert!(raw.contains(r#""url":"https://example.com/a.pdf""#));
    }

    #[tokio::test]
    async fn test_recognize_bad_request_carries_result() {
        let (url, requests) = canned_server(
            "400 Bad Request",
            r#"{"job_id": "s-1", "start_time": "2026-02-23T12:00:00", "end_time": "2026-02-23T12:00:00.250000",
                "duration": "250.00ms", "filename": "scan.png", "source": "base64_data", "text": null,
                "error": "Could not read image", "image_base64": null, "ocr_data": []}"#
                .to_string(),
        )
        .await;
        let recognition = backend(url)
            .recognize(SyncRequest {
                job_id: "s-1".into(),
                filename: "scan.png".into(),
                bytes: vec![1, 2, 3],
                language: "en".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            recognition.result.error.as_deref(),
            Some("Could not read image")
        );
        assert_eq!(recognition.duration_ms, Some(250.0));

        let raw = requests.lock().unwrap()[0].clone();
        assert!(raw.starts_with("POST /api/ocr "));
        assert!(raw.contains("name=\"language\""));
        assert!(raw.contains("filename=\"scan.png\""));
    }

    #[tokio::test]
    async fn test_recognize_bad_request_without_result() {
        let (url, _) = canned_server("400 Bad Request", r#"{"error": "No file part"}"#.to_string())
            .await;
        let err = backend(url)
            .recognize(SyncRequest {
                job_id: "s-1".into(),
                filename: "scan.png".into(),
                bytes: vec![1],
                language: "en".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "No file part");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = backend(format!("http://{}", addr))
            .languages()
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
