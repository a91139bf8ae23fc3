use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{
    RemoteError, RemoteErrorKind, SubmittedJob, TaskStatus, TranscriptionInput,
    TranscriptionRequest,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    /// Service root, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_response_bytes: 8 * 1024 * 1024,
        }
    }
}

/// The transcription service. Every call is a single request; nothing retries.
#[async_trait::async_trait]
pub trait RemoteService: Send + Sync {
    async fn submit_transcription(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<SubmittedJob, RemoteError>;

    /// Starts a download-only job for a media link.
    async fn submit_fetch(&self, url: &str) -> Result<SubmittedJob, RemoteError>;

    async fn status(&self, task_id: &str) -> Result<TaskStatus, RemoteError>;

    async fn update_text(&self, job_id: &str, text: &str) -> Result<(), RemoteError>;

    /// Removes the stored transcript artifacts of a job.
    async fn delete_job(&self, job_id: &str) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone)]
pub struct HttpRemoteService {
    settings: RemoteSettings,
    base: Url,
    client: reqwest::Client,
}

impl HttpRemoteService {
    pub fn new(settings: RemoteSettings) -> Result<Self, RemoteError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| RemoteError::new(RemoteErrorKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::new(
                RemoteErrorKind::InvalidUrl,
                format!("{} cannot carry a path", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| RemoteError::new(RemoteErrorKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        pairs: &[(&str, &str)],
    ) -> Result<T, RemoteError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        let response = self
            .client
            .post(self.endpoint(segments))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.decode(response).await
    }

    async fn upload(
        &self,
        path: &std::path::Path,
        file_name: &str,
        options: [(&'static str, String); 3],
    ) -> Result<SubmittedJob, RemoteError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| RemoteError::new(RemoteErrorKind::Io, format!("{path:?}: {err}")))?;
        engine_debug!("Uploading {} ({} bytes)", file_name, bytes.len());
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let mut form = Form::new().part("file", part);
        for (name, value) in options {
            form = form.text(name, value);
        }
        let response = self
            .client
            .post(self.endpoint(&["transcribe-async"]))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.decode(response).await
    }

    async fn read_body(&self, response: Response) -> Result<(StatusCode, Vec<u8>), RemoteError> {
        let status = response.status();
        let max_bytes = self.settings.max_response_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(too_large(max_bytes));
        }
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(too_large(max_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        Ok((status, body))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, RemoteError> {
        let (status, body) = self.read_body(response).await?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        serde_json::from_slice(&body)
            .map_err(|err| RemoteError::new(RemoteErrorKind::Decode, err.to_string()))
    }

    async fn expect_success(&self, response: Response) -> Result<(), RemoteError> {
        let (status, body) = self.read_body(response).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(rejection(status, &body))
        }
    }
}

#[async_trait::async_trait]
impl RemoteService for HttpRemoteService {
    async fn submit_transcription(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<SubmittedJob, RemoteError> {
        let diarize = if request.diarize { "true" } else { "false" };
        let submitted: SubmittedJob = match &request.input {
            TranscriptionInput::Upload { path, file_name } => {
                let options = [
                    ("language", request.language.clone()),
                    ("model", request.model_size.clone()),
                    ("diarize", diarize.to_string()),
                ];
                self.upload(path, file_name, options).await?
            }
            TranscriptionInput::Downloaded { job_id } => {
                self.post_form(
                    &["transcribe-downloaded-async"],
                    &[
                        ("job_id", job_id.as_str()),
                        ("language", request.language.as_str()),
                        ("model", request.model_size.as_str()),
                        ("diarize", diarize),
                    ],
                )
                .await?
            }
            TranscriptionInput::Link { url } => {
                self.post_form(
                    &["transcribe-url-async"],
                    &[
                        ("url", url.as_str()),
                        ("language", request.language.as_str()),
                        ("model", request.model_size.as_str()),
                        ("diarize", diarize),
                    ],
                )
                .await?
            }
        };
        engine_info!(
            "Transcription accepted job_id={} task_id={}",
            submitted.job_id,
            submitted.task_id
        );
        Ok(submitted)
    }

    async fn submit_fetch(&self, url: &str) -> Result<SubmittedJob, RemoteError> {
        let submitted: SubmittedJob = self.post_form(&["fetch-url-async"], &[("url", url)]).await?;
        engine_info!(
            "Link fetch accepted job_id={} task_id={}",
            submitted.job_id,
            submitted.task_id
        );
        Ok(submitted)
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus, RemoteError> {
        let response = self
            .client
            .get(self.endpoint(&["status", task_id]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.decode(response).await
    }

    async fn update_text(&self, job_id: &str, text: &str) -> Result<(), RemoteError> {
        let body = serde_json::to_vec(&json!({ "text": text }))
            .map_err(|err| RemoteError::new(RemoteErrorKind::Decode, err.to_string()))?;
        let response = self
            .client
            .put(self.endpoint(&["transcription", job_id, "text"]))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.expect_success(response).await
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.endpoint(&["transcription", job_id]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.expect_success(response).await
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Maps a non-2xx answer. Only a string `detail` counts as a readable rejection;
/// validation error lists fall back to the bare status.
fn rejection(status: StatusCode, body: &[u8]) -> RemoteError {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| match body.detail {
            Value::String(detail) if !detail.trim().is_empty() => Some(detail),
            _ => None,
        });
    match detail {
        Some(detail) => RemoteError::new(
            RemoteErrorKind::Rejected {
                status: status.as_u16(),
                detail,
            },
            status.to_string(),
        ),
        None => RemoteError::new(
            RemoteErrorKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ),
    }
}

fn too_large(max_bytes: u64) -> RemoteError {
    RemoteError::new(RemoteErrorKind::TooLarge { max_bytes }, "response too large")
}

fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::new(RemoteErrorKind::Timeout, err.to_string());
    }
    RemoteError::new(RemoteErrorKind::Network, err.to_string())
}
