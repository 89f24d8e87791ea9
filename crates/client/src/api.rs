//! REST client for the conversion server's HTTP endpoints.
//!
//! Wraps submission, cancellation and result retrieval over
//! [`reqwest`]; the progress stream itself lives in [`crate::socket`].

use async_trait::async_trait;
use bytes::Bytes;

use glyphify_core::error::{ConvertError, RejectReason};
use glyphify_core::params::ConversionParams;
use glyphify_core::types::JobId;
use glyphify_core::upload::Upload;

use crate::service::ConvertService;
use crate::socket::open_progress_stream;
use crate::subscription::Subscription;

/// HTTP + WebSocket implementation of [`ConvertService`].
pub struct HttpConvertService {
    client: reqwest::Client,
    api_url: String,
    ws_url: String,
}

impl HttpConvertService {
    /// Create a service client for one conversion server.
    ///
    /// * `api_url` - HTTP base URL, e.g. `http://host:5000`.
    /// * `ws_url`  - WebSocket base URL, e.g. `ws://host:5000`.
    pub fn new(api_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            ws_url: ws_url.into(),
        }
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling).
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        ws_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            ws_url: ws_url.into(),
        }
    }

    fn multipart_form(upload: &Upload, params: &ConversionParams) -> reqwest::multipart::Form {
        let file_part = reqwest::multipart::Part::bytes(upload.data.clone())
            .file_name(upload.filename.clone());
        let mut form = reqwest::multipart::Form::new().part("fileUpload", file_part);
        for (name, value) in params.form_fields() {
            form = form.text(name, value);
        }
        form
    }
}

#[async_trait]
impl ConvertService for HttpConvertService {
    async fn submit(
        &self,
        upload: &Upload,
        params: &ConversionParams,
    ) -> Result<JobId, ConvertError> {
        let form = Self::multipart_form(upload, params);

        let response = self
            .client
            .post(format!("{}/api/convert", self.api_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConvertError::Transport(format!("submit request failed: {e}")))?;

        let status = response.status().as_u16();
        if let Some(err) = reject_from_status(status) {
            return Err(err);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ConvertError::Transport(format!("unreadable submit response: {e}")))?;
        job_id_from_body(&body)
    }

    async fn subscribe(&self, job_id: &str) -> Result<Subscription, ConvertError> {
        open_progress_stream(&self.ws_url, job_id).await
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ConvertError> {
        let response = self
            .client
            .post(format!("{}/api/cancel", self.api_url))
            .json(&job_id)
            .send()
            .await
            .map_err(|e| ConvertError::Transport(format!("cancel request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ConvertError::Transport(format!(
                "cancel rejected with HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }

    async fn fetch_output(&self, result_ref: &str) -> Result<Bytes, ConvertError> {
        let response = self
            .client
            .post(format!("{}/api/getoutput", self.api_url))
            .json(&result_ref)
            .send()
            .await
            .map_err(|e| ConvertError::Fetch(format!("output request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ConvertError::Fetch(format!(
                "output request rejected with HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| ConvertError::Fetch(format!("failed to read artifact body: {e}")))
    }
}

// ---- response mapping ----

/// Map submit HTTP status codes the server uses for rejections.
/// Returns `None` for codes that need body inspection.
fn reject_from_status(status: u16) -> Option<ConvertError> {
    match status {
        415 => Some(ConvertError::Rejected(RejectReason::UnsupportedFormat)),
        413 => Some(ConvertError::Rejected(RejectReason::PayloadTooLarge)),
        s if !(200..300).contains(&s) => Some(ConvertError::Transport(format!(
            "submit failed with HTTP {s}"
        ))),
        _ => None,
    }
}

/// Interpret a 2xx submit body: a bare JSON string holding the job id,
/// or one of the server's sentinel values for a rejection.
fn job_id_from_body(body: &serde_json::Value) -> Result<JobId, ConvertError> {
    match body.as_str() {
        Some("max") => Err(ConvertError::Rejected(RejectReason::AtCapacity)),
        Some("Bad format") => Err(ConvertError::Rejected(RejectReason::UnsupportedFormat)),
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ConvertError::Transport(format!(
            "unexpected submit response: {body}"
        ))),
    }
}
