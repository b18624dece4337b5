use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, multipart};
use serde::Deserialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{routes::Navigator, session::SessionStore};

/// Shown when a failure payload carries no explanatory detail.
pub const GENERIC_UPLOAD_ERROR: &str = "Failed to upload and analyze resume.";

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Failure surface of gateway calls.
#[derive(Debug)]
pub enum GatewayError {
    /// The backend answered 401. The session has already been torn down and
    /// the route forced to login by the time the caller sees this.
    Unauthorized,
    /// Non-success response; `message` is the backend detail or a fallback.
    Api {
        status: StatusCode,
        message: String,
    },
    /// The backend replied with success but an unreadable payload.
    Decode(serde_json::Error),
    /// The request never produced a response.
    Transport(reqwest::Error),
}

impl GatewayError {
    /// Message suitable for the inline error banner.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Unauthorized => {
                "Your session has expired. Please sign in again.".to_string()
            }
            GatewayError::Api { message, .. } => message.clone(),
            GatewayError::Decode(_) | GatewayError::Transport(_) => {
                GENERIC_UPLOAD_ERROR.to_string()
            }
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unauthorized => write!(f, "authorization failure (401)"),
            GatewayError::Api { status, message } => {
                write!(f, "backend call failed with status {status}: {message}")
            }
            GatewayError::Decode(err) => write!(f, "unreadable backend payload: {err}"),
            GatewayError::Transport(err) => write!(f, "request failed: {err}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Canonical verdict of the analysis service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FraudStatus {
    Flagged,
    Clear,
}

impl FraudStatus {
    /// Backend labels are matched case-insensitively; anything that is not
    /// `Flagged` counts as clear.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("flagged") {
            FraudStatus::Flagged
        } else {
            FraudStatus::Clear
        }
    }
}

/// Structured verdict of a completed analysis. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Integer percentage, 0-100.
    pub fraud_score: u8,
    pub fraud_status: FraudStatus,
    /// Status label exactly as returned by the backend, kept for display.
    pub status_label: String,
    /// Ordered human-readable findings; may be empty.
    pub reasons: Vec<String>,
    /// Plain-text excerpt of the document content; may be empty.
    pub extracted_text: String,
    /// Client-side timestamp of when the verdict arrived.
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    fraud_score: u8,
    fraud_status: String,
    #[serde(default)]
    reasons: Vec<String>,
    #[serde(default)]
    extracted_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    detail: Option<String>,
}

/// Single outbound channel for all backend calls.
///
/// Attaches the stored credential to every outgoing request and applies a
/// uniform policy to incoming responses: a 401 clears the session store and
/// forces the route to login before the failed call returns to its caller.
/// The gateway never retries and never mutates response payloads.
#[derive(Clone)]
pub struct AuthGatewayClient {
    http: Client,
    base_url: String,
    store: SessionStore,
    navigator: Navigator,
}

impl AuthGatewayClient {
    pub fn new(base_url: impl Into<String>, store: SessionStore, navigator: Navigator) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            store,
            navigator,
        }
    }

    /// Submits one document for analysis via `POST /upload-resume`.
    ///
    /// The raw bytes travel in a single multipart `file` field. A missing
    /// token is not an error here; the request is sent without credentials
    /// and the backend enforces authorization.
    pub async fn analyze_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<AnalysisResult, GatewayError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(sanitize_filename::sanitize(file_name))
            .mime_str(content_type_for(file_name).as_ref())
            .map_err(GatewayError::Transport)?;
        let form = multipart::Form::new().part("file", part);

        let request_id = Uuid::new_v4();
        let url = format!("{}/upload-resume", self.base_url);
        let mut builder = self
            .http
            .post(&url)
            .header("X-Request-Id", request_id.to_string())
            .multipart(form);

        if let Some(token) = self.store.token() {
            builder = builder.bearer_auth(token);
        }

        debug!(%request_id, %url, file_name, "dispatching analysis request");
        let response = builder.send().await.map_err(|err| {
            warn!(%request_id, %err, "analysis request failed in transport");
            GatewayError::Transport(err)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(GatewayError::Transport)?;
        self.settle(request_id, status, &body)
    }

    /// Applies the uniform response policy shared by every call.
    ///
    /// Runs synchronously, so on a 401 the session teardown and the redirect
    /// are both complete before the caller observes the returned error.
    fn settle(
        &self,
        request_id: Uuid,
        status: StatusCode,
        body: &[u8],
    ) -> Result<AnalysisResult, GatewayError> {
        if status == StatusCode::UNAUTHORIZED {
            warn!(%request_id, "authorization failure; tearing down session");
            if let Err(err) = self.store.clear() {
                error!(%request_id, %err, "failed to clear session after 401");
            }
            self.navigator.redirect_to_login();
            return Err(GatewayError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorPayload>(body)
                .ok()
                .and_then(|payload| payload.detail)
                .unwrap_or_else(|| GENERIC_UPLOAD_ERROR.to_string());
            debug!(%request_id, %status, %message, "analysis request rejected");
            return Err(GatewayError::Api { status, message });
        }

        let payload: AnalysisPayload =
            serde_json::from_slice(body).map_err(GatewayError::Decode)?;
        debug!(%request_id, score = payload.fraud_score, "verdict received");

        Ok(AnalysisResult {
            fraud_score: payload.fraud_score,
            fraud_status: FraudStatus::from_label(&payload.fraud_status),
            status_label: payload.fraud_status,
            reasons: payload.reasons,
            extracted_text: payload.extracted_text,
            completed_at: Utc::now(),
        })
    }
}

fn content_type_for(file_name: &str) -> mime::Mime {
    let lowered = file_name.to_ascii_lowercase();
    if lowered.ends_with(".pdf") {
        mime::APPLICATION_PDF
    } else if lowered.ends_with(".docx") {
        DOCX_CONTENT_TYPE
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    } else {
        mime::APPLICATION_OCTET_STREAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Route;

    const VERDICT_BODY: &str = r#"{
        "fraud_score": 82,
        "fraud_status": "Flagged",
        "reasons": ["Credential mismatch"],
        "extracted_text": "Jane Doe, Senior Engineer"
    }"#;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: SessionStore,
        navigator: Navigator,
    }

    fn fixture_with_token(token: Option<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("session.json"));
        if let Some(token) = token {
            store.set(token, Some("Alice".to_string())).unwrap();
        }
        Fixture {
            _dir: dir,
            store,
            navigator: Navigator::new(Route::Dashboard),
        }
    }

    fn gateway(server: &mockito::ServerGuard, fixture: &Fixture) -> AuthGatewayClient {
        AuthGatewayClient::new(
            server.url(),
            fixture.store.clone(),
            fixture.navigator.clone(),
        )
    }

    #[tokio::test]
    async fn success_response_yields_parsed_verdict() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload-resume")
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(VERDICT_BODY)
            .create_async()
            .await;

        let fixture = fixture_with_token(Some("tok-1"));
        let result = gateway(&server, &fixture)
            .analyze_document("resume.pdf", b"%PDF-1.4".to_vec())
            .await
            .expect("analysis should succeed");

        assert_eq!(result.fraud_score, 82);
        assert_eq!(result.fraud_status, FraudStatus::Flagged);
        assert_eq!(result.status_label, "Flagged");
        assert_eq!(result.reasons, vec!["Credential mismatch".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_token_still_sends_the_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload-resume")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(VERDICT_BODY)
            .create_async()
            .await;

        let fixture = fixture_with_token(None);
        let result = gateway(&server, &fixture)
            .analyze_document("resume.pdf", b"%PDF-1.4".to_vec())
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_clears_session_and_redirects_before_returning() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload-resume")
            .with_status(401)
            .with_body(r#"{"detail":"Invalid token"}"#)
            .create_async()
            .await;

        let fixture = fixture_with_token(Some("tok-1"));
        let err = gateway(&server, &fixture)
            .analyze_document("resume.pdf", b"%PDF-1.4".to_vec())
            .await
            .expect_err("401 must surface as a failure");

        // Both side effects are observable at the moment the error is.
        assert!(matches!(err, GatewayError::Unauthorized));
        assert!(fixture.store.get().is_none());
        assert_eq!(fixture.navigator.current(), Route::Login);
    }

    #[tokio::test]
    async fn failure_detail_is_used_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload-resume")
            .with_status(400)
            .with_body(r#"{"detail":"File too large"}"#)
            .create_async()
            .await;

        let fixture = fixture_with_token(Some("tok-1"));
        let err = gateway(&server, &fixture)
            .analyze_document("resume.pdf", b"%PDF-1.4".to_vec())
            .await
            .expect_err("400 must surface as a failure");

        assert_eq!(err.user_message(), "File too large");
        // A non-401 failure must not touch the session or the route.
        assert!(fixture.store.get().is_some());
        assert_eq!(fixture.navigator.current(), Route::Dashboard);
    }

    #[tokio::test]
    async fn missing_detail_falls_back_to_generic_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload-resume")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let fixture = fixture_with_token(Some("tok-1"));
        let err = gateway(&server, &fixture)
            .analyze_document("resume.pdf", b"%PDF-1.4".to_vec())
            .await
            .expect_err("500 must surface as a failure");

        assert_eq!(err.user_message(), GENERIC_UPLOAD_ERROR);
    }

    #[test]
    fn fraud_status_labels_compare_case_insensitively() {
        assert_eq!(FraudStatus::from_label("Flagged"), FraudStatus::Flagged);
        assert_eq!(FraudStatus::from_label("FLAGGED"), FraudStatus::Flagged);
        assert_eq!(FraudStatus::from_label("Clear"), FraudStatus::Clear);
        assert_eq!(FraudStatus::from_label("Legitimate"), FraudStatus::Clear);
    }

    #[test]
    fn content_types_follow_the_extension() {
        assert_eq!(content_type_for("resume.PDF"), mime::APPLICATION_PDF);
        assert_eq!(content_type_for("resume.docx").as_ref(), DOCX_CONTENT_TYPE);
        assert_eq!(
            content_type_for("resume.txt"),
            mime::APPLICATION_OCTET_STREAM
        );
    }
}
