// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the reporting service.
//!
//! Every call carries the session credential as a cookie. Report uploads go
//! through [`Submitter`], which folds every possible response into a
//! [`SubmitOutcome`] instead of an error, since the coordinator only needs to
//! know whether to drop, keep, or stop.

use std::sync::Arc;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use aq_core::{attachment_content_type, PendingReport, SubmittedReport, UserInfo};

use crate::config::Config;
use crate::session::{Credential, Session};
use crate::sync::{RejectReason, SubmitFuture, SubmitOutcome, Submitter};

/// Error type for API calls other than report submission.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(#[from] aq_core::Error),

    /// The service rejected the session credential.
    #[error("session expired\n  hint: log in again with 'aqs login'")]
    AuthExpired,

    /// Network failure or timeout.
    #[error("could not reach the server: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Login succeeded but no session cookie came back.
    #[error("server did not return a session cookie")]
    MissingCredential,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct SessionStatus {
    #[serde(rename = "isLoggedIn")]
    is_logged_in: bool,
}

/// Client for the reporting service's `/api` endpoints.
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(config: &Config, session: Arc<Session>) -> ApiResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(ApiClient {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.credential() {
            Some(credential) => builder.header(COOKIE, credential.as_str()),
            None => builder,
        }
    }

    /// Upload one report and classify the response.
    pub async fn submit_report(&self, report: &PendingReport) -> SubmitOutcome {
        let form = match build_form(report).await {
            Ok(form) => form,
            Err(reason) => return SubmitOutcome::TransientFailure(reason),
        };

        let request = self.authed(self.client.post(self.url("/reports")).multipart(form));
        match request.send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                outcome_for_response(status, &body)
            }
            Err(e) => SubmitOutcome::TransientFailure(e.to_string()),
        }
    }

    /// Reports submitted by the logged-in user, newest first.
    pub async fn my_reports(&self) -> ApiResult<Vec<SubmittedReport>> {
        let response = self
            .authed(self.client.get(self.url("/my-reports")))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// End the session on the server and locally.
    ///
    /// The local session is cleared even if the request fails.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self
            .authed(self.client.post(self.url("/logout")))
            .send()
            .await;
        self.session.clear();

        match result {
            Ok(response) => {
                check_status(response).await?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("logout request failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Log in and store the returned credential in the session.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<(UserInfo, Credential)> {
        require_credentials(username, password)?;

        let response = self
            .client
            .post(self.url("/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        let response = check_status(response).await?;

        let credential = cookie_from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        )
        .map(Credential::new)
        .ok_or(ApiError::MissingCredential)?;

        let user: UserInfo = response.json().await?;
        self.session.set(credential.clone());
        Ok((user, credential))
    }

    /// Create a citizen account.
    pub async fn register(&self, username: &str, password: &str) -> ApiResult<()> {
        require_credentials(username, password)?;

        let response = self
            .client
            .post(self.url("/register"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Ask the service whether the current credential is still valid.
    pub async fn check_session(&self) -> ApiResult<bool> {
        let response = self
            .authed(self.client.get(self.url("/check_session")))
            .send()
            .await?;
        let response = check_status(response).await?;
        let status: SessionStatus = response.json().await?;
        Ok(status.is_logged_in)
    }
}

impl Submitter for ApiClient {
    fn submit<'a>(&'a self, report: &'a PendingReport) -> SubmitFuture<'a> {
        Box::pin(self.submit_report(report))
    }
}

fn require_credentials(username: &str, password: &str) -> ApiResult<()> {
    if username.trim().is_empty() {
        return Err(aq_core::Error::FieldRequired("username").into());
    }
    if password.is_empty() {
        return Err(aq_core::Error::FieldRequired("password").into());
    }
    Ok(())
}

/// Build the multipart body for a report.
///
/// An attachment that cannot be read is reported as an error string so the
/// caller can treat it as retryable; the file may be on storage that is not
/// mounted yet.
async fn build_form(report: &PendingReport) -> Result<Form, String> {
    let coords = report.coordinates();
    let mut form = Form::new()
        .text("description", report.description().to_string())
        .text("latitude", coords.latitude.to_string())
        .text("longitude", coords.longitude.to_string());

    if let Some(path) = report.attachment_path() {
        let file_name = report
            .attachment_file_name()
            .unwrap_or("attachment")
            .to_string();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| format!("cannot read attachment {}: {}", path.display(), e))?;
        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(attachment_content_type(&file_name))
            .map_err(|e| format!("invalid content type for {}: {}", file_name, e))?;
        form = form.part("image", part);
    }

    Ok(form)
}

/// Classify a submission response.
///
/// 2xx is accepted even if the body does not parse: the service has stored
/// the report and re-sending it would create a duplicate.
pub fn outcome_for_response(status: StatusCode, body: &str) -> SubmitOutcome {
    if status.is_success() {
        return SubmitOutcome::Accepted(serde_json::from_str(body).ok());
    }
    if status == StatusCode::UNAUTHORIZED {
        return SubmitOutcome::Rejected(RejectReason::AuthExpired);
    }
    SubmitOutcome::TransientFailure(format!(
        "HTTP {}: {}",
        status.as_u16(),
        error_message(body)
    ))
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::AuthExpired);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extract `{"error": "..."}` from a response body, or echo the body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Join the `name=value` pairs of `Set-Cookie` headers into a `Cookie` value.
pub fn cookie_from_set_cookie<'a>(headers: impl Iterator<Item = &'a str>) -> Option<String> {
    let pairs: Vec<&str> = headers
        .filter_map(|h| h.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('=') && !pair.starts_with('='))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
