//! Authorization endpoint (`GET`/`POST /authorize`).
//!
//! GET validates the OAuth parameters and renders the credential form
//! with every parameter preserved as a hidden field. POST authenticates
//! the submitted credentials and redirects back to the client with a
//! fresh authorization code. Credential failures re-render the form with
//! a message that does not reveal whether the account exists.

use axum::Form;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::{info, warn};

use crate::oauth::authorize::{
    AuthorizationRequest, AuthorizeReject, error_redirect_url, success_redirect_url,
};

use super::templates::render_login_form;
use super::{ApiError, AUTH_DEADLINE, OAuthState, with_deadline};

/// Form body for `POST /authorize`: credentials plus the OAuth
/// parameters echoed from the hidden fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Submitted email.
    #[serde(default)]
    pub email: String,
    /// Submitted password.
    #[serde(default)]
    pub password: String,
    /// Echoed response_type.
    #[serde(default)]
    pub response_type: String,
    /// Echoed client_id.
    #[serde(default)]
    pub client_id: String,
    /// Echoed redirect_uri.
    #[serde(default)]
    pub redirect_uri: String,
    /// Echoed scope.
    #[serde(default)]
    pub scope: String,
    /// Echoed state.
    #[serde(default)]
    pub state: String,
    /// Echoed code_challenge.
    #[serde(default)]
    pub code_challenge: String,
    /// Echoed code_challenge_method.
    #[serde(default)]
    pub code_challenge_method: String,
}

impl LoginForm {
    fn oauth_params(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            response_type: self.response_type.clone(),
            client_id: self.client_id.clone(),
            redirect_uri: self.redirect_uri.clone(),
            scope: self.scope.clone(),
            state: self.state.clone(),
            code_challenge: self.code_challenge.clone(),
            code_challenge_method: self.code_challenge_method.clone(),
        }
    }
}

/// Handler for `GET /authorize`.
pub async fn authorize_get(
    State(_state): State<OAuthState>,
    Query(params): Query<AuthorizationRequest>,
) -> Response {
    if let Err(reject) = params.validate() {
        return reject_response(&params, reject);
    }

    Html(render_login_form(&params, None)).into_response()
}

/// Handler for `POST /authorize` (credential submission).
pub async fn authorize_post(
    State(state): State<OAuthState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let params = form.oauth_params();

    // Hidden fields are client-controlled; validate them again.
    if let Err(reject) = params.validate() {
        return reject_response(&params, reject);
    }

    if form.email.is_empty() || form.password.is_empty() {
        return Html(render_login_form(&params, Some("Email and password are required.")))
            .into_response();
    }

    let result = with_deadline(
        AUTH_DEADLINE,
        state.service.login(&params, &form.email, &form.password),
    )
    .await;

    match result {
        Ok(code) => {
            info!(client_id = %params.client_id, "authorization granted");
            match success_redirect_url(&params.redirect_uri, &code, &params.state) {
                Some(location) => found_redirect(&location),
                None => ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_request",
                    "redirect_uri is not a valid URL",
                )
                .into_response(),
            }
        }
        Err(e) => {
            warn!(client_id = %params.client_id, error = %e, "authorization login failed");
            // Same rendering for unknown account, blocked account, and
            // wrong password.
            Html(render_login_form(&params, Some("Invalid email or password.")))
                .into_response()
        }
    }
}

/// Routes a parameter rejection to a redirect or a direct 400 body.
fn reject_response(params: &AuthorizationRequest, reject: AuthorizeReject) -> Response {
    if params.redirect_uri.is_empty() {
        return ApiError::new(StatusCode::BAD_REQUEST, reject.code.as_str(), reject.description)
            .into_response();
    }

    match error_redirect_url(
        &params.redirect_uri,
        reject.code,
        reject.description,
        &params.state,
    ) {
        Some(location) => found_redirect(&location),
        None => {
            ApiError::new(StatusCode::BAD_REQUEST, reject.code.as_str(), reject.description)
                .into_response()
        }
    }
}

/// A 302 Found redirect. Axum's `Redirect` helpers emit 303/307; the
/// OAuth flow requires 302.
fn found_redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
