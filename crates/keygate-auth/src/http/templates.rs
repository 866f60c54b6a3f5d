//! Server-rendered HTML for the authorization flow.

use crate::oauth::authorize::AuthorizationRequest;

/// Shared CSS for the login page.
const SHARED_STYLES: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: #f1f3f5;
    min-height: 100vh;
    display: flex;
    justify-content: center;
    align-items: center;
    color: #212529;
    line-height: 1.5;
}

.container { width: 100%; max-width: 420px; padding: 1rem; }

.card {
    background: #ffffff;
    border: 1px solid #dee2e6;
    border-radius: 8px;
    padding: 1.5rem;
}

.card-title { font-size: 1.25rem; font-weight: 600; margin-bottom: 1rem; }

.client-info {
    background: #f8f9fa;
    border-radius: 6px;
    padding: 0.75rem 1rem;
    margin-bottom: 1rem;
    font-size: 0.875rem;
    color: #495057;
}

.form-group { margin-bottom: 1rem; }

label { display: block; font-size: 0.875rem; margin-bottom: 0.25rem; color: #495057; }

input {
    width: 100%;
    padding: 0.625rem 0.75rem;
    border: 1px solid #ced4da;
    border-radius: 6px;
    font-size: 0.875rem;
}

input:focus { outline: none; border-color: #3b5bdb; }

button {
    width: 100%;
    background: #3b5bdb;
    color: #ffffff;
    padding: 0.625rem 1rem;
    border: none;
    border-radius: 6px;
    font-size: 0.875rem;
    font-weight: 500;
    cursor: pointer;
}

button:hover { background: #364fc7; }

.alert {
    background: #fff5f5;
    border: 1px solid #ffa8a8;
    color: #c92a2a;
    padding: 0.75rem 1rem;
    border-radius: 6px;
    font-size: 0.875rem;
    margin-bottom: 1rem;
}
"#;

/// Renders the credential form for the authorization endpoint.
///
/// Every OAuth parameter is preserved as a hidden field so the POST can
/// reconstruct the original request. All interpolated values are
/// HTML-escaped.
#[must_use]
pub fn render_login_form(params: &AuthorizationRequest, error: Option<&str>) -> String {
    let alert = error
        .map(|message| format!(r#"<div class="alert">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Sign in</title>
    <style>{styles}</style>
</head>
<body>
    <div class="container">
        <div class="card">
            <div class="card-title">Authorization Request</div>
            <div class="client-info">
                <strong>{client_id}</strong> is requesting access{scope_note}.
            </div>
            {alert}
            <form method="POST" action="/authorize">
                <div class="form-group">
                    <label for="email">Email</label>
                    <input type="email" id="email" name="email" required autofocus>
                </div>
                <div class="form-group">
                    <label for="password">Password</label>
                    <input type="password" id="password" name="password" required>
                </div>
                <input type="hidden" name="response_type" value="{response_type}">
                <input type="hidden" name="client_id" value="{client_id}">
                <input type="hidden" name="redirect_uri" value="{redirect_uri}">
                <input type="hidden" name="scope" value="{scope}">
                <input type="hidden" name="state" value="{state}">
                <input type="hidden" name="code_challenge" value="{code_challenge}">
                <input type="hidden" name="code_challenge_method" value="{code_challenge_method}">
                <button type="submit">Sign in and authorize</button>
            </form>
        </div>
    </div>
</body>
</html>"#,
        styles = SHARED_STYLES,
        client_id = escape_html(&params.client_id),
        scope_note = if params.scope.is_empty() {
            String::new()
        } else {
            format!(" (scope: {})", escape_html(&params.scope))
        },
        alert = alert,
        response_type = escape_html(&params.response_type),
        redirect_uri = escape_html(&params.redirect_uri),
        scope = escape_html(&params.scope),
        state = escape_html(&params.state),
        code_challenge = escape_html(&params.code_challenge),
        code_challenge_method = escape_html(&params.code_challenge_method),
    )
}

/// Escapes a value for interpolation into HTML text or attributes.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
