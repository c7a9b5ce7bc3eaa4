use axum::{
    extract::{Query, State},
    response::Html,
};
use grubot_core::AppState;
use rand::Rng;
use serde::Deserialize;
use url::Url;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub account_linking_token: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Account-linking confirmation page.
pub async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Html<String>, ApiError> {
    let redirect_uri = params
        .redirect_uri
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("redirect_uri is required".into()))?;
    let success_uri = success_uri(redirect_uri, &authorization_code())?;
    let token = params.account_linking_token.unwrap_or_default();
    tracing::info!(has_token = !token.is_empty(), "rendering authorization page");

    Ok(Html(render_page(&state.config.server_url, &token, &success_uri)))
}

fn authorization_code() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// `redirect_uri` with the authorization code appended to its query.
fn success_uri(redirect_uri: &str, code: &str) -> Result<String, ApiError> {
    let mut url = Url::parse(redirect_uri)
        .map_err(|e| ApiError::BadRequest(format!("invalid redirect_uri: {e}")))?;
    url.query_pairs_mut().append_pair("authorization_code", code);
    Ok(url.into())
}

fn render_page(server_url: &str, token: &str, success_uri: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Grubot - Link your account</title>
  </head>
  <body>
    <h1>Link your account</h1>
    <p>Server: {server}</p>
    <p>Account linking token: <code>{token}</code></p>
    <a href="{success}">Complete account linking</a>
  </body>
</html>
"#,
        server = escape(server_url),
        token = escape(token),
        success = escape(success_uri),
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
