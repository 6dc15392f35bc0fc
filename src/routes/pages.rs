// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed HTML pages for the password reset flow.

use axum::{
    http::header,
    response::{Html, IntoResponse, Response},
};

/// Client-side half of the reset flow.
pub const RESET_PASSWORD_JS: &str = include_str!("../../static/js/reset_password.js");

const SUPABASE_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/@supabase/supabase-js@2";

const FORGOT_PASSWORD_CSP: &str =
    "default-src 'none'; style-src 'unsafe-inline'; form-action 'self'; frame-ancestors 'none'";

const STYLE: &str = "body{font-family:sans-serif;max-width:28rem;margin:3rem auto;padding:0 1rem}\
form{display:flex;flex-direction:column;gap:.75rem}\
.message{color:#17603a}.error{color:#a01c1c}";

/// Escape text for HTML bodies and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn page(csp: String, html: String) -> Response {
    ([(header::CONTENT_SECURITY_POLICY, csp)], Html(html)).into_response()
}

/// Forgot-password form, optionally with a status line.
pub fn forgot_password(message: Option<&str>, error: Option<&str>) -> Response {
    let status = match (message, error) {
        (_, Some(err)) => format!(r#"<p class="error">{}</p>"#, escape_html(err)),
        (Some(msg), None) => format!(r#"<p class="message">{}</p>"#, escape_html(msg)),
        (None, None) => String::new(),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Forgot password</title>
<style>{STYLE}</style>
</head>
<body>
<h1>Forgot your password?</h1>
{status}
<form method="post" action="/auth/forgot-password">
<label for="email">Email</label>
<input id="email" name="email" type="email" required>
<button type="submit">Send reset link</button>
</form>
</body>
</html>
"#
    );

    page(FORGOT_PASSWORD_CSP.to_string(), html)
}

/// Reset-password form. The script needs the project URL and a public key.
pub fn reset_password(supabase_url: &str, anon_key: Option<&str>) -> Response {
    let connect_src = if supabase_url.is_empty() {
        "'none'".to_string()
    } else {
        supabase_url.to_string()
    };
    let csp = format!(
        "default-src 'none'; script-src 'self' https://cdn.jsdelivr.net; \
         connect-src {connect_src}; style-src 'unsafe-inline'; frame-ancestors 'none'"
    );

    let url = escape_html(supabase_url);
    let key = escape_html(anon_key.unwrap_or_default());

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Reset password</title>
<style>{STYLE}</style>
<script src="{SUPABASE_JS_CDN}"></script>
<script src="/static/js/reset_password.js" defer></script>
</head>
<body data-supabase-url="{url}" data-supabase-key="{key}">
<h1>Choose a new password</h1>
<p id="status-text">Checking your reset link...</p>
<form id="reset-form" style="display:none">
<label for="new-password">New password</label>
<input id="new-password" type="password" autocomplete="new-password" required>
<label for="confirm-password">Confirm password</label>
<input id="confirm-password" type="password" autocomplete="new-password" required>
<button type="submit">Update password</button>
</form>
</body>
</html>
"#
    );

    page(csp, html)
}
