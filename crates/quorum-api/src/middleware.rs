use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use quorum_core::auth::{self, SessionRefresh, SESSION_COOKIE};
use quorum_core::AppState;
use quorum_models::user::CurrentUser;

/// The caller, if they presented a valid session. Handlers decide what an
/// anonymous caller may do.
pub struct MaybeUser(pub Option<CurrentUser>);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(&parts.headers) {
            Some(t) => Some(t.to_string()),
            None => cookie_token(&parts.headers),
        };
        let Some(token) = token else {
            return Ok(MaybeUser(None));
        };

        match auth::validate_token(&token, &state.config.jwt_secret) {
            Ok(claims) => Ok(MaybeUser(Some(claims.user()))),
            Err(e) => {
                tracing::debug!("ignoring session token: {e}");
                Ok(MaybeUser(None))
            }
        }
    }
}

const EXCLUDED_PREFIXES: [&str; 6] = [
    "/_next/static",
    "/_next/image",
    "/static/",
    "/favicon.ico",
    "/login",
    "/register",
];
const EXCLUDED_EXTENSIONS: [&str; 6] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Static assets, images and the login/register pages skip the session hook.
pub fn is_excluded_path(path: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p))
        || EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; \
style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; \
connect-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'";

pub const SECURITY_HEADERS: [(&str, &str); 6] = [
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=()",
    ),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
];

pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn set_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!("session cookie is not a valid header value: {e}"),
    }
}

/// Per-request hook: security headers on every response, plus a refreshed
/// (or cleared) session cookie. The two steps are independent; a refresh
/// failure is logged and the headers still go out.
pub async fn session_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if is_excluded_path(request.uri().path()) {
        return next.run(request).await;
    }

    let token = cookie_token(request.headers());
    let refresh = auth::refresh_session(token.as_deref(), &state.config, Utc::now());

    let mut response = next.run(request).await;
    apply_security_headers(response.headers_mut());

    match refresh {
        Ok(SessionRefresh::Unchanged) => {}
        Ok(SessionRefresh::Renewed(token)) => {
            let cookie = session_cookie(token, state.config.secure_cookies);
            set_cookie(response.headers_mut(), &cookie);
        }
        Ok(SessionRefresh::Cleared) => {
            let mut cookie = session_cookie(String::new(), state.config.secure_cookies);
            cookie.make_removal();
            set_cookie(response.headers_mut(), &cookie);
        }
        Err(e) => tracing::warn!("session refresh failed: {e}"),
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_paths_match_assets_and_auth_pages() {
        for path in [
            "/_next/static/chunk.js",
            "/_next/image",
            "/static/app.css",
            "/favicon.ico",
            "/login",
            "/register",
            "/logo.svg",
            "/img/photo.jpeg",
            "/banner.webp",
        ] {
            assert!(is_excluded_path(path), "{path} should be excluded");
        }
    }

    #[test]
    fn app_paths_are_not_excluded() {
        for path in ["/", "/polls", "/polls/abc/edit", "/polls/abc/vote", "/health"] {
            assert!(!is_excluded_path(path), "{path} should not be excluded");
        }
    }

    #[test]
    fn security_headers_are_applied() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));
        apply_security_headers(&mut headers);
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert!(headers.contains_key("content-security-policy"));
        assert_eq!(headers.len(), SECURITY_HEADERS.len());
    }

    #[test]
    fn bearer_token_is_read_from_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn session_token_is_read_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; quorum-access-token=tok"),
        );
        assert_eq!(cookie_token(&headers).as_deref(), Some("tok"));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let rendered = session_cookie("tok".into(), true).to_string();
        assert!(rendered.starts_with("quorum-access-token=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Lax"));
    }
}
