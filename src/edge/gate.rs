//! Request gate evaluated before anything reaches the renderer: canonical host
//! redirect, maintenance bypass cookie, and the login redirect for member pages.

use axum::http::{HeaderMap, StatusCode, Uri, header};
use secrecy::{ExposeSecret, SecretString};
use url::form_urlencoded;

pub const CANONICAL_HOST: &str = "naglasupan.is";
pub const IDN_HOST: &str = "xn--naglaspan-b9a.is";
pub const PROTECTED_PREFIXES: [&str; 4] = ["/submit", "/profile", "/my-projects", "/my-reviews"];

pub const BYPASS_QUERY_PARAM: &str = "bypass_maintenance";
pub const BYPASS_COOKIE_NAME: &str = "maintenance_bypass";
pub const BYPASS_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 30;
pub const LOGGED_IN_COOKIE_NAME: &str = "logged_in";
pub const LOGIN_PATH: &str = "/login";

#[derive(Clone, Debug)]
pub struct GateConfig {
    pub canonical_host: String,
    pub idn_host: String,
    pub bypass_secret: Option<SecretString>,
    pub production: bool,
    pub protected_prefixes: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            canonical_host: CANONICAL_HOST.to_string(),
            idn_host: IDN_HOST.to_string(),
            bypass_secret: None,
            production: false,
            protected_prefixes: PROTECTED_PREFIXES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl GateConfig {
    /// Configured bypass secret, ignoring an empty value.
    fn bypass_secret(&self) -> Option<&str> {
        self.bypass_secret
            .as_ref()
            .map(|secret| secret.expose_secret())
            .filter(|secret| !secret.is_empty())
    }

    fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

/// The parts of an incoming request the gate looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeRequest {
    pub host: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub cookie: Option<String>,
}

impl EdgeRequest {
    #[must_use]
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let header_value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string)
        };
        Self {
            host: header_value(header::HOST).or_else(|| uri.host().map(ToString::to_string)),
            path: uri.path().to_string(),
            query: uri.query().map(ToString::to_string),
            cookie: header_value(header::COOKIE),
        }
    }

    /// Host name without port, lowercased.
    fn hostname(&self) -> Option<String> {
        let host = self.host.as_deref()?.trim();
        let name = match host.find(']') {
            Some(end) if host.starts_with('[') => &host[..=end],
            _ => host.split(':').next().unwrap_or(host),
        };
        Some(name.to_ascii_lowercase())
    }

    fn has_cookie(&self, name: &str) -> bool {
        self.cookie.as_deref().is_some_and(|cookie| {
            cookie.split(';').any(|pair| {
                pair.trim()
                    .split_once('=')
                    .map_or(pair.trim(), |(key, _)| key.trim())
                    == name
            })
        })
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.query.as_deref().map_or_else(Vec::new, |query| {
            form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        })
    }

    fn path_and_query(&self) -> String {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => format!("{}?{query}", self.path),
            _ => self.path.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect {
        status: StatusCode,
        location: String,
        set_cookie: Option<String>,
    },
}

impl GateDecision {
    fn redirect(status: StatusCode, location: String) -> Self {
        Self::Redirect {
            status,
            location,
            set_cookie: None,
        }
    }
}

/// Decides what happens to `request`. The first matching rule wins.
#[must_use]
pub fn evaluate(request: &EdgeRequest, config: &GateConfig) -> GateDecision {
    if request
        .hostname()
        .is_some_and(|host| host == config.idn_host.to_ascii_lowercase())
    {
        return GateDecision::redirect(
            StatusCode::MOVED_PERMANENTLY,
            format!("https://{}{}", config.canonical_host, request.path_and_query()),
        );
    }

    if let Some(secret) = config.bypass_secret() {
        let pairs = request.query_pairs();
        let matched = pairs
            .iter()
            .find(|(key, _)| key == BYPASS_QUERY_PARAM)
            .is_some_and(|(_, value)| value == secret);
        if matched {
            return GateDecision::Redirect {
                status: StatusCode::TEMPORARY_REDIRECT,
                location: without_param(&request.path, &pairs, BYPASS_QUERY_PARAM),
                set_cookie: Some(bypass_cookie(secret, config.production)),
            };
        }
    }

    if config.is_protected(&request.path) && !request.has_cookie(LOGGED_IN_COOKIE_NAME) {
        let location = match request.query.as_deref() {
            Some(query) if !query.is_empty() => format!("{LOGIN_PATH}?{query}"),
            _ => LOGIN_PATH.to_string(),
        };
        return GateDecision::redirect(StatusCode::TEMPORARY_REDIRECT, location);
    }

    GateDecision::Pass
}

fn without_param(path: &str, pairs: &[(String, String)], param: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut kept = 0;
    for (key, value) in pairs.iter().filter(|(key, _)| key != param) {
        serializer.append_pair(key, value);
        kept += 1;
    }
    if kept == 0 {
        path.to_string()
    } else {
        format!("{path}?{}", serializer.finish())
    }
}

/// `Set-Cookie` value granting maintenance bypass for thirty days.
#[must_use]
pub fn bypass_cookie(secret: &str, secure: bool) -> String {
    let value: String = form_urlencoded::byte_serialize(secret.as_bytes()).collect();
    let mut cookie = format!(
        "{BYPASS_COOKIE_NAME}={value}; Path=/; Max-Age={BYPASS_COOKIE_MAX_AGE}; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
