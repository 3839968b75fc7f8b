use std::fmt;

use serde::Deserialize;

/// Default Postgres port.
pub const DEFAULT_PORT: u16 = 5432;

/// Where and as whom to connect, supplied by the embedding application.
///
/// Connection urls are parsed by the driver crate; this is the structured form
/// read from configuration files. `Debug` and `Display` never show the password.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    pub database: String,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: Option<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            user: user.into(),
            password,
            database: database.into(),
        }
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.password.is_some() { ":***" } else { "" };
        write!(
            f,
            "postgres://{}{secret}@{}:{}/{}",
            self.user,
            self.host,
            self.port_or_default(),
            self.database
        )
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

/// Mask the password of a connection url and any sensitive query parameters.
pub fn redact_url(url: &str) -> String {
    let mut redacted = url.to_string();

    if let Some(scheme_end) = url.find("://") {
        let authority_start = scheme_end + 3;
        let authority = &url[authority_start..];
        let authority_end = authority.find(['/', '?']).unwrap_or(authority.len());
        if let Some(at_idx) = authority[..authority_end].rfind('@') {
            if let Some(colon_idx) = authority[..at_idx].find(':') {
                let password_start = authority_start + colon_idx + 1;
                let password_end = authority_start + at_idx;
                redacted.replace_range(password_start..password_end, "***");
            }
        }
    }

    redact_query_params(&redacted)
}

fn redact_query_params(url: &str) -> String {
    let Some(query_start) = url.find('?') else {
        return url.to_string();
    };

    let (base, query) = url.split_at(query_start + 1);
    let params: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive_key(key) => format!("{key}=***"),
            _ => pair.to_string(),
        })
        .collect();

    format!("{base}{}", params.join("&"))
}

fn is_sensitive_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "password" | "pass" | "token" | "api_key" | "apikey"
    )
}
