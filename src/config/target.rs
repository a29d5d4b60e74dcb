use std::fmt;

use url::Url;

use crate::error::ConfigError;

const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// Normalized base URL of a traffic target: scheme always present, never a
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    base: String,
}

impl Target {
    /// Normalizes a `host[:port]` or full URL string.
    ///
    /// # Errors
    ///
    /// Returns an error when the string is empty, does not parse as a URL,
    /// has no host, or uses a scheme other than http/https.
    pub fn parse(raw: &str, default_scheme: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_owned()
        } else {
            format!("{}://{}", default_scheme.trim(), trimmed)
        };
        let base = with_scheme.trim_end_matches('/');

        let parsed = Url::parse(base).map_err(|source| ConfigError::InvalidTarget {
            target: raw.to_owned(),
            source,
        })?;
        if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
            return Err(ConfigError::UnsupportedScheme {
                target: raw.to_owned(),
                scheme: parsed.scheme().to_owned(),
            });
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::TargetMissingHost {
                target: raw.to_owned(),
            });
        }

        Ok(Self {
            base: base.to_owned(),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Appends a path (with optional query) to the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the joined string is not a valid URL.
    pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}{}", self.base, normalize_path(path)))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// Trims and guarantees a leading `/`.
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{}", trimmed)
    }
}
