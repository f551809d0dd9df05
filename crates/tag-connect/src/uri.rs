//! Reader endpoint URIs
//!
//! Sample clients address readers with scheme-qualified URIs:
//!
//! - `tmr:///dev/ttyUSB0` or `tmr:///COM4` - serial-attached module
//!   (three slashes, local device path)
//! - `tmr://10.11.115.32` - network-attached reader
//! - `sim://m6e?tags=8&baud=9600` - simulated reader for hardware-free
//!   runs and tests
//!
//! Only the scheme and coarse transport class are interpreted here; the
//! target is handed to whichever driver owns the scheme.

use std::fmt;

use crate::error::ConnectError;

/// Coarse endpoint class derived from the URI shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriScheme {
    /// Local serial device path
    Serial,
    /// Network host
    Network,
    /// Simulated reader
    Sim,
}

/// A parsed reader endpoint address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderUri {
    raw: String,
    scheme: UriScheme,
    target: String,
    params: Vec<(String, String)>,
}

impl ReaderUri {
    /// Parse a scheme-qualified endpoint address
    pub fn parse(raw: &str) -> Result<Self, ConnectError> {
        let invalid = |reason| ConnectError::InvalidUri {
            uri: raw.to_string(),
            reason,
        };

        let (scheme_str, rest) = raw
            .split_once("://")
            .ok_or_else(|| invalid("missing '://' separator"))?;

        let (target_str, query) = match rest.split_once('?') {
            Some((t, q)) => (t, Some(q)),
            None => (rest, None),
        };

        if target_str.is_empty() {
            return Err(invalid("empty target"));
        }

        let scheme = match scheme_str {
            // Three slashes mean a local device path, two a remote host
            "tmr" if target_str.starts_with('/') => UriScheme::Serial,
            "tmr" => UriScheme::Network,
            "sim" => UriScheme::Sim,
            _ => return Err(invalid("unrecognized scheme")),
        };

        let mut params = Vec::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some((k, v)) => params.push((k.to_string(), v.to_string())),
                    None => return Err(invalid("malformed query parameter")),
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            scheme,
            target: target_str.to_string(),
            params,
        })
    }

    /// The URI exactly as given
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Endpoint class
    pub fn scheme(&self) -> UriScheme {
        self.scheme
    }

    /// Device path, host, or simulator model
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Look up a query parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ReaderUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
