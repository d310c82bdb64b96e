// Copyright 2025 bakri (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Security-focused payload validation
//!
//! Scanned payloads are untrusted: anyone can print a QR code. Before a
//! payload is opened, recorded or turned back into an image it must:
//! - Parse as a URL (bare hosts get `https://` prepended)
//! - Use a scheme from the safe list (`http`/`https` by default)
//! - Carry a host
//! - Pass the user's domain policy (blocklist, then allowlist)
//!
//! # Security Philosophy
//! Schemes are WHITELISTED: `javascript:`, `file:`, `data:` and `mailto:`
//! payloads are refused, with or without `//`. Only payloads with no scheme
//! at all get `https://` prepended; `host:port` is not mistaken for a scheme. Domain matching is a case-insensitive substring match,
//! so `example.com` also covers `sub.example.com`.

use thiserror::Error;
use url::Url;

/// Validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Payload is empty or whitespace
    #[error("Empty URL")]
    Empty,

    /// Payload is not a parseable URL
    #[error("Invalid URL format: '{0}'")]
    Malformed(String),

    /// Scheme not in the safe list
    #[error("Unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    /// URL has no host component
    #[error("URL has no valid hostname: '{0}'")]
    MissingHost(String),

    /// Host matched a blocklist entry
    #[error("Domain '{0}' is blocked")]
    Blocked(String),

    /// Allowlist is non-empty and the host matched none of it
    #[error("Domain '{0}' is not in your allowlist")]
    NotAllowed(String),
}

/// Schemes accepted when no list is configured
pub const DEFAULT_SAFE_SCHEMES: &[&str] = &["http", "https"];

/// Prepends `https://` to payloads without a scheme
///
/// # Example
/// ```
/// use openqr::core::validator::normalize_url;
///
/// assert_eq!(normalize_url("example.com"), "https://example.com");
/// assert_eq!(normalize_url("example.com:8080"), "https://example.com:8080");
/// assert_eq!(normalize_url("http://example.com"), "http://example.com");
/// assert_eq!(normalize_url("mailto:a@b.c"), "mailto:a@b.c");
/// ```
pub fn normalize_url(input: &str) -> String {
    let input = input.trim();
    if input.contains("://") || leading_scheme(input).is_some() {
        input.to_string()
    } else {
        format!("https://{input}")
    }
}

/// Scheme of a `scheme:rest` payload that has no `//`
///
/// A digit after the colon reads as a port (`localhost:8080`), not a scheme.
fn leading_scheme(input: &str) -> Option<&str> {
    let (head, rest) = input.split_once(':')?;

    let mut chars = head.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let scheme_chars = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let port_follows = rest.starts_with(|c: char| c.is_ascii_digit());

    (starts_alpha && scheme_chars && !port_follows).then_some(head)
}

/// Normalises and parses a payload, enforcing the scheme whitelist
pub fn validate_url<S: AsRef<str>>(input: &str, safe_schemes: &[S]) -> Result<Url, ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let full = normalize_url(input);
    let parsed = Url::parse(&full).map_err(|_| ValidationError::Malformed(input.to_string()))?;

    let scheme = parsed.scheme();
    if !safe_schemes
        .iter()
        .any(|s| s.as_ref().eq_ignore_ascii_case(scheme))
    {
        return Err(ValidationError::UnsupportedScheme(scheme.to_string()));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(ValidationError::MissingHost(input.to_string())),
    }
}

/// User-configured domain allow/block lists
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomainPolicy {
    allowlist: Vec<String>,
    blocklist: Vec<String>,
}

impl DomainPolicy {
    /// Builds a policy; entries are lowercased and blank entries dropped
    pub fn new<I, J, S, T>(allowlist: I, blocklist: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            allowlist: normalize_list(allowlist),
            blocklist: normalize_list(blocklist),
        }
    }

    /// Checks a parsed URL, returning its lowercased host
    ///
    /// The blocklist always wins; an empty allowlist allows everything.
    pub fn check(&self, url: &Url) -> Result<String, ValidationError> {
        let host = url
            .host_str()
            .ok_or_else(|| ValidationError::MissingHost(url.to_string()))?
            .to_lowercase();

        if matches_list(&host, &self.blocklist) {
            return Err(ValidationError::Blocked(host));
        }

        if !self.allowlist.is_empty() && !matches_list(&host, &self.allowlist) {
            return Err(ValidationError::NotAllowed(host));
        }

        Ok(host)
    }

    /// True when `host` matches a non-empty allowlist and is not blocked
    pub fn is_allowlisted(&self, host: &str) -> bool {
        !self.allowlist.is_empty()
            && matches_list(host, &self.allowlist)
            && !matches_list(host, &self.blocklist)
    }

    /// Whether a checked host may be opened without asking
    ///
    /// Allowlisted hosts always open; any other host only when `auto_open`
    /// is on. Blocked hosts never open.
    pub fn should_open(&self, host: &str, auto_open: bool) -> bool {
        if matches_list(host, &self.blocklist) {
            return false;
        }
        auto_open || self.is_allowlisted(host)
    }

    /// Validates a raw payload and applies the policy in one step
    pub fn check_payload<S: AsRef<str>>(
        &self,
        payload: &str,
        safe_schemes: &[S],
    ) -> Result<(Url, String), ValidationError> {
        let url = validate_url(payload, safe_schemes)?;
        let host = self.check(&url)?;
        Ok((url, host))
    }
}

fn normalize_list<I, S>(list: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    list.into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Case-insensitive substring match of `host` against any entry
pub fn matches_list(host: &str, list: &[String]) -> bool {
    let host = host.to_lowercase();
    list.iter().any(|entry| host.contains(entry.as_str()))
}
