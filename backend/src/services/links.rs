//! Connection codes and shareable `/connect` links.
//!
//! A link looks like `<origin>/connect?code=<code>&user=<id>[&name=<display name>]`
//! and is also the payload rendered into the QR code. The code is
//! `<userId>_<issuedAtMillis>_<nonce>`; it is metadata only and is never
//! stored server-side.

use anyhow::Result;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::{Url, form_urlencoded};

use crate::constants::*;

static CODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<user>.+)_(?P<issued>\d+)_(?P<nonce>[0-9a-z]+)$")
        .expect("connection code regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCode {
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub nonce: String,
}

impl ConnectionCode {
    pub fn generate(user_id: &str) -> Self {
        Self::generate_at(user_id, Utc::now())
    }

    pub fn generate_at(user_id: &str, issued_at: DateTime<Utc>) -> Self {
        let mut rng = rand::rng();
        let nonce = (0..CODE_NONCE_LENGTH)
            .map(|_| CODE_NONCE_ALPHABET[rng.random_range(0..CODE_NONCE_ALPHABET.len())] as char)
            .collect();

        Self {
            user_id: user_id.to_string(),
            issued_at,
            nonce,
        }
    }

    /// Split a code back into its parts. User ids may contain `_`; the last two
    /// segments are always the timestamp and the nonce.
    pub fn decode(code: &str) -> Option<Self> {
        let captures = CODE_REGEX.captures(code)?;
        let millis = captures["issued"].parse::<i64>().ok()?;
        let issued_at = DateTime::from_timestamp_millis(millis)?;

        Some(Self {
            user_id: captures["user"].to_string(),
            issued_at,
            nonce: captures["nonce"].to_string(),
        })
    }

    pub fn is_issued_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

impl fmt::Display for ConnectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.user_id,
            CODE_SEPARATOR,
            self.issued_at.timestamp_millis(),
            CODE_SEPARATOR,
            self.nonce
        )
    }
}

/// Fresh opaque code for `user_id`. Two calls never return the same code.
pub fn generate_connection_code(user_id: &str) -> String {
    ConnectionCode::generate(user_id).to_string()
}

/// Fields recovered from a `/connect` link. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionLink {
    pub user_id: Option<String>,
    pub code: Option<String>,
    pub user_name: Option<String>,
}

impl ConnectionLink {
    /// A link is only worth acting on when it names the sharer and carries a code.
    pub fn is_actionable(&self) -> bool {
        self.user_id.is_some() && self.code.is_some()
    }
}

/// Extract `user`, `code` and `name` from a full URL or a `?query` suffix.
/// Never fails: anything unusable comes back as empty fields.
pub fn parse_connection_link(link: &str) -> ConnectionLink {
    let Some((_, query)) = link.trim().split_once('?') else {
        return ConnectionLink::default();
    };
    let query = query.split('#').next().unwrap_or_default();

    let mut parsed = ConnectionLink::default();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        // First occurrence wins.
        let slot = match &*key {
            CODE_PARAM => &mut parsed.code,
            USER_PARAM => &mut parsed.user_id,
            NAME_PARAM => &mut parsed.user_name,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    parsed
}

/// Builds shareable links on a fixed public origin.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    origin: Url,
}

impl LinkBuilder {
    pub fn new(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| anyhow::anyhow!("Invalid public origin {}: {}", origin, e))?;

        if !matches!(origin.scheme(), "http" | "https") || origin.host_str().is_none() {
            anyhow::bail!("Public origin must be an http(s) URL with a host, got {}", origin);
        }

        Ok(Self { origin })
    }

    pub fn origin(&self) -> String {
        self.origin.origin().ascii_serialization()
    }

    /// New link for `user_id` with a freshly generated code.
    pub fn create_shareable_link(&self, user_id: &str, user_name: Option<&str>) -> String {
        self.link_for_code(&ConnectionCode::generate(user_id), user_name)
    }

    /// QR payloads are the link itself.
    pub fn qr_code_data(&self, user_id: &str, user_name: Option<&str>) -> String {
        self.create_shareable_link(user_id, user_name)
    }

    pub fn link_for_code(&self, code: &ConnectionCode, user_name: Option<&str>) -> String {
        let mut url = self.origin.clone();
        url.set_path(CONNECT_PATH);
        url.set_fragment(None);
        url.set_query(None);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(CODE_PARAM, &code.to_string())
                .append_pair(USER_PARAM, &code.user_id);
            if let Some(name) = user_name.filter(|n| !n.is_empty()) {
                query.append_pair(NAME_PARAM, name);
            }
        }

        url.to_string()
    }
}
