//! # External name resolution
//!
//! Last resort of the [`CentralObjectTracker`](crate::tracker::CentralObjectTracker): ask an
//! online object database for the position of a name no local source knows.
//!
//! [`SesameResolver`] queries the CDS Sesame service with a blocking [`ureq::Agent`] whose
//! global timeout bounds the whole request, so a dead network costs at most that delay.
//! The response is a plain-text report; the position is read from its `%J` line:
//!
//! ```text
//! %J 010.68470833 +41.26875000 = 00:42:44.33 +41:16:07.5
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;
use ureq::Agent;

use crate::config::ResolverConfig;
use crate::ref_system::SkyPosition;
use crate::skychart_errors::ResolutionError;

static J2000_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^%J\s+([+-]?\d+(?:\.\d*)?)\s+([+-]?\d+(?:\.\d*)?)").expect("static regex")
});

pub trait NameResolver: Send + Sync {
    /// Equatorial J2000 position of `name`.
    fn resolve(&self, name: &str) -> Result<SkyPosition, ResolutionError>;
}

#[derive(Debug, Clone)]
pub struct SesameResolver {
    http_client: Agent,
    base_url: String,
}

impl SesameResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        SesameResolver {
            http_client: config.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            config.sesame_url.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    fn query_url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, encode_query(name))
    }
}

impl NameResolver for SesameResolver {
    fn resolve(&self, name: &str) -> Result<SkyPosition, ResolutionError> {
        let url = self.query_url(name);
        debug!(%url, "querying Sesame");

        let body = self
            .http_client
            .get(&url)
            .call()
            .and_then(|mut response| response.body_mut().read_to_string())
            .map_err(|err| match err {
                ureq::Error::Timeout(_) => ResolutionError::Timeout(name.to_string()),
                other => ResolutionError::ExternalService(other.to_string()),
            })?;

        parse_sesame(&body).ok_or_else(|| ResolutionError::NotFound(name.to_string()))
    }
}

/// Percent-encode everything but unreserved characters.
fn encode_query(name: &str) -> String {
    name.trim()
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Position from the first `%J` line of a Sesame report, if any.
pub fn parse_sesame(body: &str) -> Option<SkyPosition> {
    let caps = J2000_LINE.captures(body)?;
    let ra: f64 = caps[1].parse().ok()?;
    let dec: f64 = caps[2].parse().ok()?;
    if !(-90.0..=90.0).contains(&dec) {
        return None;
    }
    Some(SkyPosition::from_degrees(ra, dec))
}
