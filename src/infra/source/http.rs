//! HTTP sample source.
//!
//! `GET {base_url}/{group}/{number}`, or `GET {base_url}/{source_ref}` when the
//! event carries a source reference. The body is a JSON array of
//! `{"name": ..., "value": ...}` objects in display order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::core::{ConfigError, Event, JobError, SampleSource};

const USER_AGENT: &str = concat!("odds-sampler/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct WireSample {
    name: String,
    #[serde(alias = "odds")]
    value: serde_json::Value,
}

/// Sample source backed by a JSON HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpSampleSource {
    client: Client,
    base_url: Url,
}

impl HttpSampleSource {
    /// Build a source for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] when the URL is empty, is not
    /// a hierarchical `http(s)` URL, or the HTTP client cannot be constructed.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "source.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        let base_url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidSetting {
            key: "source.base_url",
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidSetting {
                key: "source.base_url",
                reason: format!("`{base_url}` cannot carry a path"),
            });
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ConfigError::InvalidSetting {
                key: "source.base_url",
                reason: e.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    /// URL requested for `event`. Group, number and source reference are
    /// each appended as one percent-encoded path segment.
    #[must_use]
    pub fn url_for(&self, event: &Event) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so the segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            match &event.source_ref {
                Some(source_ref) => {
                    segments.push(source_ref.trim_start_matches('/'));
                }
                None => {
                    segments.push(&event.id.group).push(&event.id.number);
                }
            }
        }
        url
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn fetch_current_samples(&self, event: &Event) -> Result<Vec<(String, String)>, JobError> {
        let url = self.url_for(event);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| JobError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobError::Fetch(format!("{url}: HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| JobError::Fetch(format!("{url}: {e}")))?;
        let samples = decode_samples(&body)?;
        debug!(event = %event.id, url = %url, samples = samples.len(), "samples fetched");
        Ok(samples)
    }
}

/// Decode a response body into `(name, value)` pairs.
///
/// # Errors
///
/// Returns [`JobError::Malformed`] when the body is not the expected JSON shape.
pub fn decode_samples(body: &[u8]) -> Result<Vec<(String, String)>, JobError> {
    let wire: Vec<WireSample> =
        serde_json::from_slice(body).map_err(|e| JobError::Malformed(e.to_string()))?;
    Ok(wire
        .into_iter()
        .map(|s| {
            let value = match s.value {
                serde_json::Value::String(v) => v,
                other => other.to_string(),
            };
            (s.name.trim().to_string(), value.trim().to_string())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventId;
    use crate::util::stamp::parse_minute_stamp;

    fn source() -> HttpSampleSource {
        HttpSampleSource::new("http://localhost:8080/odds/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_without_source_ref() {
        let event = Event::new(EventId::new("kokura", "3"), parse_minute_stamp("202203041000").unwrap());
        assert_eq!(source().url_for(&event).as_str(), "http://localhost:8080/odds/kokura/3");
    }

    #[test]
    fn test_url_with_source_ref() {
        let event = Event::new(EventId::new("kokura", "3"), parse_minute_stamp("202203041000").unwrap())
            .with_source_ref("pw151ou1010");
        assert_eq!(source().url_for(&event).as_str(), "http://localhost:8080/odds/pw151ou1010");
    }

    #[test]
    fn test_url_segments_are_percent_encoded() {
        let at = parse_minute_stamp("202203041000").unwrap();
        let event = Event::new(EventId::new("kokura/../admin", "3?x=1#y"), at);
        assert_eq!(
            source().url_for(&event).as_str(),
            "http://localhost:8080/odds/kokura%2F..%2Fadmin/3%3Fx=1%23y"
        );

        let event = Event::new(EventId::new("kokura", "3"), at).with_source_ref("a/b");
        assert_eq!(source().url_for(&event).as_str(), "http://localhost:8080/odds/a%2Fb");
    }

    #[test]
    fn test_base_url_without_path_is_extended() {
        let source = HttpSampleSource::new("http://localhost:8080", Duration::from_secs(5)).unwrap();
        let event = Event::new(EventId::new("kokura", "3"), parse_minute_stamp("202203041000").unwrap());
        assert_eq!(source.url_for(&event).as_str(), "http://localhost:8080/kokura/3");
    }

    #[test]
    fn test_unparseable_base_url_rejected() {
        let err = HttpSampleSource::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "source.base_url", .. }));
        let err = HttpSampleSource::new("mailto:odds@example.com", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "source.base_url", .. }));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let err = HttpSampleSource::new("/", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "source.base_url", .. }));
    }

    #[test]
    fn test_decode_accepts_strings_numbers_and_odds_alias() {
        let body = br#"[{"name": " Runner A ", "value": "7.7"}, {"name": "Runner B", "odds": 17.0}]"#;
        let samples = decode_samples(body).unwrap();
        assert_eq!(
            samples,
            vec![
                ("Runner A".to_string(), "7.7".to_string()),
                ("Runner B".to_string(), "17.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(matches!(decode_samples(b"{\"name\": 1}"), Err(JobError::Malformed(_))));
        assert!(matches!(decode_samples(b"<html>"), Err(JobError::Malformed(_))));
    }
}
