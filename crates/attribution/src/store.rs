use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cookie written by the server on a qualifying page view.
pub const TAGS_COOKIE: &str = "msync_tags";
/// Cookie maintained by the client-side injector script.
pub const SCRIPT_TAGS_COOKIE: &str = "msync_tags_js";
/// Session entry written alongside the server cookie.
pub const SESSION_TAGS_KEY: &str = "msync_tags";
/// Hidden form field carrying the URL of the page the form was submitted from.
pub const SUBMITTED_URL_FIELD: &str = "msync_url";
/// Hidden form field carrying a raw comma-separated tag list.
pub const SUBMITTED_TAGS_FIELD: &str = "msync_tags";

/// Cookie payloads are honored for seven days after capture.
pub const COOKIE_RETENTION_SECS: i64 = 7 * 24 * 60 * 60;
/// Session payloads are honored for one hour after capture.
pub const SESSION_RETENTION_SECS: i64 = 60 * 60;

/// The `{tags, timestamp}` payload persisted across the navigation from
/// landing page to signup form.
///
/// Expiry is never enforced by active eviction; it is checked at read time
/// against the retention window of whichever store the payload came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTags {
    pub tags: Vec<String>,
    /// Capture time, unix seconds. A missing timestamp deserializes to zero
    /// and therefore always reads as expired.
    #[serde(default)]
    pub timestamp: i64,
}

impl StoredTags {
    #[must_use]
    pub fn new(tags: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            tags,
            timestamp: now.timestamp(),
        }
    }

    /// Parse a stored payload from its JSON form.
    ///
    /// Unknown fields (the injector script also records the page URL) are
    /// ignored. Returns `None` for anything that does not decode to a
    /// payload with a tag array.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Whether the payload is still within its retention window.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, retention_secs: i64) -> bool {
        now.timestamp() - self.timestamp <= retention_secs
    }

    /// The tag set, provided the payload is still fresh.
    #[must_use]
    pub fn fresh_tags(&self, now: DateTime<Utc>, retention_secs: i64) -> Option<Vec<String>> {
        if !self.is_fresh(now, retention_secs) {
            return None;
        }
        if self.tags.is_empty() {
            return None;
        }
        Some(self.tags.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{COOKIE_RETENTION_SECS, SESSION_RETENTION_SECS, StoredTags};

    #[test]
    fn payload_round_trips_through_json() {
        let now = Utc::now();
        let stored = StoredTags::new(vec!["messekoeln".to_string()], now);
        let parsed = StoredTags::parse(&stored.to_json());
        assert_eq!(parsed, Some(stored));
    }

    #[test]
    fn parse_ignores_extra_fields_from_the_injector_script() {
        let parsed = StoredTags::parse(
            r#"{"tags":["messekoeln"],"timestamp":1700000000,"url":"https://example.com/?source=messekoeln"}"#,
        );
        assert_eq!(
            parsed,
            Some(StoredTags {
                tags: vec!["messekoeln".to_string()],
                timestamp: 1_700_000_000,
            })
        );
    }

    #[test]
    fn parse_rejects_malformed_payloads() {
        assert!(StoredTags::parse("").is_none());
        assert!(StoredTags::parse("not json").is_none());
        assert!(StoredTags::parse(r#"{"timestamp":1}"#).is_none());
        assert!(StoredTags::parse(r#"{"tags":"messekoeln"}"#).is_none());
    }

    #[test]
    fn missing_timestamp_reads_as_expired() {
        let parsed = StoredTags::parse(r#"{"tags":["messekoeln"]}"#);
        let stored = match parsed {
            Some(stored) => stored,
            None => {
                assert!(false, "payload should parse");
                return;
            }
        };
        assert_eq!(stored.timestamp, 0);
        assert!(stored.fresh_tags(Utc::now(), COOKIE_RETENTION_SECS).is_none());
    }

    #[test]
    fn cookie_window_accepts_payloads_up_to_seven_days_old() {
        let now = Utc::now();
        let stored = StoredTags::new(vec!["messekoeln".to_string()], now);

        let just_inside = now + Duration::seconds(COOKIE_RETENTION_SECS);
        assert!(stored.fresh_tags(just_inside, COOKIE_RETENTION_SECS).is_some());

        let just_outside = now + Duration::seconds(COOKIE_RETENTION_SECS + 1);
        assert!(stored.fresh_tags(just_outside, COOKIE_RETENTION_SECS).is_none());
    }

    #[test]
    fn session_window_accepts_payloads_up_to_one_hour_old() {
        let now = Utc::now();
        let stored = StoredTags::new(vec!["messekoeln".to_string()], now);

        let just_inside = now + Duration::seconds(SESSION_RETENTION_SECS);
        assert!(stored.fresh_tags(just_inside, SESSION_RETENTION_SECS).is_some());

        let just_outside = now + Duration::seconds(SESSION_RETENTION_SECS + 1);
        assert!(stored.fresh_tags(just_outside, SESSION_RETENTION_SECS).is_none());
    }

    #[test]
    fn empty_tag_sets_are_never_fresh() {
        let now = Utc::now();
        let stored = StoredTags::new(Vec::new(), now);
        assert!(stored.fresh_tags(now, SESSION_RETENTION_SECS).is_none());
    }
}
