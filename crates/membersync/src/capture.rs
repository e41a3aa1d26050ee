use chrono::{DateTime, Utc};
use tracing::debug;

use attribution::{
    COOKIE_RETENTION_SECS, RequestContext, SCRIPT_TAGS_COOKIE, SESSION_TAGS_KEY, StoredTags,
    TAGS_COOKIE, capture_page_view,
};

/// Attribution cookies are scoped to the whole site.
pub const COOKIE_PATH: &str = "/";

/// A cookie write for the host to emit as a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: &'static str,
    /// Percent-encoded payload; empty when expiring the cookie.
    pub value: String,
    pub max_age_secs: i64,
    pub path: &'static str,
}

impl SetCookie {
    #[must_use]
    pub fn stored(name: &'static str, payload: &StoredTags) -> Self {
        Self {
            name,
            value: urlencoding::encode(&payload.to_json()).into_owned(),
            max_age_secs: COOKIE_RETENTION_SECS,
            path: COOKIE_PATH,
        }
    }

    /// An expiring write that removes the cookie on the client.
    #[must_use]
    pub fn expired(name: &'static str) -> Self {
        Self {
            name,
            value: String::new(),
            max_age_secs: 0,
            path: COOKIE_PATH,
        }
    }

    #[must_use]
    pub fn header_value(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path={}",
            self.name, self.value, self.max_age_secs, self.path
        )
    }
}

/// A session write for the host to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWrite {
    pub key: &'static str,
    pub value: String,
}

/// Everything the host must persist after a qualifying page view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifacts {
    pub payload: StoredTags,
    pub session: SessionWrite,
    pub cookie: SetCookie,
}

/// Directives that drop stored attribution state once it has been consumed
/// (or skipped) at signup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearDirectives {
    pub session_keys: Vec<&'static str>,
    pub cookies: Vec<SetCookie>,
}

impl ClearDirectives {
    #[must_use]
    pub fn all() -> Self {
        Self {
            session_keys: vec![SESSION_TAGS_KEY],
            cookies: vec![
                SetCookie::expired(TAGS_COOKIE),
                SetCookie::expired(SCRIPT_TAGS_COOKIE),
            ],
        }
    }
}

/// Page-view write path.
///
/// When the current request carries the configured parameter, returns the
/// session and cookie writes that persist the signal until the signup form;
/// `None` on every other page view.
#[must_use]
pub fn capture(
    ctx: &dyn RequestContext,
    param: &str,
    now: DateTime<Utc>,
) -> Option<CaptureArtifacts> {
    let payload = capture_page_view(ctx, param, now)?;
    debug!(tags = ?payload.tags, "attribution signal captured on page view");
    let json = payload.to_json();
    Some(CaptureArtifacts {
        session: SessionWrite {
            key: SESSION_TAGS_KEY,
            value: json,
        },
        cookie: SetCookie::stored(TAGS_COOKIE, &payload),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use attribution::{RequestSnapshot, SCRIPT_TAGS_COOKIE, StoredTags, TAGS_COOKIE};

    use super::{COOKIE_PATH, CaptureArtifacts, ClearDirectives, SetCookie, capture};

    #[test]
    fn capture_produces_matching_session_and_cookie_writes() {
        let now = Utc::now();
        let ctx = RequestSnapshot::new().with_query_param("source", "Messekoeln");

        let artifacts = capture(&ctx, "source", now);
        let CaptureArtifacts {
            payload,
            session,
            cookie,
        } = match artifacts {
            Some(artifacts) => artifacts,
            None => {
                assert!(false, "capture should fire");
                return;
            }
        };

        assert_eq!(payload.tags, vec!["messekoeln".to_string()]);
        assert_eq!(payload.timestamp, now.timestamp());
        assert_eq!(session.key, "msync_tags");
        assert_eq!(StoredTags::parse(&session.value), Some(payload.clone()));
        assert_eq!(cookie.name, TAGS_COOKIE);
        assert_eq!(cookie.max_age_secs, 7 * 24 * 60 * 60);
        assert_eq!(cookie.path, COOKIE_PATH);
    }

    #[test]
    fn capture_is_silent_without_the_parameter() {
        let ctx = RequestSnapshot::new();
        assert_eq!(capture(&ctx, "source", Utc::now()), None);
    }

    #[test]
    fn cookie_header_value_is_well_formed() {
        let now = Utc::now();
        let payload = StoredTags::new(vec!["messekoeln".to_string()], now);
        let cookie = SetCookie::stored(TAGS_COOKIE, &payload);
        let header = cookie.header_value();

        assert!(header.starts_with("msync_tags="));
        assert!(header.ends_with("; Path=/"));
        assert!(header.contains("Max-Age=604800"));
        // The JSON payload must be percent-encoded into a single token.
        assert!(!cookie.value.contains('{'));
        assert!(!cookie.value.contains('"'));
        assert!(!cookie.value.contains(' '));
    }

    #[test]
    fn expired_cookie_clears_the_value() {
        let cookie = SetCookie::expired(SCRIPT_TAGS_COOKIE);
        assert_eq!(
            cookie.header_value(),
            "msync_tags_js=; Max-Age=0; Path=/"
        );
    }

    #[test]
    fn clear_directives_cover_both_cookies_and_the_session_key() {
        let clear = ClearDirectives::all();
        assert_eq!(clear.session_keys, vec!["msync_tags"]);
        assert_eq!(
            clear.cookies,
            vec![
                SetCookie::expired(TAGS_COOKIE),
                SetCookie::expired(SCRIPT_TAGS_COOKIE),
            ]
        );
    }
}
