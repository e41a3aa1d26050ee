use std::collections::HashMap;

/// Read-only view of the HTTP request the resolver runs against.
///
/// The host environment (web framework, plugin runtime, test harness) owns
/// the actual request; this trait is the only way attribution logic reaches
/// it, so resolution stays deterministic without a live server.
pub trait RequestContext {
    /// Value of a query parameter on the current request URL.
    fn query_param(&self, name: &str) -> Option<String>;

    /// Value of a submitted form field (POST body).
    fn form_field(&self, name: &str) -> Option<String>;

    /// Value of a request cookie, as sent by the client.
    fn cookie(&self, name: &str) -> Option<String>;

    /// Value stored in the visitor's server-side session.
    fn session_value(&self, key: &str) -> Option<String>;

    /// The raw `Referer` request header.
    fn referer_header(&self) -> Option<String>;

    /// The referrer as resolved by the host environment itself, which may
    /// consult more than the raw header (internal redirects, stripped
    /// headers). Distinct from [`RequestContext::referer_header`].
    fn resolved_referer(&self) -> Option<String>;
}

/// Owned snapshot of a request, used by the service glue and by tests.
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    cookies: HashMap<String, String>,
    session: HashMap<String, String>,
    referer: Option<String>,
    resolved_referer: Option<String>,
}

impl RequestSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_session_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    #[must_use]
    pub fn with_resolved_referer(mut self, referer: impl Into<String>) -> Self {
        self.resolved_referer = Some(referer.into());
        self
    }
}

impl RequestContext for RequestSnapshot {
    fn query_param(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn form_field(&self, name: &str) -> Option<String> {
        self.form.get(name).cloned()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn session_value(&self, key: &str) -> Option<String> {
        self.session.get(key).cloned()
    }

    fn referer_header(&self) -> Option<String> {
        self.referer.clone()
    }

    fn resolved_referer(&self) -> Option<String> {
        self.resolved_referer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{RequestContext, RequestSnapshot};

    #[test]
    fn snapshot_round_trips_all_fields() {
        let snapshot = RequestSnapshot::new()
            .with_query_param("source", "messekoeln")
            .with_form_field("msync_url", "https://example.com/?source=x")
            .with_cookie("msync_tags", "{}")
            .with_session_value("msync_tags", "{}")
            .with_referer("https://example.com/a")
            .with_resolved_referer("https://example.com/b");

        assert_eq!(
            snapshot.query_param("source"),
            Some("messekoeln".to_string())
        );
        assert_eq!(
            snapshot.form_field("msync_url"),
            Some("https://example.com/?source=x".to_string())
        );
        assert_eq!(snapshot.cookie("msync_tags"), Some("{}".to_string()));
        assert_eq!(snapshot.session_value("msync_tags"), Some("{}".to_string()));
        assert_eq!(
            snapshot.referer_header(),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(
            snapshot.resolved_referer(),
            Some("https://example.com/b".to_string())
        );
    }

    #[test]
    fn empty_snapshot_reports_nothing() {
        let snapshot = RequestSnapshot::new();
        assert!(snapshot.query_param("source").is_none());
        assert!(snapshot.referer_header().is_none());
        assert!(snapshot.resolved_referer().is_none());
    }
}
