use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use crate::context::RequestContext;
use crate::store::{
    COOKIE_RETENTION_SECS, SCRIPT_TAGS_COOKIE, SESSION_RETENTION_SECS, SESSION_TAGS_KEY,
    SUBMITTED_TAGS_FIELD, SUBMITTED_URL_FIELD, StoredTags, TAGS_COOKIE,
};
use crate::tags::{normalize_tags, split_tag_list};

/// Which attribution source supplied the tag set.
///
/// Ordered by priority; the resolver walks the variants top to bottom and
/// stops at the first source that yields a non-empty normalized tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    /// Configured query parameter on the current request.
    CurrentQuery,
    /// Parameter parsed out of the URL submitted as a hidden form field.
    SubmittedUrl,
    /// Raw comma-separated list submitted as a hidden form field.
    SubmittedTagList,
    /// Parameter parsed out of the raw `Referer` header.
    RefererHeader,
    /// Payload from the injector-script cookie, 7-day window.
    ScriptCookie,
    /// Payload from the server-set cookie, 7-day window.
    ServerCookie,
    /// Payload from the server-side session, 1-hour window.
    Session,
    /// Parameter parsed out of the host-resolved referrer.
    ResolvedReferer,
}

impl TagSource {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CurrentQuery => "current_query",
            Self::SubmittedUrl => "submitted_url",
            Self::SubmittedTagList => "submitted_tag_list",
            Self::RefererHeader => "referer_header",
            Self::ScriptCookie => "script_cookie",
            Self::ServerCookie => "server_cookie",
            Self::Session => "session",
            Self::ResolvedReferer => "resolved_referer",
        }
    }
}

/// A successful resolution: the normalized tag set and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tags: Vec<String>,
    pub source: TagSource,
}

struct SourceCx<'a> {
    ctx: &'a dyn RequestContext,
    param: &'a str,
    now: DateTime<Utc>,
}

const CASCADE: &[(TagSource, fn(&SourceCx<'_>) -> Option<Vec<String>>)] = &[
    (TagSource::CurrentQuery, from_current_query),
    (TagSource::SubmittedUrl, from_submitted_url),
    (TagSource::SubmittedTagList, from_submitted_tag_list),
    (TagSource::RefererHeader, from_referer_header),
    (TagSource::ScriptCookie, from_script_cookie),
    (TagSource::ServerCookie, from_server_cookie),
    (TagSource::Session, from_session),
    (TagSource::ResolvedReferer, from_resolved_referer),
];

/// Resolve the attribution tag set for a request.
///
/// Sources are probed in priority order; the first one producing a non-empty
/// normalized tag set wins, and sources are never merged. `None` means no
/// source carried a parameter-derived signal and the caller must skip
/// external sync entirely.
#[must_use]
pub fn resolve(
    ctx: &dyn RequestContext,
    param: &str,
    now: DateTime<Utc>,
) -> Option<Resolution> {
    if param.trim().is_empty() {
        return None;
    }

    let cx = SourceCx { ctx, param, now };
    for (source, probe) in CASCADE {
        let Some(raw) = probe(&cx) else { continue };
        let tags = normalize_tags(raw);
        if tags.is_empty() {
            continue;
        }
        debug!(source = source.label(), tags = ?tags, "attribution resolved");
        return Some(Resolution {
            tags,
            source: *source,
        });
    }
    debug!("no attribution signal in any source");
    None
}

/// Page-view write path: when the current URL carries the configured
/// parameter, produce the payload the host should persist into session and
/// cookie storage so the signal survives until the signup form.
#[must_use]
pub fn capture_page_view(
    ctx: &dyn RequestContext,
    param: &str,
    now: DateTime<Utc>,
) -> Option<StoredTags> {
    if param.trim().is_empty() {
        return None;
    }
    let cx = SourceCx { ctx, param, now };
    let tags = normalize_tags(from_current_query(&cx)?);
    if tags.is_empty() {
        return None;
    }
    Some(StoredTags::new(tags, now))
}

/// Extract the configured parameter's value from an absolute URL string.
#[must_use]
pub fn extract_param_from_url(raw: &str, param: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    url.query_pairs()
        .find(|(key, value)| key == param && !value.trim().is_empty())
        .map(|(_, value)| value.into_owned())
}

fn from_current_query(cx: &SourceCx<'_>) -> Option<Vec<String>> {
    let value = cx.ctx.query_param(cx.param)?;
    if value.trim().is_empty() {
        return None;
    }
    Some(vec![value])
}

fn from_submitted_url(cx: &SourceCx<'_>) -> Option<Vec<String>> {
    let submitted = cx.ctx.form_field(SUBMITTED_URL_FIELD)?;
    extract_param_from_url(&submitted, cx.param).map(|value| vec![value])
}

fn from_submitted_tag_list(cx: &SourceCx<'_>) -> Option<Vec<String>> {
    let raw = cx.ctx.form_field(SUBMITTED_TAGS_FIELD)?;
    let tags = split_tag_list(&raw);
    if tags.is_empty() { None } else { Some(tags) }
}

fn from_referer_header(cx: &SourceCx<'_>) -> Option<Vec<String>> {
    let referer = cx.ctx.referer_header()?;
    extract_param_from_url(&referer, cx.param).map(|value| vec![value])
}

fn from_script_cookie(cx: &SourceCx<'_>) -> Option<Vec<String>> {
    stored_cookie_tags(cx, SCRIPT_TAGS_COOKIE)
}

fn from_server_cookie(cx: &SourceCx<'_>) -> Option<Vec<String>> {
    stored_cookie_tags(cx, TAGS_COOKIE)
}

fn from_session(cx: &SourceCx<'_>) -> Option<Vec<String>> {
    let raw = cx.ctx.session_value(SESSION_TAGS_KEY)?;
    let stored = StoredTags::parse(&raw)?;
    let fresh = stored.fresh_tags(cx.now, SESSION_RETENTION_SECS);
    if fresh.is_none() {
        debug!("session payload expired (older than one hour)");
    }
    fresh
}

fn from_resolved_referer(cx: &SourceCx<'_>) -> Option<Vec<String>> {
    let referer = cx
        .ctx
        .resolved_referer()
        .or_else(|| cx.ctx.referer_header())?;
    extract_param_from_url(&referer, cx.param).map(|value| vec![value])
}

fn stored_cookie_tags(cx: &SourceCx<'_>, cookie: &str) -> Option<Vec<String>> {
    let raw = cx.ctx.cookie(cookie)?;
    // Cookie values arrive percent-encoded from the client; decode before
    // parsing, falling back to the raw value for hosts that already decode.
    let decoded = urlencoding::decode(&raw)
        .map(|value| value.into_owned())
        .unwrap_or(raw);
    let stored = StoredTags::parse(&decoded)?;
    let fresh = stored.fresh_tags(cx.now, COOKIE_RETENTION_SECS);
    if fresh.is_none() {
        debug!(cookie, "cookie payload expired (older than seven days)");
    }
    fresh
}
