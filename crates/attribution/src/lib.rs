//! Visitor attribution primitives.
//!
//! A visitor lands on a page carrying a campaign query parameter
//! (`?source=messekoeln`), browses, and eventually submits a signup form.
//! This crate decides which tag(s) that signup should carry: it normalizes
//! raw tag values, models the stored `{tags, timestamp}` payload that
//! survives the navigation from landing page to signup form, and walks an
//! ordered cascade of attribution sources until one yields a non-empty tag
//! set.
//!
//! Everything here is pure: the host environment is reached only through the
//! [`RequestContext`] trait, and the current time is always passed in.

pub mod context;
pub mod resolver;
pub mod store;
pub mod tags;

pub use context::{RequestContext, RequestSnapshot};
pub use resolver::{Resolution, TagSource, capture_page_view, extract_param_from_url, resolve};
pub use store::{
    COOKIE_RETENTION_SECS, SCRIPT_TAGS_COOKIE, SESSION_RETENTION_SECS, SESSION_TAGS_KEY,
    SUBMITTED_TAGS_FIELD, SUBMITTED_URL_FIELD, StoredTags, TAGS_COOKIE,
};
pub use tags::{normalize_tag, normalize_tags, split_tag_list};
