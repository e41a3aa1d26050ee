//! Minimal ActiveCampaign v3 API client.
//!
//! Covers exactly the surface the signup bridge needs: a connectivity check
//! (`GET /api/3/users/me`), contact upsert (`POST /api/3/contact/sync`), tag
//! creation with duplicate recovery (`POST /api/3/tags` +
//! `GET /api/3/tags?search=`), and contact-tag linking
//! (`POST /api/3/contactTags`). One attempt per call, fixed per-call timeout,
//! no retries.

pub mod client;
pub mod types;

pub use client::{
    AcClient, AcConfig, AcError, DEFAULT_TIMEOUT_SECS, LinkDisposition, SyncReport,
    TagCreateDisposition, is_valid_email,
};
pub use types::{AccountUser, ContactFields, TagRecord};
