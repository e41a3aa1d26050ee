//! MemberSync service glue.
//!
//! Wires the attribution resolver and the ActiveCampaign client into the two
//! host-facing operations: capturing an attribution signal on a page view,
//! and syncing a contact (with its resolved tags) when a membership signup
//! completes. Configuration comes from the environment once, at load time;
//! the host applies the storage writes and clears this crate hands back.

pub mod capture;
pub mod config;
pub mod signup;

pub use capture::{CaptureArtifacts, ClearDirectives, SessionWrite, SetCookie, capture};
pub use config::Config;
pub use signup::{ContactSync, Outcome, SignupEvent, SignupPipeline, SignupReceipt};
