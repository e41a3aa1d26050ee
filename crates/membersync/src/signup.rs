use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use activecampaign::{AcClient, AcError, SyncReport};
use attribution::{RequestContext, normalize_tags, resolve};

use crate::capture::ClearDirectives;
use crate::config::Config;

/// The membership system's "signup completed" signal, reduced to the fields
/// this integration needs.
#[derive(Debug, Clone)]
pub struct SignupEvent {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Seam over the external contact-sync call so the pipeline can be exercised
/// without a live API.
#[async_trait]
pub trait ContactSync: Send + Sync {
    async fn sync(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        tags: &[String],
    ) -> Result<SyncReport, AcError>;
}

#[async_trait]
impl ContactSync for AcClient {
    async fn sync(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        tags: &[String],
    ) -> Result<SyncReport, AcError> {
        AcClient::sync(self, email, first_name, last_name, tags).await
    }
}

/// What happened to one signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No source in the cascade carried a parameter-derived signal. An
    /// intentional skip, not an error.
    Skipped,
    Synced {
        contact_id: String,
        applied_tags: Vec<String>,
        failed_tags: Vec<String>,
    },
    /// The sync call failed; logged and contained here so the membership
    /// signup itself is never interrupted.
    Failed { message: String },
}

/// Pipeline result: the outcome plus the state-clearing directives the host
/// must apply in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupReceipt {
    pub outcome: Outcome,
    pub clear: ClearDirectives,
}

/// Handles one signup: resolve attribution, sync the contact, clear state.
pub struct SignupPipeline<C> {
    url_param_name: String,
    tag_prefix: Option<String>,
    client: C,
}

impl<C: ContactSync> SignupPipeline<C> {
    #[must_use]
    pub fn new(config: &Config, client: C) -> Self {
        Self {
            url_param_name: config.url_param_name.clone(),
            tag_prefix: config.tag_prefix.clone(),
            client,
        }
    }

    pub async fn handle(
        &self,
        ctx: &dyn RequestContext,
        event: &SignupEvent,
        now: DateTime<Utc>,
    ) -> SignupReceipt {
        let Some(resolution) = resolve(ctx, &self.url_param_name, now) else {
            info!(email = %event.email, "no attribution signal, skipping contact sync");
            return SignupReceipt {
                outcome: Outcome::Skipped,
                clear: ClearDirectives::all(),
            };
        };

        let tags = self.prefixed(resolution.tags);
        info!(
            email = %event.email,
            source = resolution.source.label(),
            tags = ?tags,
            "attribution resolved for signup"
        );

        let outcome = match self
            .client
            .sync(&event.email, &event.first_name, &event.last_name, &tags)
            .await
        {
            Ok(report) => Outcome::Synced {
                contact_id: report.contact_id,
                applied_tags: report.applied_tags,
                failed_tags: report.failed_tags,
            },
            Err(sync_error) => {
                error!(email = %event.email, error = %sync_error, "contact sync failed");
                Outcome::Failed {
                    message: sync_error.to_string(),
                }
            }
        };

        SignupReceipt {
            outcome,
            clear: ClearDirectives::all(),
        }
    }

    fn prefixed(&self, tags: Vec<String>) -> Vec<String> {
        match &self.tag_prefix {
            Some(prefix) => normalize_tags(tags.iter().map(|tag| format!("{prefix}{tag}"))),
            None => tags,
        }
    }
}
