use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{
    AccountInfoResponse, AccountUser, ApiErrorEntry, ContactFields, ContactSyncRequest,
    ContactSyncResponse, ContactTagFields, ContactTagRequest, ErrorsBody, TagCreateRequest,
    TagCreateResponse, TagFields, TagRecord, TagSearchResponse,
};

/// Fixed per-call timeout; there is exactly one attempt per call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct AcConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout_secs: u64,
}

impl AcConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Error)]
pub enum AcError {
    #[error("activecampaign_not_configured")]
    NotConfigured,
    #[error("invalid_input:{reason}")]
    InvalidInput { reason: String },
    #[error("request_failed:{message}")]
    Request { message: String },
    #[error("http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("json_decode_failed:{message}")]
    Decode { message: String },
    #[error("contact_id_missing_in_response")]
    MissingContactId,
    #[error("tag_id_unresolved:{tag}")]
    TagUnresolved { tag: String },
}

/// Result of one `sync` call: the upserted contact plus the per-tag outcome
/// partitions. Tag failures never roll back the contact upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub contact_id: String,
    pub applied_tags: Vec<String>,
    pub failed_tags: Vec<String>,
}

/// How a tag-create response resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCreateDisposition {
    /// The response carried a usable tag id.
    Resolved(String),
    /// HTTP 422: likely a duplicate, look the tag up by name.
    SearchRequired,
    Unresolved,
}

/// How a contact-tag link response resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDisposition {
    Linked,
    /// The API reported a duplicate: the tag was already linked, which is
    /// success under idempotent semantics.
    AlreadyLinked,
    Failed,
}

#[derive(Debug, Clone)]
pub struct AcClient {
    base_url: String,
    api_token: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl AcClient {
    /// Build a client, rejecting blank configuration.
    pub fn new(config: AcConfig) -> Result<Self, AcError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        let api_token = config.api_token.trim().to_string();
        if base_url.is_empty() || api_token.is_empty() {
            return Err(AcError::NotConfigured);
        }
        Ok(Self {
            base_url,
            api_token,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[must_use]
    pub fn users_me_path() -> &'static str {
        "/api/3/users/me"
    }

    #[must_use]
    pub fn contact_sync_path() -> &'static str {
        "/api/3/contact/sync"
    }

    #[must_use]
    pub fn tags_path() -> &'static str {
        "/api/3/tags"
    }

    #[must_use]
    pub fn tag_search_path(name: &str) -> String {
        format!("/api/3/tags?search={}", urlencoding::encode(name))
    }

    #[must_use]
    pub fn contact_tags_path() -> &'static str {
        "/api/3/contactTags"
    }

    /// Connectivity test against the account endpoint.
    pub async fn test_connection(&self) -> Result<AccountUser, AcError> {
        let (status, body) = self.get(Self::users_me_path()).await?;
        if status != StatusCode::OK {
            return Err(http_error(status, &body));
        }
        let info: AccountInfoResponse = decode_json(&body)?;
        Ok(info.user.unwrap_or_default())
    }

    /// Upsert a contact and link every tag to it, sequentially.
    ///
    /// The contact upsert is fatal on failure; each tag then fails or
    /// succeeds on its own and the report records both partitions.
    pub async fn sync(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        tags: &[String],
    ) -> Result<SyncReport, AcError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AcError::InvalidInput {
                reason: format!("malformed email: {email}"),
            });
        }
        if tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(AcError::InvalidInput {
                reason: "blank tag".to_string(),
            });
        }

        let contact = ContactFields::new(email).with_names(first_name, last_name);
        let contact_id = self.sync_contact(&contact).await?;
        debug!(%contact_id, "contact upserted");

        let mut applied_tags = Vec::new();
        let mut failed_tags = Vec::new();
        for tag in tags {
            match self.assign_tag(&contact_id, tag).await {
                Ok(disposition) => {
                    debug!(%tag, ?disposition, "tag assigned");
                    applied_tags.push(tag.clone());
                }
                Err(error) => {
                    warn!(%tag, %error, "tag assignment failed");
                    failed_tags.push(tag.clone());
                }
            }
        }

        Ok(SyncReport {
            contact_id,
            applied_tags,
            failed_tags,
        })
    }

    /// Create or update the contact record, returning its id.
    pub async fn sync_contact(&self, contact: &ContactFields) -> Result<String, AcError> {
        let request = ContactSyncRequest {
            contact: contact.clone(),
        };
        let (status, body) = self.post(Self::contact_sync_path(), &request).await?;
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(http_error(status, &body));
        }
        let response: ContactSyncResponse = decode_json(&body)?;
        response
            .contact
            .map(|contact| contact.id)
            .ok_or(AcError::MissingContactId)
    }

    /// Resolve a tag name to its id, then link it to the contact.
    pub async fn assign_tag(
        &self,
        contact_id: &str,
        tag: &str,
    ) -> Result<LinkDisposition, AcError> {
        let tag_id = self.resolve_tag_id(tag).await?;
        self.link_tag(contact_id, &tag_id).await
    }

    /// Create the tag, recovering the id of an already-existing tag via the
    /// search endpoint or the duplicate error payload.
    pub async fn resolve_tag_id(&self, tag: &str) -> Result<String, AcError> {
        let request = TagCreateRequest {
            tag: TagFields::contact(tag),
        };
        let (status, body) = self.post(Self::tags_path(), &request).await?;

        match tag_create_disposition(status, &body) {
            TagCreateDisposition::Resolved(id) => Ok(id),
            TagCreateDisposition::SearchRequired => {
                debug!(tag, "tag create returned 422, searching for existing tag");
                self.search_tag_id(tag)
                    .await?
                    .ok_or_else(|| AcError::TagUnresolved {
                        tag: tag.to_string(),
                    })
            }
            TagCreateDisposition::Unresolved => Err(AcError::TagUnresolved {
                tag: tag.to_string(),
            }),
        }
    }

    /// Look a tag up by name; `None` when the search finds no exact match.
    pub async fn search_tag_id(&self, tag: &str) -> Result<Option<String>, AcError> {
        let (status, body) = self.get(&Self::tag_search_path(tag)).await?;
        if status != StatusCode::OK {
            warn!(tag, %status, "tag search failed");
            return Ok(None);
        }
        let response: TagSearchResponse = decode_json(&body)?;
        Ok(find_tag_id(&response.tags, tag))
    }

    /// Link a resolved tag id to a contact; already-linked is success.
    pub async fn link_tag(
        &self,
        contact_id: &str,
        tag_id: &str,
    ) -> Result<LinkDisposition, AcError> {
        let request = ContactTagRequest {
            contact_tag: ContactTagFields {
                contact: contact_id.to_string(),
                tag: tag_id.to_string(),
            },
        };
        let (status, body) = self.post(Self::contact_tags_path(), &request).await?;
        match link_disposition(status, &body) {
            LinkDisposition::Failed => Err(http_error(status, &body)),
            disposition => Ok(disposition),
        }
    }

    async fn get(&self, path: &str) -> Result<(StatusCode, Vec<u8>), AcError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .header("Api-Token", &self.api_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| AcError::Request {
                message: error.to_string(),
            })?;
        read_body(response).await
    }

    async fn post<Req>(&self, path: &str, payload: &Req) -> Result<(StatusCode, Vec<u8>), AcError>
    where
        Req: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(self.endpoint(path))
            .header("Api-Token", &self.api_token)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|error| AcError::Request {
                message: error.to_string(),
            })?;
        read_body(response).await
    }
}

/// Classify a tag-create response.
///
/// Order mirrors the recovery ladder: a present `tag.id` wins, a 422 routes
/// to search, and a duplicate error entry carrying `tag_id` covers older API
/// revisions that report the existing id directly.
#[must_use]
pub fn tag_create_disposition(status: StatusCode, body: &[u8]) -> TagCreateDisposition {
    let response: TagCreateResponse = serde_json::from_slice(body).unwrap_or_default();
    if let Some(tag) = response.tag {
        return TagCreateDisposition::Resolved(tag.id);
    }
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        return TagCreateDisposition::SearchRequired;
    }
    if let Some(id) = duplicate_tag_id(&response.errors) {
        return TagCreateDisposition::Resolved(id);
    }
    TagCreateDisposition::Unresolved
}

/// Scan search results for a case-insensitive exact name match.
#[must_use]
pub fn find_tag_id(tags: &[TagRecord], name: &str) -> Option<String> {
    let wanted = name.to_lowercase();
    tags.iter()
        .find(|record| record.tag.to_lowercase() == wanted)
        .map(|record| record.id.clone())
}

/// Classify a contact-tag link response.
#[must_use]
pub fn link_disposition(status: StatusCode, body: &[u8]) -> LinkDisposition {
    if status == StatusCode::OK || status == StatusCode::CREATED {
        return LinkDisposition::Linked;
    }
    let parsed: ErrorsBody = serde_json::from_slice(body).unwrap_or_default();
    if has_duplicate_error(&parsed.errors) {
        return LinkDisposition::AlreadyLinked;
    }
    LinkDisposition::Failed
}

/// Minimal syntactic email check: one `@`, a dotted domain, no whitespace.
#[must_use]
pub fn is_valid_email(raw: &str) -> bool {
    let email = raw.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

fn duplicate_tag_id(errors: &[ApiErrorEntry]) -> Option<String> {
    errors
        .iter()
        .find(|entry| entry.code.as_deref() == Some("duplicate"))
        .and_then(|entry| entry.tag_id.clone())
}

fn has_duplicate_error(errors: &[ApiErrorEntry]) -> bool {
    errors
        .iter()
        .any(|entry| entry.code.as_deref() == Some("duplicate"))
}

fn http_error(status: StatusCode, body: &[u8]) -> AcError {
    let body = String::from_utf8_lossy(body).trim().to_string();
    AcError::Http {
        status,
        body: if body.is_empty() {
            "<empty>".to_string()
        } else {
            body
        },
    }
}

fn decode_json<T>(body: &[u8]) -> Result<T, AcError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    serde_json::from_slice(body).map_err(|error| AcError::Decode {
        message: error.to_string(),
    })
}

async fn read_body(response: reqwest::Response) -> Result<(StatusCode, Vec<u8>), AcError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|error| AcError::Request {
            message: error.to_string(),
        })?;
    Ok((status, body.to_vec()))
}
