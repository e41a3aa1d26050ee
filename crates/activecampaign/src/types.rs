use serde::{Deserialize, Deserializer, Serialize};

/// Contact fields sent to the sync endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ContactFields {
    pub email: String,
    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ContactFields {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: None,
            last_name: None,
        }
    }

    /// Set the name fields, treating blank values as absent.
    #[must_use]
    pub fn with_names(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = non_blank(first_name);
        self.last_name = non_blank(last_name);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ContactSyncRequest {
    pub contact: ContactFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactSyncResponse {
    #[serde(default)]
    pub contact: Option<ContactRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ContactRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct TagCreateRequest {
    pub tag: TagFields,
}

#[derive(Debug, Serialize)]
pub struct TagFields {
    pub tag: String,
    #[serde(rename = "tagType")]
    pub tag_type: String,
}

impl TagFields {
    /// A contact-type tag, the only kind this integration creates.
    #[must_use]
    pub fn contact(name: impl Into<String>) -> Self {
        Self {
            tag: name.into(),
            tag_type: "contact".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TagCreateResponse {
    #[serde(default)]
    pub tag: Option<TagRecord>,
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

/// A tag as reported by the create and search endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagRecord {
    #[serde(default)]
    pub tag: String,
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagSearchResponse {
    #[serde(default)]
    pub tags: Vec<TagRecord>,
}

#[derive(Debug, Serialize)]
pub struct ContactTagRequest {
    #[serde(rename = "contactTag")]
    pub contact_tag: ContactTagFields,
}

#[derive(Debug, Serialize)]
pub struct ContactTagFields {
    pub contact: String,
    pub tag: String,
}

/// One entry of an `errors` array in an API error payload.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Older API revisions report the existing tag's id on duplicates.
    #[serde(default, deserialize_with = "opt_id_string")]
    pub tag_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorsBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountInfoResponse {
    #[serde(default)]
    pub user: Option<AccountUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUser {
    #[serde(default)]
    pub username: String,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// The API has served ids both as JSON strings and as numbers across
// revisions; accept either and carry them as strings.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(id) => id.to_string(),
        Raw::Text(id) => id,
    })
}

fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Number(id) => id.to_string(),
        Raw::Text(id) => id,
    }))
}

#[cfg(test)]
mod tests {
    use super::{
        ContactFields, ContactSyncRequest, ContactSyncResponse, ContactTagFields,
        ContactTagRequest, TagCreateRequest, TagCreateResponse, TagFields, TagSearchResponse,
    };

    #[test]
    fn contact_request_omits_blank_names() {
        let request = ContactSyncRequest {
            contact: ContactFields::new("visitor@example.com").with_names("", "  "),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap_or_default(),
            r#"{"contact":{"email":"visitor@example.com"}}"#
        );
    }

    #[test]
    fn contact_request_carries_camel_case_names() {
        let request = ContactSyncRequest {
            contact: ContactFields::new("visitor@example.com").with_names("Ada", "Lovelace"),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap_or_default(),
            r#"{"contact":{"email":"visitor@example.com","firstName":"Ada","lastName":"Lovelace"}}"#
        );
    }

    #[test]
    fn tag_create_request_is_contact_typed() {
        let request = TagCreateRequest {
            tag: TagFields::contact("messekoeln"),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap_or_default(),
            r#"{"tag":{"tag":"messekoeln","tagType":"contact"}}"#
        );
    }

    #[test]
    fn contact_tag_request_uses_camel_case_wrapper() {
        let request = ContactTagRequest {
            contact_tag: ContactTagFields {
                contact: "7".to_string(),
                tag: "42".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap_or_default(),
            r#"{"contactTag":{"contact":"7","tag":"42"}}"#
        );
    }

    #[test]
    fn ids_decode_from_strings_and_numbers() {
        let from_string: ContactSyncResponse =
            serde_json::from_str(r#"{"contact":{"id":"17"}}"#).unwrap_or_default();
        assert_eq!(from_string.contact.map(|c| c.id), Some("17".to_string()));

        let from_number: ContactSyncResponse =
            serde_json::from_str(r#"{"contact":{"id":17}}"#).unwrap_or_default();
        assert_eq!(from_number.contact.map(|c| c.id), Some("17".to_string()));
    }

    #[test]
    fn search_response_decodes_numeric_ids() {
        let response: TagSearchResponse =
            serde_json::from_str(r#"{"tags":[{"tag":"Messekoeln","id":42}]}"#).unwrap_or_default();
        assert_eq!(response.tags.len(), 1);
        assert_eq!(response.tags[0].id, "42");
        assert_eq!(response.tags[0].tag, "Messekoeln");
    }

    #[test]
    fn create_response_tolerates_error_only_bodies() {
        let response: TagCreateResponse =
            serde_json::from_str(r#"{"errors":[{"code":"duplicate","tag_id":9}]}"#)
                .unwrap_or_default();
        assert!(response.tag.is_none());
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].code.as_deref(), Some("duplicate"));
        assert_eq!(response.errors[0].tag_id.as_deref(), Some("9"));
    }
}
