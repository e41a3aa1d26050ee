/// Normalize a single raw tag value: trimmed and lowercased.
#[must_use]
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize a batch of raw tag values.
///
/// Each value is trimmed and lowercased; empty results are dropped and
/// duplicates are collapsed while preserving first-seen order.
#[must_use]
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for value in raw {
        let tag = normalize_tag(value.as_ref());
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
    }
    tags
}

/// Split a raw comma-separated tag list into individual values.
///
/// Values are only split and trimmed here; callers normalize the result.
#[must_use]
pub fn split_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag, normalize_tags, split_tag_list};

    #[test]
    fn normalize_tag_trims_and_lowercases() {
        assert_eq!(normalize_tag("  Messekoeln "), "messekoeln");
        assert_eq!(normalize_tag("FACEBOOK"), "facebook");
        assert_eq!(normalize_tag("   "), "");
    }

    #[test]
    fn normalize_tags_drops_empties_and_duplicates() {
        let tags = normalize_tags(["Messekoeln", " messekoeln ", "", "  ", "Facebook"]);
        assert_eq!(tags, vec!["messekoeln".to_string(), "facebook".to_string()]);
    }

    #[test]
    fn normalize_tags_preserves_first_seen_order() {
        let tags = normalize_tags(["b", "A", "b", "c", "a"]);
        assert_eq!(
            tags,
            vec!["b".to_string(), "a".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn split_tag_list_handles_whitespace_and_empty_segments() {
        assert_eq!(
            split_tag_list("messekoeln, facebook ,,instagram"),
            vec![
                "messekoeln".to_string(),
                "facebook".to_string(),
                "instagram".to_string()
            ]
        );
        assert!(split_tag_list("").is_empty());
        assert!(split_tag_list(" , ,").is_empty());
    }
}
