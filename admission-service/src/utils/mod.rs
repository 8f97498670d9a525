use institute_core::error::AppError;
use mongodb::bson::{Bson, Document};
use serde::Serialize;

/// Flatten a patch struct into `$set` entries.
///
/// Only keys the caller actually supplied (non-null after serialization) are
/// written; with a dotted `prefix` this yields merge-patch semantics on an
/// embedded sub-document, leaving absent keys untouched.
pub fn patch_document(prefix: Option<&str>, patch: &impl Serialize) -> Result<Document, AppError> {
    let value = serde_json::to_value(patch)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to serialize patch: {}", e)))?;

    let mut set = Document::new();
    if let serde_json::Value::Object(map) = value {
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            let bson = Bson::try_from(value).map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Invalid patch value: {}", e))
            })?;
            match prefix {
                Some(prefix) => set.insert(format!("{}.{}", prefix, key), bson),
                None => set.insert(key, bson),
            };
        }
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Patch {
        name: Option<String>,
        city: Option<String>,
    }

    #[test]
    fn skips_absent_keys_and_prefixes_present_ones() {
        let patch = Patch {
            name: Some("Asha".to_string()),
            city: None,
        };
        let set = patch_document(Some("personal_details"), &patch).unwrap();
        assert_eq!(set.get_str("personal_details.name").unwrap(), "Asha");
        assert!(!set.contains_key("personal_details.city"));
    }

    #[test]
    fn no_prefix_writes_top_level_keys() {
        let patch = Patch {
            name: Some("Main".to_string()),
            city: None,
        };
        let set = patch_document(None, &patch).unwrap();
        assert_eq!(set.get_str("name").unwrap(), "Main");
    }
}
