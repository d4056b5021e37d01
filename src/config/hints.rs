// src/config/hints.rs
//
// User-supplied keyword hints, additive to the built-in bucket rules.

use crate::classify::Bucket;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Where a keyword is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Folder,
    Filename,
}

/// Extra keywords per bucket, normalized to lower-case and de-duplicated
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketHints {
    pub folder_keywords: BTreeMap<Bucket, Vec<String>>,
    pub filename_keywords: BTreeMap<Bucket, Vec<String>>,
}

impl BucketHints {
    /// Lenient parse: unknown buckets and non-string entries are dropped.
    pub fn from_value(value: &Value) -> Self {
        let mut hints = Self::default();
        let Some(obj) = value.as_object() else {
            return hints;
        };
        if let Some(section) = obj.get("folder_keywords") {
            hints.folder_keywords = normalize_section(section);
        }
        if let Some(section) = obj.get("filename_keywords") {
            hints.filename_keywords = normalize_section(section);
        }
        hints
    }

    /// Inline hints take precedence over any candidate file.
    pub fn load(inline: Option<&Value>, candidates: &[PathBuf]) -> Self {
        if let Some(value) = inline {
            return Self::from_value(value);
        }
        for path in candidates {
            if !path.is_file() {
                continue;
            }
            let parsed = fs::read_to_string(path)
                .map_err(crate::Error::from)
                .and_then(|text| serde_json::from_str::<Value>(&text).map_err(crate::Error::from));
            match parsed {
                Ok(value) => {
                    debug!("Loaded bucket hints from {}", path.display());
                    return Self::from_value(&value);
                }
                Err(e) => warn!("Ignoring bucket hints in {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn extras(&self, bucket: Bucket, kind: HintKind) -> &[String] {
        let section = match kind {
            HintKind::Folder => &self.folder_keywords,
            HintKind::Filename => &self.filename_keywords,
        };
        section.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.folder_keywords.is_empty() && self.filename_keywords.is_empty()
    }
}

fn normalize_section(section: &Value) -> BTreeMap<Bucket, Vec<String>> {
    let mut out = BTreeMap::new();
    let Some(obj) = section.as_object() else {
        return out;
    };
    for (key, entries) in obj {
        let Some(bucket) = Bucket::from_id(key) else {
            debug!("Ignoring hints for unknown bucket '{}'", key);
            continue;
        };
        let Some(list) = entries.as_array() else {
            continue;
        };
        let mut keywords: Vec<String> = Vec::new();
        for entry in list.iter().filter_map(Value::as_str) {
            let keyword = entry.trim().to_lowercase();
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        if !keywords.is_empty() {
            out.insert(bucket, keywords);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalization() {
        let hints = BucketHints::from_value(&json!({
            "folder_keywords": {
                "808s": [" Sub ", "sub", "BOOM", 7],
                "Nonsense": ["x"]
            },
            "filename_keywords": {"Kicks": ["thump"]}
        }));

        assert_eq!(
            hints.extras(Bucket::EightOhEight, HintKind::Folder),
            &["sub".to_string(), "boom".to_string()]
        );
        assert_eq!(hints.extras(Bucket::Kicks, HintKind::Filename), &["thump".to_string()]);
        assert!(hints.extras(Bucket::Kicks, HintKind::Folder).is_empty());
        assert_eq!(hints.folder_keywords.len(), 1);
    }

    #[test]
    fn test_non_object_is_empty() {
        assert!(BucketHints::from_value(&json!(["a"])).is_empty());
        assert!(BucketHints::load(None, &[PathBuf::from("/nonexistent/hints.json")]).is_empty());
    }
}
