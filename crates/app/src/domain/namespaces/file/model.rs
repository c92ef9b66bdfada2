//! Persisted shape of the file-backed namespace store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    domain::namespaces::models::{NamespaceRecord, NamespaceStatus},
    uid::Uid,
};

/// One namespace as written to the YAML store.
///
/// Timestamps are Unix seconds; a zero `deletedAt` means not deleted. Every
/// field except the name defaults, so hand-edited files with missing ids or
/// uids load and get backfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredNamespace {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub uid: Uid,
    pub name: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub status: NamespaceStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub deleted_at: i64,
    #[serde(default)]
    pub creator: Uid,
}

impl StoredNamespace {
    pub(crate) fn to_record(&self) -> NamespaceRecord {
        NamespaceRecord {
            id: self.id,
            uid: self.uid,
            name: self.name.clone(),
            metadata: self.metadata.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: (self.deleted_at != 0).then_some(self.deleted_at),
            creator: self.creator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fields_are_camel_case() {
        let stored = StoredNamespace {
            id: 3,
            uid: Uid::new(77),
            name: "acme".to_string(),
            metadata: BTreeMap::from([("tier".to_string(), "gold".to_string())]),
            status: NamespaceStatus::Enabled,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
            deleted_at: 0,
            creator: Uid::new(5),
        };

        let yaml = serde_norway::to_string(&vec![stored]).unwrap();

        assert!(yaml.contains("createdAt:"), "unexpected yaml: {yaml}");
        assert!(yaml.contains("deletedAt:"), "unexpected yaml: {yaml}");
    }

    #[test]
    fn missing_optional_fields_default() {
        let yaml = "- name: bare\n";

        let stored: Vec<StoredNamespace> = serde_norway::from_str(yaml).unwrap();
        let first = stored.first().unwrap();

        assert_eq!(first.id, 0);
        assert!(first.uid.is_zero());
        assert_eq!(first.status, NamespaceStatus::Unknown);
    }

    #[test]
    fn zero_deleted_at_converts_to_none() {
        let stored = StoredNamespace {
            id: 1,
            uid: Uid::new(1),
            name: "n".to_string(),
            metadata: BTreeMap::new(),
            status: NamespaceStatus::Enabled,
            created_at: 0,
            updated_at: 0,
            deleted_at: 0,
            creator: Uid::new(1),
        };

        assert_eq!(stored.to_record().deleted_at, None);
    }
}
