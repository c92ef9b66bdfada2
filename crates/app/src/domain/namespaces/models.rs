//! Namespace records and repository value objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::uid::Uid;

/// Namespace activation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum NamespaceStatus {
    /// Zero value; means "no filter" in queries and "unset" at creation.
    #[default]
    Unknown,
    Enabled,
    Disabled,
}

impl NamespaceStatus {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Enabled => 1,
            Self::Disabled => 2,
        }
    }
}

impl From<u8> for NamespaceStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Enabled,
            2 => Self::Disabled,
            _ => Self::Unknown,
        }
    }
}

impl From<NamespaceStatus> for u8 {
    fn from(value: NamespaceStatus) -> Self {
        value.as_u8()
    }
}

impl std::fmt::Display for NamespaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Enabled => f.write_str("enabled"),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

/// Logical sort field for namespace listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    Id,
    Uid,
    Name,
    Status,
    #[default]
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    Creator,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A stored namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRecord {
    /// Storage-internal ordering key, assigned monotonically by the backend.
    pub id: u32,

    /// Externally visible snowflake identifier; immutable and non-zero.
    pub uid: Uid,

    /// Human-readable name, unique among non-deleted records.
    pub name: String,

    /// Free-form string metadata.
    pub metadata: BTreeMap<String, String>,

    /// Activation status.
    pub status: NamespaceStatus,

    /// Creation time, Unix seconds.
    pub created_at: i64,

    /// Last update time, Unix seconds.
    pub updated_at: i64,

    /// Soft-deletion time, Unix seconds, when deleted.
    pub deleted_at: Option<i64>,

    /// Uid of the creating principal.
    pub creator: Uid,
}

/// Data for a namespace to create.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewNamespace {
    pub name: String,
    pub metadata: BTreeMap<String, String>,
    /// Defaults to [`NamespaceStatus::Enabled`] when left Unknown.
    pub status: NamespaceStatus,
}

impl NewNamespace {
    /// Status to persist: Enabled when left unset.
    #[must_use]
    pub fn effective_status(&self) -> NamespaceStatus {
        if self.status == NamespaceStatus::Unknown {
            NamespaceStatus::Enabled
        } else {
            self.status
        }
    }
}

/// Partial update of name and metadata, addressed by uid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceUpdate {
    pub uid: Uid,
    pub name: String,
    pub metadata: BTreeMap<String, String>,
}

/// Status transition, addressed by uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceStatusUpdate {
    pub uid: Uid,
    pub status: NamespaceStatus,
}

/// Offset/limit listing query. Pages are 1-based; a zero page or page size
/// disables pagination.
#[derive(Debug, Clone, Default)]
pub struct NamespaceListQuery {
    pub page: u32,
    pub page_size: u32,
    /// Substring match on the name; empty means no filter.
    pub keyword: String,
    /// [`NamespaceStatus::Unknown`] means no filter.
    pub status: NamespaceStatus,
    pub order_by: SortField,
    pub order: SortOrder,
}

/// One page of namespace records.
#[derive(Debug, Clone, Default)]
pub struct NamespacePage {
    pub namespaces: Vec<NamespaceRecord>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Cursor-based selection query: items strictly after (ascending) or before
/// (descending) `last_uid`, bounded by `limit`. A zero `last_uid` starts from
/// the beginning.
#[derive(Debug, Clone, Default)]
pub struct NamespaceSelectQuery {
    pub keyword: String,
    pub limit: u32,
    pub last_uid: Uid,
    pub status: NamespaceStatus,
    pub order: SortOrder,
}

/// One selectable item, shaped for incremental/typeahead consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSelectItem {
    pub value: Uid,
    pub label: String,
    pub disabled: bool,
    pub tooltip: String,
}

/// A cursor page of selectable items.
#[derive(Debug, Clone, Default)]
pub struct NamespaceSelection {
    pub items: Vec<NamespaceSelectItem>,
    pub total: i64,
    /// Uid of the last returned item; zero when `items` is empty.
    pub last_uid: Uid,
    pub has_more: bool,
}

/// Mutation outcome: affected row count plus an error string, empty on
/// success. Zero rows with an empty error means "no matching row".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultInfo {
    pub rows_affected: u64,
    pub error: String,
}

impl ResultInfo {
    #[must_use]
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            error: String::new(),
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            rows_affected: 0,
            error: error.into(),
        }
    }
}

impl NamespaceRecord {
    /// Shape a record as a select item. Deleted and non-enabled records are
    /// marked disabled rather than hidden.
    #[must_use]
    pub fn to_select_item(&self) -> NamespaceSelectItem {
        NamespaceSelectItem {
            value: self.uid,
            label: self.name.clone(),
            disabled: self.deleted_at.is_some() || self.status != NamespaceStatus::Enabled,
            tooltip: serde_json::to_string(&self.metadata).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_u8() {
        for status in [
            NamespaceStatus::Unknown,
            NamespaceStatus::Enabled,
            NamespaceStatus::Disabled,
        ] {
            assert_eq!(NamespaceStatus::from(status.as_u8()), status);
        }
    }

    #[test]
    fn unknown_u8_values_decay_to_unknown() {
        assert_eq!(NamespaceStatus::from(9), NamespaceStatus::Unknown);
    }

    #[test]
    fn select_item_marks_disabled_records() {
        let record = NamespaceRecord {
            id: 1,
            uid: Uid::new(7),
            name: "ops".to_string(),
            metadata: BTreeMap::new(),
            status: NamespaceStatus::Disabled,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
            creator: Uid::new(1),
        };

        assert!(record.to_select_item().disabled);
    }
}
