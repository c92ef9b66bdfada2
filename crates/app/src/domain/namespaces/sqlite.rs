//! SQLite-backed namespace repository.
//!
//! Deletion is a soft delete: rows keep their uid and gain a `deleted_at`
//! timestamp, and every active-record query excludes them. Creation
//! round-trips through storage so column defaults are reflected in the
//! returned record.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    FromRow, QueryBuilder, Row, Sqlite, SqlitePool, query, query_as, sqlite::SqliteRow,
};

use crate::{
    config::storage::StorageConfig,
    database,
    domain::namespaces::{
        models::{
            NamespaceListQuery, NamespacePage, NamespaceRecord, NamespaceSelectQuery,
            NamespaceSelection, NamespaceStatus, NamespaceStatusUpdate, NamespaceUpdate,
            NewNamespace, ResultInfo, SortField, SortOrder,
        },
        repository::{NamespaceHandle, NamespaceRepository, NamespaceRepositoryFactory},
    },
    errors::RepositoryError,
    registry::Cleanup,
    uid::{SnowflakeGenerator, Uid},
};

const CREATE_NAMESPACE_SQL: &str = include_str!("sql/create_namespace.sql");
const GET_NAMESPACE_SQL: &str = include_str!("sql/get_namespace.sql");
const GET_NAMESPACE_BY_NAME_SQL: &str = include_str!("sql/get_namespace_by_name.sql");
const UPDATE_NAMESPACE_SQL: &str = include_str!("sql/update_namespace.sql");
const UPDATE_NAMESPACE_STATUS_SQL: &str = include_str!("sql/update_namespace_status.sql");
const DELETE_NAMESPACE_SQL: &str = include_str!("sql/delete_namespace.sql");

const ACTIVE_NAMESPACES_SQL: &str =
    "SELECT id, uid, name, metadata, status, created_at, updated_at, deleted_at, creator \
     FROM namespaces WHERE deleted_at IS NULL";

/// Column reference for each logical sort field. Anything unmapped falls
/// back to creation-time ordering so client-supplied sort keys cannot break
/// a listing.
const SORT_COLUMNS: &[(SortField, &str)] = &[
    (SortField::Id, "id"),
    (SortField::Uid, "uid"),
    (SortField::Name, "name"),
    (SortField::Status, "status"),
    (SortField::CreatedAt, "created_at"),
    (SortField::UpdatedAt, "updated_at"),
    (SortField::DeletedAt, "deleted_at"),
    (SortField::Creator, "creator"),
];

fn sort_column(field: SortField) -> &'static str {
    SORT_COLUMNS
        .iter()
        .find(|(candidate, _)| *candidate == field)
        .map_or("created_at", |(_, column)| column)
}

fn order_keyword(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => " ASC",
        SortOrder::Desc => " DESC",
    }
}

/// Builds [`SqliteNamespaceRepository`] instances; registered under the
/// `sqlite` driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteNamespaceFactory;

#[async_trait]
impl NamespaceRepositoryFactory for SqliteNamespaceFactory {
    async fn build(&self, config: &StorageConfig) -> Result<NamespaceHandle, RepositoryError> {
        let url = config
            .require_database_url()
            .map_err(|error| RepositoryError::InvalidArgument(error.to_string()))?;
        let generator = Arc::new(
            SnowflakeGenerator::new(config.node_id)
                .map_err(|error| RepositoryError::InvalidArgument(error.to_string()))?,
        );

        let pool = database::connect(url).await?;
        let repository = Arc::new(SqliteNamespaceRepository::new(pool.clone(), generator));

        let cleanup: Cleanup = Box::new(move || {
            Box::pin(async move {
                pool.close().await;
                Ok(())
            })
        });

        Ok(NamespaceHandle {
            repository,
            cleanup,
        })
    }
}

/// SQLite namespace repository.
#[derive(Debug, Clone)]
pub struct SqliteNamespaceRepository {
    pool: SqlitePool,
    generator: Arc<SnowflakeGenerator>,
}

impl SqliteNamespaceRepository {
    #[must_use]
    pub fn new(pool: SqlitePool, generator: Arc<SnowflakeGenerator>) -> Self {
        Self { pool, generator }
    }
}

#[async_trait]
impl NamespaceRepository for SqliteNamespaceRepository {
    async fn create_namespace(
        &self,
        new: NewNamespace,
    ) -> Result<NamespaceRecord, RepositoryError> {
        let now = jiff::Timestamp::now().as_second();
        let uid = self.generator.generate();
        let creator = self.generator.generate();
        let metadata = serde_json::to_string(&new.metadata)
            .map_err(|error| RepositoryError::internal("encode namespace metadata failed", error))?;
        let status = new.effective_status();

        query(CREATE_NAMESPACE_SQL)
            .bind(uid.value())
            .bind(&new.name)
            .bind(metadata)
            .bind(i64::from(status.as_u8()))
            .bind(now)
            .bind(now)
            .bind(creator.value())
            .execute(&self.pool)
            .await?;

        self.get_namespace_by_name(&new.name).await
    }

    async fn get_namespace(&self, uid: Uid) -> Result<NamespaceRecord, RepositoryError> {
        query_as::<Sqlite, NamespaceRecord>(GET_NAMESPACE_SQL)
            .bind(uid.value())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("namespace {uid}")))
    }

    async fn get_namespace_by_name(
        &self,
        name: &str,
    ) -> Result<NamespaceRecord, RepositoryError> {
        query_as::<Sqlite, NamespaceRecord>(GET_NAMESPACE_BY_NAME_SQL)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("namespace {name}")))
    }

    async fn update_namespace(
        &self,
        update: NamespaceUpdate,
    ) -> Result<ResultInfo, RepositoryError> {
        let now = jiff::Timestamp::now().as_second();
        let metadata = serde_json::to_string(&update.metadata)
            .map_err(|error| RepositoryError::internal("encode namespace metadata failed", error))?;

        let result = query(UPDATE_NAMESPACE_SQL)
            .bind(update.uid.value())
            .bind(&update.name)
            .bind(metadata)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(ResultInfo::affected(result.rows_affected()))
    }

    async fn update_namespace_status(
        &self,
        update: NamespaceStatusUpdate,
    ) -> Result<ResultInfo, RepositoryError> {
        let now = jiff::Timestamp::now().as_second();

        let result = query(UPDATE_NAMESPACE_STATUS_SQL)
            .bind(update.uid.value())
            .bind(i64::from(update.status.as_u8()))
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(ResultInfo::affected(result.rows_affected()))
    }

    async fn delete_namespace(&self, uid: Uid) -> Result<ResultInfo, RepositoryError> {
        let now = jiff::Timestamp::now().as_second();

        let result = query(DELETE_NAMESPACE_SQL)
            .bind(uid.value())
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(ResultInfo::affected(result.rows_affected()))
    }

    async fn list_namespace(
        &self,
        query: NamespaceListQuery,
    ) -> Result<NamespacePage, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(ACTIVE_NAMESPACES_SQL);

        if !query.keyword.is_empty() {
            builder.push(" AND name LIKE ");
            builder.push_bind(format!("%{}%", query.keyword));
        }
        if query.status != NamespaceStatus::Unknown {
            builder.push(" AND status = ");
            builder.push_bind(i64::from(query.status.as_u8()));
        }

        builder.push(" ORDER BY ");
        builder.push(sort_column(query.order_by));
        builder.push(order_keyword(query.order));

        if query.page > 0 && query.page_size > 0 {
            builder.push(" LIMIT ");
            builder.push_bind(i64::from(query.page_size));
            builder.push(" OFFSET ");
            builder.push_bind(i64::from(query.page - 1) * i64::from(query.page_size));
        }

        let namespaces: Vec<NamespaceRecord> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(NamespacePage {
            total: namespaces.len() as i64,
            namespaces,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn select_namespace(
        &self,
        query: NamespaceSelectQuery,
    ) -> Result<NamespaceSelection, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(ACTIVE_NAMESPACES_SQL);

        if !query.keyword.is_empty() {
            builder.push(" AND name LIKE ");
            builder.push_bind(format!("%{}%", query.keyword));
        }
        if query.status != NamespaceStatus::Unknown {
            builder.push(" AND status = ");
            builder.push_bind(i64::from(query.status.as_u8()));
        }
        if !query.last_uid.is_zero() {
            builder.push(match query.order {
                SortOrder::Asc => " AND uid > ",
                SortOrder::Desc => " AND uid < ",
            });
            builder.push_bind(query.last_uid.value());
        }

        builder.push(" ORDER BY uid");
        builder.push(order_keyword(query.order));
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(query.limit));

        let records: Vec<NamespaceRecord> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        let items: Vec<_> = records
            .iter()
            .map(NamespaceRecord::to_select_item)
            .collect();
        let has_more = query.limit > 0 && items.len() == query.limit as usize;
        let last_uid = items.last().map_or(Uid::ZERO, |item| item.value);

        Ok(NamespaceSelection {
            total: items.len() as i64,
            items,
            last_uid,
            has_more,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for NamespaceRecord {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let id: i64 = row.try_get("id")?;
        let id = u32::try_from(id).map_err(|error| sqlx::Error::ColumnDecode {
            index: "id".to_string(),
            source: Box::new(error),
        })?;

        let metadata: String = row.try_get("metadata")?;
        let metadata =
            serde_json::from_str(&metadata).map_err(|error| sqlx::Error::ColumnDecode {
                index: "metadata".to_string(),
                source: Box::new(error),
            })?;

        let status: i64 = row.try_get("status")?;
        let status = u8::try_from(status).map_or(NamespaceStatus::Unknown, NamespaceStatus::from);

        Ok(Self {
            id,
            uid: Uid::new(row.try_get("uid")?),
            name: row.try_get("name")?,
            metadata,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
            creator: Uid::new(row.try_get("creator")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use testresult::TestResult;

    use crate::test::db::memory_pool;

    use super::*;

    async fn repository() -> SqliteNamespaceRepository {
        let pool = memory_pool().await;
        let generator = Arc::new(SnowflakeGenerator::new(1).expect("valid node id"));
        SqliteNamespaceRepository::new(pool, generator)
    }

    fn new_namespace(name: &str) -> NewNamespace {
        NewNamespace {
            name: name.to_string(),
            metadata: BTreeMap::new(),
            status: NamespaceStatus::Enabled,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() -> TestResult {
        let repository = repository().await;

        let created = repository
            .create_namespace(NewNamespace {
                name: "acme".to_string(),
                metadata: BTreeMap::from([("tier".to_string(), "gold".to_string())]),
                status: NamespaceStatus::Enabled,
            })
            .await?;

        assert!(!created.uid.is_zero(), "uid must be assigned at creation");
        assert!(created.id > 0, "id must be assigned by the database");

        let by_uid = repository.get_namespace(created.uid).await?;
        let by_name = repository.get_namespace_by_name("acme").await?;

        assert_eq!(by_uid, created);
        assert_eq!(by_name, created);
        assert_eq!(by_uid.metadata.get("tier").map(String::as_str), Some("gold"));
        assert_eq!(by_uid.status, NamespaceStatus::Enabled);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_status_defaults_to_enabled() -> TestResult {
        let repository = repository().await;

        let created = repository
            .create_namespace(NewNamespace {
                name: "defaulted".to_string(),
                metadata: BTreeMap::new(),
                status: NamespaceStatus::Unknown,
            })
            .await?;

        assert_eq!(created.status, NamespaceStatus::Enabled);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() -> TestResult {
        let repository = repository().await;

        repository.create_namespace(new_namespace("twin")).await?;
        let result = repository.create_namespace(new_namespace("twin")).await;

        assert!(
            matches!(result, Err(RepositoryError::AlreadyExists(_))),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_is_soft_and_hides_the_record() -> TestResult {
        let repository = repository().await;

        let created = repository.create_namespace(new_namespace("doomed")).await?;

        let info = repository.delete_namespace(created.uid).await?;
        assert_eq!(info.rows_affected, 1);

        let result = repository.get_namespace(created.uid).await;
        assert!(
            matches!(result, Err(RepositoryError::NotFound(_))),
            "soft-deleted record must be excluded, got {result:?}"
        );

        let page = repository
            .list_namespace(NamespaceListQuery::default())
            .await?;
        assert!(
            !page.namespaces.iter().any(|n| n.uid == created.uid),
            "soft-deleted record must not be listed"
        );

        // Deleting again affects nothing and raises no error.
        let info = repository.delete_namespace(created.uid).await?;
        assert_eq!(info.rows_affected, 0);
        assert!(info.error.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn name_is_reusable_after_soft_delete() -> TestResult {
        let repository = repository().await;

        let first = repository.create_namespace(new_namespace("phoenix")).await?;
        repository.delete_namespace(first.uid).await?;

        let second = repository.create_namespace(new_namespace("phoenix")).await?;

        assert_ne!(second.uid, first.uid, "uid is never reassigned");

        Ok(())
    }

    #[tokio::test]
    async fn update_rewrites_name_and_metadata() -> TestResult {
        let repository = repository().await;

        let created = repository.create_namespace(new_namespace("before")).await?;

        let info = repository
            .update_namespace(NamespaceUpdate {
                uid: created.uid,
                name: "after".to_string(),
                metadata: BTreeMap::from([("k".to_string(), "v".to_string())]),
            })
            .await?;
        assert_eq!(info.rows_affected, 1);

        let fetched = repository.get_namespace(created.uid).await?;
        assert_eq!(fetched.name, "after");
        assert_eq!(fetched.metadata.get("k").map(String::as_str), Some("v"));
        assert_eq!(fetched.created_at, created.created_at, "created_at is immutable");

        Ok(())
    }

    #[tokio::test]
    async fn update_unknown_uid_reports_zero_rows() -> TestResult {
        let repository = repository().await;

        let info = repository
            .update_namespace(NamespaceUpdate {
                uid: Uid::new(404),
                name: "ghost".to_string(),
                metadata: BTreeMap::new(),
            })
            .await?;

        assert_eq!(info.rows_affected, 0);
        assert!(info.error.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn update_status_is_idempotent() -> TestResult {
        let repository = repository().await;

        let created = repository
            .create_namespace(NewNamespace {
                name: "switchy".to_string(),
                metadata: BTreeMap::new(),
                status: NamespaceStatus::Disabled,
            })
            .await?;

        let update = NamespaceStatusUpdate {
            uid: created.uid,
            status: NamespaceStatus::Enabled,
        };

        let first = repository.update_namespace_status(update).await?;
        assert_eq!(first.rows_affected, 1);

        let second = repository.update_namespace_status(update).await?;
        assert!(second.rows_affected <= 1);
        assert!(second.error.is_empty());

        let fetched = repository.get_namespace(created.uid).await?;
        assert_eq!(fetched.status, NamespaceStatus::Enabled);

        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_keyword_and_status() -> TestResult {
        let repository = repository().await;

        for (name, status) in [
            ("prod-api", NamespaceStatus::Enabled),
            ("prod-web", NamespaceStatus::Disabled),
            ("staging-api", NamespaceStatus::Enabled),
        ] {
            repository
                .create_namespace(NewNamespace {
                    name: name.to_string(),
                    metadata: BTreeMap::new(),
                    status,
                })
                .await?;
        }

        let page = repository
            .list_namespace(NamespaceListQuery {
                keyword: "prod".to_string(),
                status: NamespaceStatus::Enabled,
                ..NamespaceListQuery::default()
            })
            .await?;

        assert_eq!(page.total, 1);
        assert_eq!(
            page.namespaces.first().map(|n| n.name.as_str()),
            Some("prod-api")
        );

        Ok(())
    }

    #[tokio::test]
    async fn list_paginates_with_one_based_pages() -> TestResult {
        let repository = repository().await;

        for index in 0..5 {
            repository
                .create_namespace(new_namespace(&format!("ns-{index}")))
                .await?;
        }

        let page = repository
            .list_namespace(NamespaceListQuery {
                page: 2,
                page_size: 2,
                order_by: SortField::Name,
                order: SortOrder::Asc,
                ..NamespaceListQuery::default()
            })
            .await?;

        let names: Vec<&str> = page.namespaces.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["ns-2", "ns-3"]);

        let beyond = repository
            .list_namespace(NamespaceListQuery {
                page: 9,
                page_size: 2,
                ..NamespaceListQuery::default()
            })
            .await?;
        assert!(beyond.namespaces.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn sort_falls_back_to_created_at_for_any_field() -> TestResult {
        let repository = repository().await;

        repository.create_namespace(new_namespace("first")).await?;
        repository.create_namespace(new_namespace("second")).await?;

        // Every declared sort field must produce a valid query.
        for field in [
            SortField::Id,
            SortField::Uid,
            SortField::Name,
            SortField::Status,
            SortField::CreatedAt,
            SortField::UpdatedAt,
            SortField::DeletedAt,
            SortField::Creator,
        ] {
            let page = repository
                .list_namespace(NamespaceListQuery {
                    order_by: field,
                    ..NamespaceListQuery::default()
                })
                .await?;
            assert_eq!(page.namespaces.len(), 2, "sorting by {field:?} must work");
        }

        Ok(())
    }

    #[tokio::test]
    async fn select_cursor_pagination_terminates_without_duplicates() -> TestResult {
        let repository = repository().await;

        for index in 0..5 {
            repository
                .create_namespace(new_namespace(&format!("ns-{index}")))
                .await?;
        }

        let mut seen = HashSet::new();
        let mut last_uid = Uid::ZERO;
        let mut rounds = 0;
        loop {
            let selection = repository
                .select_namespace(NamespaceSelectQuery {
                    limit: 2,
                    last_uid,
                    ..NamespaceSelectQuery::default()
                })
                .await?;

            for item in &selection.items {
                assert!(
                    seen.insert(item.value),
                    "cursor pagination must not repeat uids"
                );
            }
            if !selection.has_more {
                break;
            }
            last_uid = selection.last_uid;
            rounds += 1;
            assert!(rounds < 10, "cursor pagination must terminate");
        }

        assert_eq!(seen.len(), 5, "every namespace must be visited exactly once");

        Ok(())
    }

    #[tokio::test]
    async fn select_on_empty_table_is_safe() -> TestResult {
        let repository = repository().await;

        let selection = repository
            .select_namespace(NamespaceSelectQuery {
                limit: 10,
                ..NamespaceSelectQuery::default()
            })
            .await?;

        assert!(selection.items.is_empty());
        assert_eq!(selection.total, 0);
        assert!(selection.last_uid.is_zero());
        assert!(!selection.has_more);

        Ok(())
    }

    #[tokio::test]
    async fn select_marks_disabled_namespaces() -> TestResult {
        let repository = repository().await;

        repository
            .create_namespace(NewNamespace {
                name: "off".to_string(),
                metadata: BTreeMap::new(),
                status: NamespaceStatus::Disabled,
            })
            .await?;

        let selection = repository
            .select_namespace(NamespaceSelectQuery {
                limit: 10,
                ..NamespaceSelectQuery::default()
            })
            .await?;

        assert_eq!(selection.items.first().map(|item| item.disabled), Some(true));

        Ok(())
    }
}
