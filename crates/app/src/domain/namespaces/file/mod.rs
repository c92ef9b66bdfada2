//! File-backed namespace repository.
//!
//! Namespaces live in memory and are periodically persisted to a YAML file.
//! Mutations set a dirty flag under an exclusive lock; a background task
//! flushes the whole collection on an interval by writing a sibling `.tmp`
//! file and atomically renaming it over the canonical path, so a crash
//! mid-write never leaves a partial document at the canonical path. Closing
//! the repository stops the task and performs one final flush.
//!
//! Single-process, single-writer by design: concurrent multi-instance access
//! to the same file is unsafe.

mod model;

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::{
    fs,
    sync::{RwLock, oneshot},
    task::JoinHandle,
    time,
};
use tracing::{debug, warn};

use crate::{
    config::storage::StorageConfig,
    domain::namespaces::{
        file::model::StoredNamespace,
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

#[derive(Debug, Clone)]
struct StorePaths {
    canonical: PathBuf,
    tmp: PathBuf,
}

#[derive(Debug, Default)]
struct FileState {
    namespaces: Vec<StoredNamespace>,
    next_id: u32,
    dirty: bool,
}

/// Builds [`FileNamespaceRepository`] instances; registered under the `file`
/// driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileNamespaceFactory;

#[async_trait]
impl NamespaceRepositoryFactory for FileNamespaceFactory {
    async fn build(&self, config: &StorageConfig) -> Result<NamespaceHandle, RepositoryError> {
        let generator = Arc::new(
            SnowflakeGenerator::new(config.node_id)
                .map_err(|error| RepositoryError::InvalidArgument(error.to_string()))?,
        );

        fs::create_dir_all(&config.file_dir).await?;
        let paths = StorePaths {
            canonical: config.file_dir.join(&config.file_name),
            tmp: config.file_dir.join(format!("{}.tmp", config.file_name)),
        };

        let state = Arc::new(RwLock::new(load(&paths.canonical, &generator).await?));

        let repository = Arc::new(FileNamespaceRepository {
            state: Arc::clone(&state),
            generator,
        });

        let (stop_tx, stop_rx) = oneshot::channel();
        let flusher = spawn_flush_loop(
            Arc::clone(&state),
            paths.clone(),
            Duration::from_secs(config.flush_interval_secs.max(1)),
            stop_rx,
        );

        let cleanup: Cleanup = Box::new(move || {
            Box::pin(async move {
                let _ = stop_tx.send(());
                if let Err(error) = flusher.await {
                    warn!(%error, "namespace store flush task terminated abnormally");
                }
                let mut guard = state.write().await;
                if guard.dirty {
                    save_locked(&paths, &mut guard).await?;
                }
                Ok(())
            })
        });

        Ok(NamespaceHandle {
            repository,
            cleanup,
        })
    }
}

/// In-memory namespace collection persisted through the background flusher.
#[derive(Debug)]
pub struct FileNamespaceRepository {
    state: Arc<RwLock<FileState>>,
    generator: Arc<SnowflakeGenerator>,
}

#[async_trait]
impl NamespaceRepository for FileNamespaceRepository {
    async fn create_namespace(
        &self,
        new: NewNamespace,
    ) -> Result<NamespaceRecord, RepositoryError> {
        let now = jiff::Timestamp::now().as_second();
        let mut state = self.state.write().await;

        state.dirty = true;
        state.next_id += 1;
        let stored = StoredNamespace {
            id: state.next_id,
            uid: self.generator.generate(),
            status: new.effective_status(),
            name: new.name,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
            deleted_at: 0,
            creator: self.generator.generate(),
        };
        let record = stored.to_record();
        state.namespaces.push(stored);

        Ok(record)
    }

    async fn get_namespace(&self, uid: Uid) -> Result<NamespaceRecord, RepositoryError> {
        let state = self.state.read().await;

        state
            .namespaces
            .iter()
            .find(|namespace| namespace.uid == uid)
            .map(StoredNamespace::to_record)
            .ok_or_else(|| RepositoryError::NotFound(format!("namespace {uid}")))
    }

    async fn get_namespace_by_name(
        &self,
        name: &str,
    ) -> Result<NamespaceRecord, RepositoryError> {
        let state = self.state.read().await;

        state
            .namespaces
            .iter()
            .find(|namespace| namespace.name == name)
            .map(StoredNamespace::to_record)
            .ok_or_else(|| RepositoryError::NotFound(format!("namespace {name}")))
    }

    async fn update_namespace(
        &self,
        update: NamespaceUpdate,
    ) -> Result<ResultInfo, RepositoryError> {
        let now = jiff::Timestamp::now().as_second();
        let mut state = self.state.write().await;

        let Some(position) = state
            .namespaces
            .iter()
            .position(|namespace| namespace.uid == update.uid)
        else {
            return Ok(ResultInfo::failed("namespace not found"));
        };

        state.dirty = true;
        if let Some(stored) = state.namespaces.get_mut(position) {
            stored.name = update.name;
            stored.metadata = update.metadata;
            stored.updated_at = now;
        }

        Ok(ResultInfo::affected(1))
    }

    async fn update_namespace_status(
        &self,
        update: NamespaceStatusUpdate,
    ) -> Result<ResultInfo, RepositoryError> {
        let now = jiff::Timestamp::now().as_second();
        let mut state = self.state.write().await;

        let Some(position) = state
            .namespaces
            .iter()
            .position(|namespace| namespace.uid == update.uid)
        else {
            return Ok(ResultInfo::failed("namespace not found"));
        };

        state.dirty = true;
        if let Some(stored) = state.namespaces.get_mut(position) {
            stored.status = update.status;
            stored.updated_at = now;
        }

        Ok(ResultInfo::affected(1))
    }

    async fn delete_namespace(&self, uid: Uid) -> Result<ResultInfo, RepositoryError> {
        let mut state = self.state.write().await;

        let Some(position) = state
            .namespaces
            .iter()
            .position(|namespace| namespace.uid == uid)
        else {
            return Ok(ResultInfo::failed("namespace not found"));
        };

        state.dirty = true;
        state.namespaces.remove(position);

        Ok(ResultInfo::affected(1))
    }

    async fn list_namespace(
        &self,
        query: NamespaceListQuery,
    ) -> Result<NamespacePage, RepositoryError> {
        let state = self.state.read().await;
        let mut records: Vec<NamespaceRecord> = state
            .namespaces
            .iter()
            .filter(|namespace| matches_filters(namespace, query.status, &query.keyword))
            .map(StoredNamespace::to_record)
            .collect();
        drop(state);

        sort_records(&mut records, query.order_by, query.order);
        let namespaces = paginate(records, query.page, query.page_size);

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
        let state = self.state.read().await;
        let mut matched: Vec<NamespaceRecord> = state
            .namespaces
            .iter()
            .filter(|namespace| matches_filters(namespace, query.status, &query.keyword))
            .filter(|namespace| after_cursor(namespace.uid, query.last_uid, query.order))
            .map(StoredNamespace::to_record)
            .collect();
        drop(state);

        sort_records(&mut matched, SortField::Uid, query.order);

        let limit = query.limit as usize;
        let items: Vec<_> = matched
            .iter()
            .take(limit)
            .map(NamespaceRecord::to_select_item)
            .collect();
        let has_more = limit > 0 && items.len() == limit;
        let last_uid = items.last().map_or(Uid::ZERO, |item| item.value);

        Ok(NamespaceSelection {
            total: items.len() as i64,
            items,
            last_uid,
            has_more,
        })
    }
}

fn matches_filters(namespace: &StoredNamespace, status: NamespaceStatus, keyword: &str) -> bool {
    if status != NamespaceStatus::Unknown && namespace.status != status {
        return false;
    }
    keyword.is_empty() || namespace.name.contains(keyword)
}

fn after_cursor(uid: Uid, last_uid: Uid, order: SortOrder) -> bool {
    if last_uid.is_zero() {
        return true;
    }
    match order {
        SortOrder::Asc => uid > last_uid,
        SortOrder::Desc => uid < last_uid,
    }
}

fn sort_records(records: &mut [NamespaceRecord], field: SortField, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = match field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Uid => a.uid.cmp(&b.uid),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Status => a.status.as_u8().cmp(&b.status.as_u8()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::DeletedAt => a.deleted_at.unwrap_or(0).cmp(&b.deleted_at.unwrap_or(0)),
            SortField::Creator => a.creator.cmp(&b.creator),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn paginate(records: Vec<NamespaceRecord>, page: u32, page_size: u32) -> Vec<NamespaceRecord> {
    if page == 0 || page_size == 0 {
        return records;
    }
    let start = (page as usize - 1).saturating_mul(page_size as usize);
    records
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect()
}

async fn load(
    canonical: &Path,
    generator: &SnowflakeGenerator,
) -> Result<FileState, RepositoryError> {
    let content = match fs::read_to_string(canonical).await {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileState::default());
        }
        Err(error) => return Err(error.into()),
    };
    if content.trim().is_empty() {
        return Ok(FileState::default());
    }

    let mut namespaces: Vec<StoredNamespace> = serde_norway::from_str(&content)?;
    namespaces.sort_by_key(|namespace| namespace.id);

    let mut next_id = namespaces.last().map_or(0, |namespace| namespace.id);
    for namespace in &mut namespaces {
        if namespace.id == 0 {
            next_id += 1;
            namespace.id = next_id;
        }
        // Hand-edited entries may lack a uid; once assigned it never changes.
        if namespace.uid.is_zero() {
            namespace.uid = generator.generate();
        }
    }

    Ok(FileState {
        namespaces,
        next_id,
        dirty: false,
    })
}

async fn save_locked(paths: &StorePaths, state: &mut FileState) -> Result<(), RepositoryError> {
    let serialized = serde_norway::to_string(&state.namespaces)?;
    fs::write(&paths.tmp, serialized).await?;
    fs::rename(&paths.tmp, &paths.canonical).await?;
    state.dirty = false;
    debug!(path = %paths.canonical.display(), "persisted namespace store");
    Ok(())
}

fn spawn_flush_loop(
    state: Arc<RwLock<FileState>>,
    paths: StorePaths,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _watcher = watch_external_changes(&paths.canonical);
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let mut guard = state.write().await;
                    if guard.dirty {
                        if let Err(error) = save_locked(&paths, &mut guard).await {
                            warn!(
                                %error,
                                path = %paths.canonical.display(),
                                "failed to flush namespace store"
                            );
                        }
                    }
                }
                _ = &mut stop_rx => {
                    debug!("stopping namespace store flush loop");
                    return;
                }
            }
        }
    })
}

/// Watch the store's directory and log changes to the canonical file made
/// outside this process. External edits are not merged; the next flush may
/// overwrite them.
fn watch_external_changes(canonical: &Path) -> Option<notify::RecommendedWatcher> {
    let file_name = canonical.file_name().map(OsStr::to_os_string)?;
    let display = canonical.display().to_string();

    let watcher_result = notify::recommended_watcher(
        move |result: Result<notify::Event, notify::Error>| match result {
            Ok(event) => {
                let touches_store = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) && event
                    .paths
                    .iter()
                    .any(|path| path.file_name() == Some(file_name.as_os_str()));
                if touches_store {
                    debug!(path = %display, "namespace store changed on disk");
                }
            }
            Err(error) => warn!(%error, "namespace store watch failed"),
        },
    );
    let mut watcher = match watcher_result {
        Ok(watcher) => watcher,
        Err(error) => {
            warn!(%error, "failed to create namespace store watcher");
            return None;
        }
    };

    // Watch the parent directory: the canonical file may not exist yet and
    // every flush replaces it wholesale.
    let dir = canonical
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    if let Err(error) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        warn!(%error, dir = %dir.display(), "failed to watch namespace store directory");
        return None;
    }

    Some(watcher)
}
