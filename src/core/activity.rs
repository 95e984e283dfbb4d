//! Best-effort audit trail writer.
//!
//! Writes go through the `log_user_activity` database procedure first, then a
//! direct insert into `user_activities`. If both fail, the entry is kept in a
//! bounded in-memory buffer (oldest evicted) for inspection from the admin
//! API. [`ActivityLogger::log`] never returns an error: a failed audit write
//! must not fail the user action that triggered it.
//!
//! Background writes are tracked so [`ActivityLogger::flush`] can wait for
//! them, e.g. before a user's rows are deleted.

use crate::{entities::user_activity, errors::Result};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Set, Statement};
use serde::Serialize;
use std::{collections::VecDeque, sync::Arc};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

/// Default number of failed entries kept in memory
pub const DEFAULT_BUFFER_CAPACITY: usize = 50;

/// One audit record to be written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub user_id: String,
    /// e.g. `owner_created`
    pub activity_type: String,
    pub description: String,
    pub metadata: serde_json::Value,
}

impl ActivityEntry {
    /// Creates an entry with empty metadata.
    pub fn new(
        user_id: impl Into<String>,
        activity_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            activity_type: activity_type.into(),
            description: description.into(),
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Replaces the metadata object.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// An entry that could not be written by either path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedActivity {
    pub entry: ActivityEntry,
    pub failed_at: DateTime<Utc>,
    /// Error from the last attempted path
    pub error: String,
}

/// Fire-and-forget activity writer. Cheap to clone; clones share the buffer.
#[derive(Debug, Clone)]
pub struct ActivityLogger {
    db: DatabaseConnection,
    failures: Arc<Mutex<VecDeque<FailedActivity>>>,
    capacity: usize,
    pending: TaskTracker,
    /// Serializes flushes; a concurrent `reopen` would leave another flush waiting.
    flushing: Arc<Mutex<()>>,
}

impl ActivityLogger {
    /// Creates a logger keeping at most `capacity` failed entries.
    #[must_use]
    pub fn new(db: DatabaseConnection, capacity: usize) -> Self {
        Self {
            db,
            failures: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
            pending: TaskTracker::new(),
            flushing: Arc::new(Mutex::new(())),
        }
    }

    /// Writes the entry, falling back from procedure to insert to buffer.
    pub async fn log(&self, entry: ActivityEntry) {
        match self.log_via_procedure(&entry).await {
            Ok(()) => {
                debug!(activity_type = %entry.activity_type, "Activity logged via procedure");
                return;
            }
            Err(e) => warn!("Activity procedure failed, trying direct insert: {}", e),
        }

        match self.log_via_insert(&entry).await {
            Ok(()) => {
                debug!(activity_type = %entry.activity_type, "Activity logged via direct insert");
            }
            Err(e) => {
                error!(
                    activity_type = %entry.activity_type,
                    "Activity could not be written, buffering locally: {}", e
                );
                self.buffer_failure(entry, e.to_string()).await;
            }
        }
    }

    /// Runs [`Self::log`] on a background task.
    ///
    /// Callers normally drop the handle; [`Self::flush`] still waits for it.
    pub fn spawn(&self, entry: ActivityEntry) -> JoinHandle<()> {
        let logger = self.clone();
        self.pending.spawn(async move { logger.log(entry).await })
    }

    /// Waits until every write started by [`Self::spawn`] has finished.
    pub async fn flush(&self) {
        let _guard = self.flushing.lock().await;
        self.pending.close();
        self.pending.wait().await;
        self.pending.reopen();
        debug!("Pending activity writes flushed");
    }

    /// Entries that failed both write paths, oldest first.
    pub async fn recent_failures(&self) -> Vec<FailedActivity> {
        self.failures.lock().await.iter().cloned().collect()
    }

    /// Empties the failure buffer and returns how many entries were dropped.
    pub async fn clear_failures(&self) -> usize {
        let mut failures = self.failures.lock().await;
        let count = failures.len();
        failures.clear();
        count
    }

    async fn log_via_procedure(&self, entry: &ActivityEntry) -> Result<()> {
        let backend = self.db.get_database_backend();
        let sql = match backend {
            DbBackend::Postgres => "SELECT log_user_activity($1, $2, $3, $4::jsonb)",
            _ => "SELECT log_user_activity(?, ?, ?, ?)",
        };
        let statement = Statement::from_sql_and_values(
            backend,
            sql,
            [
                entry.user_id.clone().into(),
                entry.activity_type.clone().into(),
                entry.description.clone().into(),
                entry.metadata.to_string().into(),
            ],
        );
        self.db.execute(statement).await?;
        Ok(())
    }

    async fn log_via_insert(&self, entry: &ActivityEntry) -> Result<()> {
        let row = user_activity::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(entry.user_id.clone()),
            activity_type: Set(entry.activity_type.clone()),
            description: Set(entry.description.clone()),
            metadata: Set(entry.metadata.to_string()),
            created_at: Set(Utc::now()),
        };
        user_activity::Entity::insert(row)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn buffer_failure(&self, entry: ActivityEntry, error: String) {
        if self.capacity == 0 {
            return;
        }
        let mut failures = self.failures.lock().await;
        while failures.len() >= self.capacity {
            failures.pop_front();
        }
        failures.push_back(FailedActivity {
            entry,
            failed_at: Utc::now(),
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::UserActivity,
        test_utils::{setup_failing_test_db, setup_test_db},
    };

    #[tokio::test]
    async fn test_falls_back_to_direct_insert() -> Result<()> {
        // SQLite has no log_user_activity procedure, so the first path always fails.
        let db = setup_test_db().await?;
        let logger = ActivityLogger::new(db.clone(), DEFAULT_BUFFER_CAPACITY);

        logger
            .log(
                ActivityEntry::new("user-1", "owner_created", "Created owner Giulia Rossi")
                    .with_metadata(serde_json::json!({ "owner_id": "o-1" })),
            )
            .await;

        let rows = UserActivity::find().all(&db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].activity_type, "owner_created");
        assert!(rows[0].metadata.contains("o-1"));
        assert!(logger.recent_failures().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_both_paths_failing_buffers_entry() -> Result<()> {
        let logger = ActivityLogger::new(setup_failing_test_db().await?, DEFAULT_BUFFER_CAPACITY);

        logger
            .log(ActivityEntry::new("user-1", "property_deleted", "Deleted Casa Roma"))
            .await;

        let failures = logger.recent_failures().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entry.activity_type, "property_deleted");
        assert!(failures[0].error.contains("user_activities"));
        Ok(())
    }

    #[tokio::test]
    async fn test_buffer_is_bounded_and_evicts_oldest() -> Result<()> {
        let logger = ActivityLogger::new(setup_failing_test_db().await?, 2);

        for i in 0..3 {
            logger
                .log(ActivityEntry::new("user-1", format!("event_{i}"), "x"))
                .await;
        }

        let failures = logger.recent_failures().await;
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].entry.activity_type, "event_1");
        assert_eq!(failures[1].entry.activity_type, "event_2");

        assert_eq!(logger.clear_failures().await, 2);
        assert!(logger.recent_failures().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_nothing() -> Result<()> {
        let logger = ActivityLogger::new(setup_failing_test_db().await?, 0);
        logger.log(ActivityEntry::new("user-1", "login", "x")).await;
        assert!(logger.recent_failures().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_spawned_log_completes_in_background() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = ActivityLogger::new(db.clone(), DEFAULT_BUFFER_CAPACITY);

        let handle = logger.spawn(ActivityEntry::new("user-2", "assignment_created", "x"));
        let _ = handle.await;

        assert_eq!(UserActivity::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_flush_waits_for_detached_writes() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = ActivityLogger::new(db.clone(), DEFAULT_BUFFER_CAPACITY);

        for i in 0..5 {
            drop(logger.spawn(ActivityEntry::new("user-2", format!("event_{i}"), "x")));
        }
        logger.flush().await;
        assert_eq!(UserActivity::find().all(&db).await?.len(), 5);

        // The logger keeps accepting writes after a flush.
        drop(logger.spawn(ActivityEntry::new("user-2", "event_5", "x")));
        logger.flush().await;
        assert_eq!(UserActivity::find().all(&db).await?.len(), 6);
        Ok(())
    }
}
