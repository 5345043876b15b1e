//! Offline write queue.
//!
//! Mutations issued while offline (or while the backend is unreachable)
//! are appended here and replayed in order once connectivity returns.
//! Delivery is at-least-once: a mutation leaves the queue only after the
//! backend accepts it, so a replay that raced a direct write may apply
//! twice. Failed mutations stay queued for the next flush.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{tables, SupabaseClient};
use crate::error::AthenoResult;
use crate::models::{NewPomodoroSession, TaskStatus};
use crate::traits::KeyValueStorage;

/// Storage key the queue persists under.
pub const QUEUE_KEY: &str = "sb_request_queue";

/// The write operations the queue can carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationKind {
    CreatePomodoroSession(NewPomodoroSession),
    UpdateRoadmapProgress {
        roadmap_id: String,
        /// Completion percentage, 0–100.
        progress: f64,
    },
    UpdateCourse {
        course_id: String,
        /// Column/value pairs to patch.
        changes: serde_json::Value,
    },
    UpdateTaskStatus {
        task_id: String,
        status: TaskStatus,
    },
}

impl MutationKind {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            MutationKind::CreatePomodoroSession(_) => "create_pomodoro_session",
            MutationKind::UpdateRoadmapProgress { .. } => "update_roadmap_progress",
            MutationKind::UpdateCourse { .. } => "update_course",
            MutationKind::UpdateTaskStatus { .. } => "update_task_status",
        }
    }
}

/// One queued write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedMutation {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: MutationKind,
    pub queued_at: DateTime<Utc>,
    /// Flush attempts so far.
    #[serde(default)]
    pub attempts: u32,
}

/// Outcome of one [`OfflineQueue::process`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Persistent FIFO of pending writes.
#[derive(Clone)]
pub struct OfflineQueue {
    storage: Arc<dyn KeyValueStorage>,
    entries: Arc<Mutex<Vec<QueuedMutation>>>,
}

impl OfflineQueue {
    /// Load the queue from storage. A corrupt or unreadable payload is
    /// dropped and the queue starts empty.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let entries = match storage.get(QUEUE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<QueuedMutation>>(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!("Discarding corrupt offline queue: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!("Failed to read offline queue: {}", err);
                Vec::new()
            }
        };

        Self {
            storage,
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Append a mutation, returning its queue id.
    pub fn enqueue(&self, kind: MutationKind) -> Uuid {
        let entry = QueuedMutation {
            id: Uuid::new_v4(),
            kind,
            queued_at: Utc::now(),
            attempts: 0,
        };
        let id = entry.id;

        let mut entries = self.entries.lock().unwrap();
        tracing::info!("Queued {} ({})", entry.kind.label(), id);
        entries.push(entry);
        self.persist(&entries);
        id
    }

    /// Remove a mutation by id. Returns whether it was present.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if removed {
            self.persist(&entries);
        }
        removed
    }

    /// Snapshot of the pending mutations, oldest first.
    pub fn pending(&self) -> Vec<QueuedMutation> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of pending mutations.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Replay the queue against the backend in order.
    ///
    /// Each delivered mutation is removed as soon as the backend accepts
    /// it. A failed mutation stays in place with its attempt count bumped
    /// and processing moves on to the next entry.
    pub async fn process(&self, client: &SupabaseClient) -> FlushReport {
        let snapshot = self.pending();
        if snapshot.is_empty() {
            return FlushReport::default();
        }
        tracing::info!("Flushing offline queue ({} pending)", snapshot.len());

        let mut report = FlushReport::default();
        for entry in snapshot {
            match Self::apply(client, &entry.kind).await {
                Ok(()) => {
                    self.remove(entry.id);
                    report.delivered += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        "Queued {} ({}) failed on attempt {}: {}",
                        entry.kind.label(),
                        entry.id,
                        entry.attempts + 1,
                        err
                    );
                    self.bump_attempts(entry.id);
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn apply(client: &SupabaseClient, kind: &MutationKind) -> AthenoResult<()> {
        match kind {
            MutationKind::CreatePomodoroSession(session) => {
                client
                    .table(tables::POMODORO_SESSIONS)
                    .insert_only(session)
                    .await
            }
            MutationKind::UpdateRoadmapProgress {
                roadmap_id,
                progress,
            } => {
                client
                    .table(tables::ROADMAPS)
                    .eq("id", roadmap_id)
                    .update(&serde_json::json!({ "progress": progress }))
                    .await
            }
            MutationKind::UpdateCourse { course_id, changes } => {
                client
                    .table(tables::COURSES)
                    .eq("id", course_id)
                    .update(changes)
                    .await
            }
            MutationKind::UpdateTaskStatus { task_id, status } => {
                client
                    .table(tables::TASKS)
                    .eq("id", task_id)
                    .update(&serde_json::json!({ "status": status.as_str() }))
                    .await
            }
        }
    }

    fn bump_attempts(&self, id: Uuid) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
            entry.attempts += 1;
        }
        self.persist(&entries);
    }

    fn persist(&self, entries: &[QueuedMutation]) {
        match serde_json::to_string(entries) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(QUEUE_KEY, &raw) {
                    tracing::warn!("Failed to persist offline queue: {}", err);
                }
            }
            Err(err) => tracing::warn!("Failed to serialize offline queue: {}", err),
        }
    }
}
