//! Best-effort long-term memory updates.

use crate::locks::KeyedLocks;
use crate::memory::{LongTermMemory, MemoryUpdate};
use crate::orchestrator::PipelineStage;
use log::{debug, warn};
use parking_lot::Mutex;
use tokio::task::JoinSet;

/// Run one summary update under the user's lock; failures are only logged.
pub(crate) async fn update_memory(
    memory: LongTermMemory,
    user_locks: KeyedLocks,
    user_id: String,
    text: String,
) -> Option<MemoryUpdate> {
    let _guard = user_locks.lock(&user_id).await;
    match memory.update(&user_id, &text).await {
        Ok(update) => {
            debug!(
                "long-term memory update finished (user_id={}, replaced={})",
                user_id,
                matches!(update, MemoryUpdate::Replaced(_))
            );
            Some(update)
        }
        Err(err) => {
            warn!(
                "long-term memory update failed (stage={}, user_id={}, error={})",
                PipelineStage::UpdateMemory,
                user_id,
                err
            );
            None
        }
    }
}

/// Tracks spawned memory updates so shutdown can wait for them.
#[derive(Default)]
pub(crate) struct BackgroundTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    pub(crate) fn spawn(
        &self,
        memory: LongTermMemory,
        user_locks: KeyedLocks,
        user_id: String,
        text: String,
    ) {
        let mut tasks = self.tasks.lock();
        while let Some(result) = tasks.try_join_next() {
            if let Err(err) = result {
                warn!("memory update task failed (error={})", err);
            }
        }
        tasks.spawn(async move {
            update_memory(memory, user_locks, user_id, text).await;
        });
    }

    pub(crate) fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Wait for every spawned update; returns how many were awaited.
    pub(crate) async fn drain(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        let mut drained = 0;
        while let Some(result) = tasks.join_next().await {
            drained += 1;
            if let Err(err) = result {
                warn!("memory update task failed (error={})", err);
            }
        }
        drained
    }
}
