//! Timer scheduler on tokio's timer wheel.

use std::time::Duration;

use crate::core::{TimerCallback, TimerHandle, TimerScheduler};
use crate::runtime::TokioSpawner;

/// Runs each timer as a sleeping tokio task; cancelling aborts the task.
#[derive(Clone)]
pub struct TokioTimerScheduler {
    spawner: TokioSpawner,
}

impl TokioTimerScheduler {
    /// Schedule timers on the runtime behind `spawner`.
    pub const fn new(spawner: TokioSpawner) -> Self {
        Self { spawner }
    }
}

impl TimerScheduler for TokioTimerScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let task = self.spawner.handle().spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        let abort = task.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}
