//! Per-screen automatic stop tasks.
//!
//! Each committed move spawns one task that sleeps until the deadline and
//! then asks [`SharedScreenState::fire_auto_stop`] to send Stop. The task
//! belongs to its screen through an [`AutoStopHandle`]; there is no global
//! timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::shared::SharedScreenState;
use crate::error::{Error, Result};
use crate::motion::AutoStop;
use crate::traits::AsyncTransport;

/// Handle to a scheduled automatic stop.
///
/// Cancelling or dropping the handle stops the timer. A task already past
/// its sleep still runs to completion, but the generation check makes it a
/// no-op once its schedule has been superseded.
#[derive(Debug)]
pub struct AutoStopHandle {
    schedule: AutoStop,
    cancel: CancellationToken,
    task: JoinHandle<Result<bool>>,
}

impl AutoStopHandle {
    /// Spawn the timer for `schedule` on the current runtime.
    pub fn spawn<T>(shared: Arc<SharedScreenState<T>>, schedule: AutoStop) -> Self
    where
        T: AsyncTransport + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let delay = schedule.deadline_ms.saturating_sub(shared.now_ms());
            tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(false),
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
            }
            shared.fire_auto_stop(schedule.generation).await
        });

        Self {
            schedule,
            cancel,
            task,
        }
    }

    /// What this handle will fire.
    pub fn schedule(&self) -> AutoStop {
        self.schedule
    }

    /// Stop the timer. Does not send anything.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the task has finished, fired or not.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task.
    ///
    /// Returns whether a Stop was sent. Must not be polled again after it
    /// completes.
    pub(crate) async fn join(&mut self) -> Result<bool> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(Error::Cancelled),
        }
    }
}

impl Drop for AutoStopHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
