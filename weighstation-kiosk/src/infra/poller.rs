use std::future::Future;
use std::time::Duration;

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Fixed-interval background loop that can be stopped.
///
/// Stopping only prevents future ticks: a tick that is already running
/// (typically suspended on a network request) completes and its handler
/// still runs. Dropping the handle stops the loop the same way.
#[derive(Debug)]
pub struct PollTask {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollTask {
    /// Spawn a loop calling `tick` every `period`.
    ///
    /// With `immediate` the first tick fires right away, otherwise one
    /// period after spawning. Ticks never overlap; a slow tick delays the
    /// next one instead of bursting.
    pub fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        immediate: bool,
        mut tick: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let first = if immediate {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                    _ = ticker.tick() => {}
                }

                tick().await;
            }

            debug!(poller = name, "poll loop stopped");
        });

        debug!(poller = name, period = ?period, immediate, "poll loop started");
        Self {
            name,
            stop_tx,
            task,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signal the loop to stop after any in-flight tick.
    ///
    /// The returned handle resolves once the loop has exited.
    pub fn stop(self) -> JoinHandle<()> {
        let _ = self.stop_tx.send(true);
        self.task
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
