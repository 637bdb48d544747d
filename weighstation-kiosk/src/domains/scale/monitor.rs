//! Scale weight polling
//!
//! The monitor reads the scale on a fixed cadence that mirrors the sensor's
//! own refresh rate. Failures are never fatal: single misses are absorbed
//! and only a run of `failure_threshold` consecutive misses marks the scale
//! disconnected. The next good reading reconnects it.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use weighstation_config::ScaleConfig;
use weighstation_model::WeightSample;

use crate::domains::presentation::Presentation;
use crate::error::{KioskError, KioskResult};
use crate::infra::constants::messages;
use crate::infra::poller::PollTask;
use crate::infra::services::api::KioskApi;

pub struct ScaleMonitor {
    inner: Arc<ScaleInner>,
    poll: Mutex<Option<PollTask>>,
}

struct ScaleInner {
    api: Arc<dyn KioskApi>,
    presentation: Arc<dyn Presentation>,
    config: ScaleConfig,
    state: Mutex<ScaleState>,
}

#[derive(Debug, Default)]
struct ScaleState {
    consecutive_failures: u32,
    connected: bool,
    announced: bool,
    last: Option<WeightSample>,
}

impl std::fmt::Debug for ScaleMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaleMonitor")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.lock())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ScaleMonitor {
    pub fn new(
        api: Arc<dyn KioskApi>,
        presentation: Arc<dyn Presentation>,
        config: &ScaleConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ScaleInner {
                api,
                presentation,
                config: config.clone(),
                state: Mutex::new(ScaleState::default()),
            }),
            poll: Mutex::new(None),
        }
    }

    /// Start polling. A running loop is replaced, not duplicated.
    ///
    /// The first start reports the scale as disconnected until a reading
    /// arrives.
    pub fn start(&self) {
        let announce_offline = {
            let mut state = self.inner.state.lock();
            !std::mem::replace(&mut state.announced, true) && !state.connected
        };
        if announce_offline {
            self.inner.presentation.report_scale_connection(false);
        }

        let mut slot = self.poll.lock();
        if let Some(previous) = slot.take() {
            debug!("restarting scale monitor");
            drop(previous.stop());
        }

        let inner = Arc::clone(&self.inner);
        *slot = Some(PollTask::spawn(
            "scale",
            self.inner.config.poll_interval,
            false,
            move || {
                let inner = Arc::clone(&inner);
                async move {
                    let _ = inner.poll_once().await;
                }
            },
        ));
        info!(
            interval = ?self.inner.config.poll_interval,
            "scale monitoring started"
        );
    }

    /// Stop polling. A read already in flight still completes.
    pub fn stop(&self) {
        if let Some(poll) = self.poll.lock().take() {
            drop(poll.stop());
            info!("scale monitoring stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.poll
            .lock()
            .as_ref()
            .is_some_and(|poll| !poll.is_finished())
    }

    /// Last successfully read weight, or 0 before the first reading.
    pub fn current_weight(&self) -> f64 {
        self.inner
            .state
            .lock()
            .last
            .map_or(0.0, |sample| sample.value)
    }

    pub fn latest_sample(&self) -> Option<WeightSample> {
        self.inner.state.lock().last
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().connected
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.state.lock().consecutive_failures
    }

    /// Run a single read outside the loop.
    pub async fn poll_once(&self) -> KioskResult<WeightSample> {
        self.inner.poll_once().await
    }
}

impl ScaleInner {
    async fn poll_once(&self) -> KioskResult<WeightSample> {
        let reading = self.api.read_weight().await.and_then(|value| {
            WeightSample::connected(value)
                .map_err(|err| KioskError::decode(200, err))
        });

        match reading {
            Ok(sample) => {
                self.record_success(sample);
                Ok(sample)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    fn record_success(&self, sample: WeightSample) {
        let reconnected = {
            let mut state = self.state.lock();
            state.announced = true;
            state.consecutive_failures = 0;
            state.last = Some(sample);
            !std::mem::replace(&mut state.connected, true)
        };

        self.presentation.report_weight(&sample);
        if reconnected {
            info!(weight = sample.value, "scale connected");
            self.presentation.report_scale_connection(true);
        }
    }

    fn record_failure(&self, err: &KioskError) {
        let threshold = self.config.failure_threshold.max(1);
        let failures = {
            let mut state = self.state.lock();
            state.consecutive_failures =
                state.consecutive_failures.saturating_add(1);
            if state.consecutive_failures == threshold {
                state.connected = false;
                state.last = state.last.map(WeightSample::disconnected);
            }
            state.consecutive_failures
        };

        if failures == threshold {
            warn!(
                failures,
                error = %err,
                "{}", messages::SCALE_ERROR
            );
            self.presentation.report_scale_connection(false);
        } else {
            debug!(failures, error = %err, "scale read failed");
        }
    }
}
