use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use crate::input::DigitalInput;
use crate::model::{DeviceConfig, SensorData};
use crate::scheduler::Scheduler;
use crate::sensors::SensorModel;
use crate::store::{self, KvStore};
use crate::sync::{self, SyncOutcome};
use crate::telemetry;
use crate::transport::Transport;

/// The whole device: configuration, sensed state, timers, and the
/// collaborators they talk to. Everything runs on one logical thread; a
/// transport call blocks the tick for its duration.
pub struct Device<T: Transport, S: KvStore, I: DigitalInput> {
    transport: T,
    store: S,
    input: I,
    config: DeviceConfig,
    data: SensorData,
    model: SensorModel,
    scheduler: Scheduler,
    rng: StdRng,
}

impl<T: Transport, S: KvStore, I: DigitalInput> Device<T, S, I> {
    pub fn new(transport: T, store: S, input: I, sync_interval_ms: u64) -> Self {
        let config = store::load_device_config(&store);
        let data = store::initial_sensor_data(&store);
        Self {
            transport,
            store,
            input,
            config,
            data,
            model: SensorModel::new(),
            scheduler: Scheduler::new(sync_interval_ms),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn data(&self) -> &SensorData {
        &self.data
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The unconditional reconciliation round performed once on boot,
    /// before the loop starts ticking.
    pub async fn boot_sync(&mut self) {
        info!("first sync with server");
        self.sync().await;
    }

    /// One loop iteration at `now_ms` on the device's monotonic clock.
    pub async fn tick(&mut self, now_ms: u64) {
        let level = self.input.sample(now_ms);
        let plan = self
            .scheduler
            .plan(now_ms, level, self.data.engine_running, &self.config);

        if plan.engine_toggled {
            self.data.engine_running = !self.data.engine_running;
            info!(engine_running = self.data.engine_running, "ignition toggled");
        }

        if self
            .model
            .advance(&mut self.data, &self.config, now_ms, &mut self.rng)
        {
            // Persist before anything else reads the counter back
            if let Err(e) = store::save_mileage(&mut self.store, self.data.mileage) {
                warn!(error = %e, "failed to persist odometer");
            }
            info!(mileage = self.data.mileage, "odometer incremented");
        }

        if let Some(event_type) = plan.report {
            if let Err(e) =
                telemetry::report(&self.transport, event_type, &self.data, &self.config).await
            {
                warn!(error = %e, "telemetry send failed, will retry on next schedule");
            }
        }

        if plan.sync_due {
            self.sync().await;
        }
    }

    async fn sync(&mut self) {
        match sync::reconcile(
            &self.transport,
            &mut self.store,
            &mut self.config,
            &mut self.data,
        )
        .await
        {
            Ok(SyncOutcome::Synced { config_changed }) => {
                info!(config_changed, "sync completed");
            }
            Ok(SyncOutcome::NotFound) => {
                error!(
                    identity = %self.config.identity,
                    "identity unknown to server; device cannot function until provisioned"
                );
            }
            Err(e) => {
                warn!(error = %e, "sync failed, will retry on next cycle");
            }
        }
    }

    /// Run forever, ticking at the given cadence against a monotonic clock.
    pub async fn run(mut self, tick: Duration) {
        let origin = Instant::now();
        let mut ticker = tokio::time::interval(tick);
        loop {
            ticker.tick().await;
            let now_ms = origin.elapsed().as_millis() as u64;
            self.tick(now_ms).await;
        }
    }
}
