use super::SharedScheduler;
use crate::registry::SharedRegistry;
use crate::renderer::Renderer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Drives the scheduler on a fixed period and hands due rotations to the
/// renderer.
pub struct SchedulerRunner {
    registry: SharedRegistry,
    scheduler: SharedScheduler,
    renderer: Arc<dyn Renderer>,
    period: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

impl SchedulerRunner {
    pub fn new(
        registry: SharedRegistry,
        scheduler: SharedScheduler,
        renderer: Arc<dyn Renderer>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        let period = scheduler.lock().settings().period;
        Self {
            registry,
            scheduler,
            renderer,
            period,
            shutdown_rx,
        }
    }

    /// Run passes until a shutdown signal arrives or the sender is dropped.
    ///
    /// The first pass runs immediately; each later pass is armed only after
    /// the previous one finished.
    pub async fn run(mut self) {
        tracing::info!(
            "Scheduler started ({}s per tick, renderer: {})",
            self.period.as_secs(),
            self.renderer.name()
        );

        loop {
            self.run_pass();

            tokio::select! {
                biased;

                _ = self.shutdown_rx.recv() => {
                    tracing::info!("Scheduler shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.period) => {}
            }
        }
    }

    /// Tick every target once and dispatch the resulting rotations.
    ///
    /// Registry and schedule changes written by other processes since the
    /// last pass are loaded first.
    ///
    /// Renderer calls run on their own tasks so a slow target never delays
    /// the next pass. The returned handles resolve once each call finished.
    pub fn run_pass(&self) -> Vec<JoinHandle<()>> {
        let deliveries = {
            let mut registry = self.registry.lock();
            if let Err(e) = registry.reload_if_changed() {
                tracing::warn!("Keeping in-memory registry; reload failed: {}", e);
            }
            let mut scheduler = self.scheduler.lock();
            scheduler.tick(&registry)
        };

        deliveries
            .into_iter()
            .map(|delivery| {
                let renderer = Arc::clone(&self.renderer);
                tokio::spawn(async move {
                    if let Err(e) = renderer
                        .apply_skin(delivery.target, &delivery.reference, false)
                        .await
                    {
                        tracing::warn!(
                            target_id = %delivery.target,
                            "Renderer '{}' failed: {:#}",
                            renderer.name(),
                            e
                        );
                    }
                })
            })
            .collect()
    }
}
