use anyhow::Result;
use image::RgbaImage;
use scout_data::CardCatalog;
use scout_state::{DetectionRecord, EngineConfig, Snapshot, StateManager};
use scout_vision::MeterCalibration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::controls::{self, ControlAction, ControlOutcome};

/// Boundary to the object-detection backend. Calls may block (network
/// inference); they are run off the async runtime.
pub trait Detector: Send + Sync + 'static {
    fn detect(&self, frame: &RgbaImage) -> Result<Vec<DetectionRecord>>;
}

/// What the detection worker hands to the state loop for one frame
#[derive(Debug, Clone, Default)]
pub struct DetectionBatch {
    pub detections: Vec<DetectionRecord>,
    pub own_elixir: Option<u8>,
}

/// Manages the frame → detection → state → snapshot pipeline.
///
/// The `StateManager` lives inside the state task; only detection batches,
/// control actions and snapshots cross task boundaries.
pub struct Pipeline {
    stop: Arc<AtomicBool>,
    frame_tx: watch::Sender<Option<Arc<RgbaImage>>>,
    control_tx: mpsc::UnboundedSender<ControlAction>,
    snapshot_rx: watch::Receiver<Option<Snapshot>>,
}

impl Pipeline {
    /// Spawn the detection and state tasks. Must be called inside a tokio runtime.
    pub fn start(
        detector: Arc<dyn Detector>,
        engine: EngineConfig,
        catalog: CardCatalog,
        calibration: MeterCalibration,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        let (frame_tx, frame_rx) = watch::channel::<Option<Arc<RgbaImage>>>(None);
        let (batch_tx, batch_rx) = mpsc::channel::<DetectionBatch>(4);
        let (control_tx, control_rx) = mpsc::unbounded_channel::<ControlAction>();
        let (snapshot_tx, snapshot_rx) = watch::channel::<Option<Snapshot>>(None);

        tokio::spawn(detection_loop(
            detector,
            calibration,
            frame_rx,
            batch_tx,
            stop.clone(),
        ));

        let manager = StateManager::new(engine, catalog, Instant::now());
        tokio::spawn(state_loop(
            manager,
            batch_rx,
            control_rx,
            snapshot_tx,
            stop.clone(),
        ));

        info!("Pipeline started");

        Self {
            stop,
            frame_tx,
            control_tx,
            snapshot_rx,
        }
    }

    /// Offer a new frame. Frames arriving while a detection is in flight
    /// replace each other; only the newest is picked up next.
    pub fn submit_frame(&self, frame: RgbaImage) {
        let _ = self.frame_tx.send(Some(Arc::new(frame)));
    }

    /// Queue an operator action. Returns false once the state task has exited.
    pub fn send_control(&self, action: ControlAction) -> bool {
        self.control_tx.send(action).is_ok()
    }

    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        info!("Pipeline stop requested");
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Runs the detector on the newest frame. The next frame is not taken until
/// the current call returns, so at most one request is in flight.
async fn detection_loop(
    detector: Arc<dyn Detector>,
    calibration: MeterCalibration,
    mut frame_rx: watch::Receiver<Option<Arc<RgbaImage>>>,
    batch_tx: mpsc::Sender<DetectionBatch>,
    stop: Arc<AtomicBool>,
) {
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        if frame_rx.changed().await.is_err() {
            break;
        }

        let frame = frame_rx.borrow_and_update().clone();
        if let Some(frame) = frame {
            let det = detector.clone();
            let cal = calibration.clone();
            let result = tokio::task::spawn_blocking(move || {
                let own_elixir = scout_vision::read_elixir(&frame, &cal).level;
                det.detect(&frame).map(|detections| DetectionBatch {
                    detections,
                    own_elixir: Some(own_elixir),
                })
            })
            .await;

            match result {
                Ok(Ok(batch)) => {
                    debug!("Detector returned {} record(s)", batch.detections.len());
                    if batch_tx.send(batch).await.is_err() {
                        break;
                    }
                }
                Ok(Err(e)) => warn!("Detection failed: {:#}", e),
                Err(e) => warn!("Detection task panicked: {}", e),
            }
        }
    }

    info!("Detection loop stopped");
}

/// Sole owner of the opponent model.
async fn state_loop(
    mut manager: StateManager,
    mut batch_rx: mpsc::Receiver<DetectionBatch>,
    mut control_rx: mpsc::UnboundedReceiver<ControlAction>,
    snapshot_tx: watch::Sender<Option<Snapshot>>,
    stop: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            batch = batch_rx.recv() => {
                let Some(batch) = batch else { break };
                // Batches apply at consumption time, so elixir tracks real elapsed time
                let now = Instant::now();
                manager.record_own_elixir(batch.own_elixir);
                let report = manager.update(&batch.detections, now);
                debug!(
                    "Applied batch: {} play(s), {} duplicate(s), {} skipped, {} new tower(s)",
                    report.plays.len(),
                    report.duplicates,
                    report.skipped,
                    report.towers.created.len()
                );
            }
            action = control_rx.recv() => {
                let Some(action) = action else { break };
                if controls::apply(action, &mut manager, Instant::now()) == ControlOutcome::Quit {
                    stop.store(true, Ordering::Relaxed);
                    break;
                }
            }
        }

        let _ = snapshot_tx.send(Some(manager.snapshot()));

        if stop.load(Ordering::Relaxed) {
            break;
        }
    }

    info!("State loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FixedDetector(Vec<DetectionRecord>);

    impl Detector for FixedDetector {
        fn detect(&self, _frame: &RgbaImage) -> Result<Vec<DetectionRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&self, _frame: &RgbaImage) -> Result<Vec<DetectionRecord>> {
            anyhow::bail!("inference backend unreachable")
        }
    }

    fn start(detector: Arc<dyn Detector>) -> Pipeline {
        Pipeline::start(
            detector,
            EngineConfig::default(),
            CardCatalog::builtin(),
            MeterCalibration::default(),
        )
    }

    async fn wait_for(
        rx: &mut watch::Receiver<Option<Snapshot>>,
        pred: impl Fn(&Snapshot) -> bool,
    ) -> Snapshot {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let current = rx.borrow_and_update().clone();
                if let Some(snap) = current {
                    if pred(&snap) {
                        return snap;
                    }
                }
                rx.changed().await.expect("state loop exited");
            }
        })
        .await
        .expect("timed out waiting for snapshot")
    }

    #[tokio::test]
    async fn test_frame_produces_snapshot() {
        let pipeline = start(Arc::new(FixedDetector(vec![
            DetectionRecord::new("Giant", 0.9, 100.0, 200.0),
            DetectionRecord::new("Princess Tower", 0.9, 100.0, 150.0),
        ])));
        let mut rx = pipeline.subscribe();

        pipeline.submit_frame(RgbaImage::new(450, 800));
        let snap = wait_for(&mut rx, |s| !s.known_cards.is_empty()).await;

        assert_eq!(snap.known_cards, vec!["Giant"]);
        assert!(!snap.structures.left_enemy_down);
        assert!(snap.structures.right_enemy_down);
        // Blank frame: the meter reads empty
        assert_eq!(snap.own_elixir, Some(0));
    }

    #[tokio::test]
    async fn test_detector_failure_keeps_pipeline_alive() {
        let pipeline = start(Arc::new(FailingDetector));
        let mut rx = pipeline.subscribe();

        pipeline.submit_frame(RgbaImage::new(450, 800));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(pipeline.latest_snapshot().is_none());

        assert!(pipeline.send_control(ControlAction::ToggleDoubleElixir));
        let snap = wait_for(&mut rx, |s| s.double_elixir).await;
        assert!(snap.known_cards.is_empty());
    }

    #[tokio::test]
    async fn test_quit_stops_state_loop() {
        let pipeline = start(Arc::new(FixedDetector(Vec::new())));
        let mut rx = pipeline.subscribe();

        assert!(pipeline.send_control(ControlAction::Quit));
        tokio::time::timeout(Duration::from_secs(5), async {
            while rx.changed().await.is_ok() {}
        })
        .await
        .expect("state loop did not exit");
        assert!(pipeline.is_stopped());
    }
}
