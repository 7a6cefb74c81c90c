//! Background loading of refined shape masks.
//!
//! Each request spawns one worker that decodes `<mask_dir>/<shape>.png` for
//! every listed shape and sends the results back tagged with the generation
//! epoch they were requested for. The engine polls once per frame; the
//! library discards anything whose epoch is no longer current.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, warn};

use crate::error::MaskError;
use crate::mask::AlphaMask;
use crate::shape::ShapeId;

/// One finished load.
#[derive(Debug)]
pub struct MaskDelivery {
    pub epoch: u64,
    pub shape: ShapeId,
    pub result: Result<AlphaMask, MaskError>,
}

/// File a refined mask for `shape` is read from.
pub fn mask_path(dir: &Path, shape: ShapeId) -> PathBuf {
    dir.join(format!("{}.png", shape.name()))
}

/// Spawns mask workers and collects their deliveries.
#[derive(Debug)]
pub struct MaskLoader {
    dir: PathBuf,
    tx: Sender<MaskDelivery>,
    rx: Receiver<MaskDelivery>,
    last_epoch: Option<u64>,
}

impl MaskLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            dir: dir.into(),
            tx,
            rx,
            last_epoch: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Epoch of the most recent request.
    pub fn last_epoch(&self) -> Option<u64> {
        self.last_epoch
    }

    /// Start loading `shapes` for generation `epoch`.
    ///
    /// Shapes without a file in the mask directory are skipped.
    pub fn request(&mut self, epoch: u64, shapes: &[ShapeId]) {
        let jobs: Vec<(ShapeId, PathBuf)> = shapes
            .iter()
            .filter(|s| !s.is_home())
            .map(|&s| (s, mask_path(&self.dir, s)))
            .filter(|(_, path)| path.is_file())
            .collect();
        self.last_epoch = Some(epoch);
        if jobs.is_empty() {
            debug!(epoch, "no refined masks to load");
            return;
        }

        debug!(epoch, count = jobs.len(), "loading refined masks");
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("orrery-masks".into())
            .spawn(move || {
                for (shape, path) in jobs {
                    let result = AlphaMask::open(&path);
                    // Receiver gone means the engine was dropped.
                    if tx.send(MaskDelivery { epoch, shape, result }).is_err() {
                        break;
                    }
                }
            });
        if let Err(err) = spawned {
            warn!("failed to start mask loader thread: {err}");
        }
    }

    /// Deliveries finished since the last poll.
    pub fn poll(&mut self) -> Vec<MaskDelivery> {
        self.rx.try_iter().collect()
    }

    /// Block until `count` deliveries arrived or the workers are done.
    pub fn wait(&mut self, count: usize) -> Vec<MaskDelivery> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            match self.rx.recv_timeout(std::time::Duration::from_secs(5)) {
                Ok(delivery) => out.push(delivery),
                Err(_) => break,
            }
        }
        out
    }
}
