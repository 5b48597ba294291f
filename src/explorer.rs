// explorer.rs - Host loop: input, navigation, dispatch, presentation
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};

use crate::config::AppConfig;
use crate::core::clock::FpsMeter;
use crate::core::controller::InputSource;
use crate::core::pool::{FrameReport, WorkerPool};
use crate::core::present::Presenter;
use crate::core::target::TargetBuffer;
use crate::core::worker::WorkerState;
use crate::export::Exporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Quit,
}

/// Interactive fractal viewer.
///
/// Renders into two target buffers in turn: while one is on screen the
/// workers write the other. Snapshots are always taken from the buffer on
/// screen, never from the one being written.
pub struct Explorer<P: Presenter, I: InputSource> {
    pool: WorkerPool,
    buffers: [Arc<TargetBuffer>; 2],
    back: usize,
    presenter: P,
    input: I,
    dead_zone: u8,
    exporter: Exporter,
    fps: FpsMeter,
    frames: u64,
    last_report: Option<FrameReport>,
}

impl<P: Presenter, I: InputSource> Explorer<P, I> {
    pub fn new(config: &AppConfig, presenter: P, input: I) -> Result<Self> {
        let pool = WorkerPool::with_config(&config.pool, &config.navigation)?;
        let resolution = pool.resolution();
        Ok(Self {
            pool,
            buffers: [
                Arc::new(TargetBuffer::new(resolution)),
                Arc::new(TargetBuffer::new(resolution)),
            ],
            back: 0,
            presenter,
            input,
            dead_zone: config.navigation.dead_zone,
            exporter: Exporter::new(config.export_dir.clone()),
            fps: FpsMeter::default(),
            frames: 0,
            last_report: None,
        })
    }

    /// One host iteration
    pub fn step(&mut self) -> Result<StepOutcome> {
        let input = self.input.poll();
        if input.quit {
            info!("Quit requested after {} frames", self.frames);
            return Ok(StepOutcome::Quit);
        }

        if input.reset {
            self.pool.reset_view();
        } else {
            let delta = input.delta(self.dead_zone);
            if !delta.is_idle() {
                self.pool.update_view(delta);
            }
        }

        if input.export {
            if let Err(e) = self.export_front() {
                error!("Export failed: {:#}", e);
            }
        }

        self.presenter.wait_for_swap()?;
        let target = Arc::clone(&self.buffers[self.back]);
        let report = self.pool.render_frame(&target)?;
        self.presenter.present(&target)?;

        self.back = 1 - self.back;
        self.frames += 1;
        self.last_report = Some(report);
        self.fps.frame();
        Ok(StepOutcome::Continue)
    }

    /// Step until quit is requested or `limit` frames have been shown
    pub fn run(&mut self, limit: Option<u64>) -> Result<u64> {
        while limit.map_or(true, |n| self.frames < n) {
            if self.step()? == StepOutcome::Quit {
                break;
            }
        }
        Ok(self.frames)
    }

    /// Save the buffer currently on screen; `None` before the first frame
    pub fn export_front(&mut self) -> Result<Option<PathBuf>> {
        let front = match self.front() {
            Some(front) => Arc::clone(front),
            None => {
                warn!("Nothing on screen to export yet");
                return Ok(None);
            }
        };
        self.exporter.save(&front).map(Some)
    }

    /// Buffer holding the last presented frame
    pub fn front(&self) -> Option<&Arc<TargetBuffer>> {
        (self.frames > 0).then(|| &self.buffers[1 - self.back])
    }

    /// Buffer the next frame will be rendered into
    pub fn back(&self) -> &Arc<TargetBuffer> {
        &self.buffers[self.back]
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_report(&self) -> Option<FrameReport> {
        self.last_report
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut WorkerPool {
        &mut self.pool
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Stop the workers and return their final states
    pub fn shutdown(self) -> Result<Vec<WorkerState>> {
        self.pool.shutdown()
    }
}
