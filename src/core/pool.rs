use std::hint;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, trace, warn};

use super::params::{ParameterBlock, SharedBlock, RESPONSE_DONE};
use super::signal::{mailbox, Notifier};
use super::target::{Resolution, TargetBuffer};
use super::transfer::TransferEngine;
use super::view::{NavDelta, NavTuning, View};
use super::worker::{Wake, Worker, WorkerState};
use crate::config::{NavigationConfig, PoolConfig, MAX_WORKERS};

/// Busy polls of the completion flags before the host starts yielding
const SPIN_LIMIT: u32 = 2048;

static NEXT_WORKER_ID: AtomicU32 = AtomicU32::new(1);

/// Outcome of one completed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed: Duration,
    pub workers: u32,
}

struct WorkerHandle {
    block: Arc<SharedBlock>,
    wake: Notifier<Wake>,
    thread: Option<JoinHandle<Result<WorkerState>>>,
}

impl WorkerHandle {
    fn has_exited(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }
}

/// Host side of the worker pool.
///
/// Owns one parameter block and one long-lived thread per worker. Frames are
/// dispatched by [`render_frame`](Self::render_frame), which returns only once
/// every worker has signalled completion, so a caller may present the target
/// as soon as it gets a report back.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    resolution: Resolution,
    view: View,
    initial_view: View,
    tuning: NavTuning,
    timeout: Duration,
    frame: u64,
    failed: bool,
}

impl WorkerPool {
    /// Start `count` workers for a `width`×`height` image with default settings
    pub fn start(count: u32, width: u32, height: u32) -> Result<Self> {
        let config = PoolConfig {
            workers: count,
            width,
            height,
            ..PoolConfig::default()
        };
        Self::with_config(&config, &NavigationConfig::default())
    }

    pub fn with_config(config: &PoolConfig, navigation: &NavigationConfig) -> Result<Self> {
        let count = config.workers;
        let resolution = config.resolution();

        if count == 0 {
            bail!("Worker pool needs at least one worker");
        }
        if count > MAX_WORKERS {
            bail!("Worker count {} exceeds the maximum of {}", count, MAX_WORKERS);
        }
        if resolution.is_empty() {
            bail!(
                "Image size {}x{} has no pixels",
                resolution.width,
                resolution.height
            );
        }
        if !(navigation.zoom_floor > 0.0) {
            bail!("Zoom floor must be positive, got {}", navigation.zoom_floor);
        }
        if config.completion_timeout_ms == 0 {
            bail!("Completion timeout must be at least 1 ms");
        }

        let mut pool = Self {
            workers: Vec::with_capacity(count as usize),
            resolution,
            view: navigation.initial_view,
            initial_view: navigation.initial_view,
            tuning: navigation.tuning(),
            timeout: config.completion_timeout(),
            frame: 0,
            failed: false,
        };

        // A failed spawn drops `pool`, which stops the workers started so far
        for rank in 0..count {
            pool.spawn_worker(rank, count)?;
        }

        info!(
            "Started {} workers for {}x{} frames",
            count, resolution.width, resolution.height
        );
        Ok(pool)
    }

    fn spawn_worker(&mut self, rank: u32, count: u32) -> Result<()> {
        let block = Arc::new(SharedBlock::new(rank, count, self.resolution, self.view));
        block.set_id(NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed));

        let (wake, waiter) = mailbox();
        let engine = TransferEngine::spawn(format!("mandel-dma-{}", rank))?;
        let worker = Worker::new(Arc::clone(&block), waiter, engine);

        let thread = thread::Builder::new()
            .name(format!("mandel-worker-{}", rank))
            .spawn(move || worker.run())
            .with_context(|| format!("Failed to spawn worker {}", rank))?;

        debug!("Spawned worker {} (id {})", rank, block.id());
        self.workers.push(WorkerHandle {
            block,
            wake,
            thread: Some(thread),
        });
        Ok(())
    }

    pub fn workers(&self) -> u32 {
        self.workers.len() as u32
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of frames dispatched so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn tuning(&self) -> NavTuning {
        self.tuning
    }

    /// Snapshot of worker `rank`'s parameter block
    pub fn parameters(&self, rank: u32) -> Option<ParameterBlock> {
        self.workers.get(rank as usize).map(|w| w.block.fetch())
    }

    /// Last state reported by worker `rank`
    pub fn worker_state(&self, rank: u32) -> Option<WorkerState> {
        self.workers.get(rank as usize).map(|w| w.block.state())
    }

    /// Pan and zoom every worker's view; returns the new view
    pub fn update_view(&mut self, delta: NavDelta) -> View {
        let view = self.view.navigate(delta, &self.tuning);
        self.set_view(view);
        view
    }

    /// Go back to the view the pool started with
    pub fn reset_view(&mut self) {
        self.set_view(self.initial_view);
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
        for worker in &self.workers {
            worker.block.publish_view(view);
        }
    }

    /// Render one frame into `target`, blocking until every worker finished.
    pub fn render_frame(&mut self, target: &Arc<TargetBuffer>) -> Result<FrameReport> {
        if self.failed {
            bail!("Worker pool is unusable after a failed frame");
        }
        if target.resolution() != self.resolution {
            bail!(
                "Target is {}x{}, pool renders {}x{}",
                target.resolution().width,
                target.resolution().height,
                self.resolution.width,
                self.resolution.height
            );
        }

        self.frame += 1;
        let frame = self.frame;
        let start = Instant::now();

        for worker in &self.workers {
            worker.block.arm();
            worker.wake.send(Wake::Render {
                target: Arc::clone(target),
                frame,
            });
        }
        trace!("Dispatched frame {} to buffer {}", frame, target.id());

        if let Err(e) = self.await_completion(frame, start) {
            self.failed = true;
            return Err(e);
        }

        Ok(FrameReport {
            frame,
            elapsed: start.elapsed(),
            workers: self.workers(),
        })
    }

    /// Poll every completion flag until all are set, the timeout expires or
    /// a worker misbehaves.
    fn await_completion(&self, frame: u64, start: Instant) -> Result<()> {
        let mut done = vec![false; self.workers.len()];
        let mut remaining = self.workers.len();
        let mut spins = 0;

        while remaining > 0 {
            for (rank, worker) in self.workers.iter().enumerate() {
                if done[rank] {
                    continue;
                }
                match worker.block.poll() {
                    Some(RESPONSE_DONE) => {
                        done[rank] = true;
                        remaining -= 1;
                    }
                    Some(response) => bail!(
                        "Worker {} completed frame {} with unexpected response {}",
                        rank,
                        frame,
                        response
                    ),
                    None if worker.has_exited() => bail!(
                        "Worker {} exited during frame {} (last state {:?})",
                        rank,
                        frame,
                        worker.block.state()
                    ),
                    None => {}
                }
            }
            if remaining == 0 {
                break;
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                let rank = done.iter().position(|d| !d).unwrap_or(0);
                bail!(
                    "Worker {} did not complete frame {} within {:?} (last state {:?}, {} of {} pending)",
                    rank,
                    frame,
                    elapsed,
                    self.workers[rank].block.state(),
                    remaining,
                    self.workers.len()
                );
            }

            if spins < SPIN_LIMIT {
                spins += 1;
                hint::spin_loop();
            } else {
                thread::yield_now();
            }
        }
        Ok(())
    }

    /// Send the exit sentinel to every worker and join them.
    ///
    /// Returns each worker's final state in rank order.
    pub fn shutdown(mut self) -> Result<Vec<WorkerState>> {
        self.stop_workers()
    }

    fn stop_workers(&mut self) -> Result<Vec<WorkerState>> {
        let mut workers = std::mem::take(&mut self.workers);
        for worker in &workers {
            worker.wake.send(Wake::Exit);
        }

        // Workers still finishing a frame see the sentinel afterwards
        let deadline = Instant::now() + self.timeout;
        let mut states = Vec::with_capacity(workers.len());
        let mut first_error = None;

        for (rank, worker) in workers.iter_mut().enumerate() {
            while !worker.has_exited() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }
            let result = match worker.thread.take() {
                Some(thread) if thread.is_finished() => thread
                    .join()
                    .map_err(|_| anyhow!("Worker {} panicked", rank))
                    .and_then(|r| r.with_context(|| format!("Worker {} failed", rank))),
                Some(_) => Err(anyhow!(
                    "Worker {} did not stop (last state {:?}), detaching it",
                    rank,
                    worker.block.state()
                )),
                None => Ok(worker.block.state()),
            };
            match result {
                Ok(state) => states.push(state),
                Err(e) => {
                    warn!("{:#}", e);
                    states.push(worker.block.state());
                    first_error.get_or_insert(e);
                }
            }
        }

        info!(
            "Worker pool shut down after {} frames ({} workers joined)",
            self.frame,
            states
                .iter()
                .filter(|s| **s == WorkerState::Terminated)
                .count()
        );
        match first_error {
            Some(e) => Err(e),
            None => Ok(states),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            if let Err(e) = self.stop_workers() {
                warn!("Worker pool shutdown: {:#}", e);
            }
        }
    }
}
