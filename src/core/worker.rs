use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, trace};

use super::params::{ParameterBlock, SharedBlock, RESPONSE_DONE};
use super::partition;
use super::signal::Waiter;
use super::target::TargetBuffer;
use super::transfer::{TransferEngine, TAGS};
use crate::math::escape::{render_row, Viewport};

/// Worker lifecycle, published in the shared block for diagnostics
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Blocked on the wake channel
    Idle = 0,
    /// Snapshotting the parameter block
    Fetching = 1,
    /// Running the kernel over its rows
    Computing = 2,
    /// Draining transfers and publishing completion
    Signaling = 3,
    /// Received the exit sentinel
    Terminated = 4,
}

impl WorkerState {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Fetching,
            2 => WorkerState::Computing,
            3 => WorkerState::Signaling,
            _ => WorkerState::Terminated,
        }
    }
}

/// Wake notification sent by the host
#[derive(Debug, Clone)]
pub enum Wake {
    /// Render `frame` into `target`
    Render {
        target: Arc<TargetBuffer>,
        frame: u64,
    },
    /// Exit sentinel
    Exit,
}

impl Wake {
    /// Single-word form of the notification. 0 is reserved for [`Wake::Exit`].
    pub fn word(&self) -> u32 {
        match self {
            Wake::Render { target, .. } => target.id().get(),
            Wake::Exit => 0,
        }
    }
}

/// One compute unit: owns its staging slots and transfer engine, shares
/// only its parameter block with the host.
pub(crate) struct Worker {
    block: Arc<SharedBlock>,
    wake: Waiter<Wake>,
    engine: TransferEngine,
    slots: [Option<Vec<u32>>; TAGS],
}

impl Worker {
    pub(crate) fn new(block: Arc<SharedBlock>, wake: Waiter<Wake>, engine: TransferEngine) -> Self {
        let width = block.resolution().width as usize;
        Self {
            block,
            wake,
            engine,
            slots: [Some(vec![0; width]), Some(vec![0; width])],
        }
    }

    /// Serve frames until the exit sentinel arrives
    pub(crate) fn run(mut self) -> Result<WorkerState> {
        let rank = self.block.rank();
        debug!("worker {} ready", rank);

        loop {
            self.block.set_state(WorkerState::Idle);
            let (target, frame) = match self.wake.recv() {
                Some(Wake::Render { target, frame }) => (target, frame),
                Some(Wake::Exit) | None => break,
            };

            self.block.set_state(WorkerState::Fetching);
            let params = self.block.fetch();

            self.block.set_state(WorkerState::Computing);
            let rows = self
                .draw_frame(&params, &target, frame)
                .with_context(|| format!("worker {} failed in frame {}", rank, frame))?;

            self.block.set_state(WorkerState::Signaling);
            self.block.signal(RESPONSE_DONE);
            trace!("worker {} finished frame {} ({} rows)", rank, frame, rows);
        }

        self.engine.stop()?;
        self.block.set_state(WorkerState::Terminated);
        debug!("worker {} terminated", rank);
        Ok(WorkerState::Terminated)
    }

    /// Compute every owned row, double-buffering the output.
    ///
    /// Row n's transfer is issued before row n+1 is computed; a slot is only
    /// refilled after the transfer issued from it two rows ago has landed.
    fn draw_frame(
        &mut self,
        params: &ParameterBlock,
        target: &Arc<TargetBuffer>,
        frame: u64,
    ) -> Result<u32> {
        let viewport = Viewport::new(params.view(), params.resolution());
        let mut tag = 0;
        let mut rows = 0;

        for row in partition::rows(params.rank, params.count, params.height) {
            let mut line = match self.slots[tag].take() {
                Some(line) => line,
                None => self.engine.wait(tag)?,
            };
            render_row(&viewport, row, &mut line);
            self.engine.put(tag, line, target, row, frame)?;
            tag = 1 - tag;
            rows += 1;
        }

        for (slot, line) in self.slots.iter_mut().zip(self.engine.drain()?) {
            if let Some(line) = line {
                *slot = Some(line);
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::mailbox;
    use crate::core::target::{Resolution, UNWRITTEN};
    use crate::core::view::View;
    use std::thread;

    fn spawn_worker(
        rank: u32,
        count: u32,
        res: Resolution,
    ) -> (
        Arc<SharedBlock>,
        crate::core::signal::Notifier<Wake>,
        thread::JoinHandle<Result<WorkerState>>,
    ) {
        let block = Arc::new(SharedBlock::new(rank, count, res, View::default()));
        let (notifier, waiter) = mailbox();
        let engine = TransferEngine::spawn(format!("test-dma-{}", rank)).unwrap();
        let worker = Worker::new(Arc::clone(&block), waiter, engine);
        let handle = thread::spawn(move || worker.run());
        (block, notifier, handle)
    }

    #[test]
    fn state_from_u8() {
        for state in [
            WorkerState::Idle,
            WorkerState::Fetching,
            WorkerState::Computing,
            WorkerState::Signaling,
            WorkerState::Terminated,
        ] {
            assert_eq!(WorkerState::from_u8(state as u8), state);
        }
        assert_eq!(WorkerState::from_u8(200), WorkerState::Terminated);
    }

    #[test]
    fn exit_word_is_zero() {
        let target = Arc::new(TargetBuffer::new(Resolution::new(1, 1)));
        assert_eq!(Wake::Exit.word(), 0);
        assert_ne!(Wake::Render { target, frame: 1 }.word(), 0);
    }

    #[test]
    fn single_worker_renders_its_rows_and_signals() {
        let res = Resolution::new(10, 5);
        let (block, notifier, handle) = spawn_worker(1, 2, res);
        let target = Arc::new(TargetBuffer::new(res));

        block.arm();
        notifier.send(Wake::Render {
            target: Arc::clone(&target),
            frame: 1,
        });
        while block.poll().is_none() {
            thread::yield_now();
        }
        assert_eq!(block.poll(), Some(RESPONSE_DONE));

        // Rank 1 of 2 owns the odd rows only
        assert_eq!(target.missing_rows(1), vec![0, 2, 4]);
        assert_ne!(target.pixel(0, 1), UNWRITTEN);
        assert_eq!(target.pixel(0, 2), UNWRITTEN);

        notifier.send(Wake::Exit);
        assert_eq!(handle.join().unwrap().unwrap(), WorkerState::Terminated);
        assert_eq!(block.state(), WorkerState::Terminated);
    }

    #[test]
    fn dropped_notifier_terminates_worker() {
        let (_block, notifier, handle) = spawn_worker(0, 1, Resolution::new(4, 4));
        drop(notifier);
        assert_eq!(handle.join().unwrap().unwrap(), WorkerState::Terminated);
    }
}
