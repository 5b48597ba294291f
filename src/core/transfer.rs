use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{trace, warn};

use super::target::TargetBuffer;

/// Number of transfer tags, one per staging slot
pub const TAGS: usize = 2;

/// One scanline on its way into a target buffer
struct Put {
    tag: usize,
    line: Vec<u32>,
    target: Arc<TargetBuffer>,
    row: u32,
    frame: u64,
}

/// Asynchronous scanline copier owned by a single worker.
///
/// `put` hands a staging line to the engine thread and returns immediately;
/// `wait` blocks until the transfer on that tag has landed and gives the line
/// back. A tag can hold one transfer at a time, and the line is owned by the
/// engine while in flight, so a slot cannot be refilled before its previous
/// transfer completed.
pub struct TransferEngine {
    commands: Option<Sender<Put>>,
    completions: [Receiver<Vec<u32>>; TAGS],
    in_flight: [bool; TAGS],
    handle: Option<JoinHandle<()>>,
}

impl TransferEngine {
    /// Start the engine thread
    pub fn spawn(name: String) -> Result<Self> {
        let (commands, queue) = unbounded::<Put>();
        let (done0, wait0) = bounded(1);
        let (done1, wait1) = bounded(1);
        let done = [done0, done1];

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Self::run(queue, done))
            .with_context(|| format!("failed to spawn transfer thread {}", name))?;

        Ok(Self {
            commands: Some(commands),
            completions: [wait0, wait1],
            in_flight: [false; TAGS],
            handle: Some(handle),
        })
    }

    fn run(queue: Receiver<Put>, done: [Sender<Vec<u32>>; TAGS]) {
        for put in queue.iter() {
            let previous = put.target.write_row(put.row, put.frame, &put.line);
            if previous == put.frame {
                warn!("row {} written twice in frame {}", put.row, put.frame);
            }
            trace!("row {} landed (tag {})", put.row, put.tag);
            if done[put.tag].send(put.line).is_err() {
                break;
            }
        }
    }

    /// Start copying `line` into `row` of `target`.
    pub fn put(
        &mut self,
        tag: usize,
        line: Vec<u32>,
        target: &Arc<TargetBuffer>,
        row: u32,
        frame: u64,
    ) -> Result<()> {
        if self.in_flight[tag] {
            bail!("transfer tag {} reused before completion", tag);
        }
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| anyhow!("transfer engine already stopped"))?;
        commands
            .send(Put {
                tag,
                line,
                target: Arc::clone(target),
                row,
                frame,
            })
            .map_err(|_| anyhow!("transfer thread exited"))?;
        self.in_flight[tag] = true;
        Ok(())
    }

    /// Block until the transfer on `tag` completed and return its line
    pub fn wait(&mut self, tag: usize) -> Result<Vec<u32>> {
        if !self.in_flight[tag] {
            bail!("no transfer in flight on tag {}", tag);
        }
        let line = self.completions[tag]
            .recv()
            .map_err(|_| anyhow!("transfer thread exited with tag {} in flight", tag))?;
        self.in_flight[tag] = false;
        Ok(line)
    }

    #[cfg(test)]
    fn is_in_flight(&self, tag: usize) -> bool {
        self.in_flight[tag]
    }

    /// Wait for every outstanding transfer; returns the lines by tag
    pub fn drain(&mut self) -> Result<[Option<Vec<u32>>; TAGS]> {
        let mut lines = [None, None];
        for (tag, line) in lines.iter_mut().enumerate() {
            if self.in_flight[tag] {
                *line = Some(self.wait(tag)?);
            }
        }
        Ok(lines)
    }

    /// Drain, close the queue and join the engine thread
    pub fn stop(&mut self) -> Result<()> {
        let drained = self.drain();
        self.commands = None;
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("transfer thread panicked"))?;
        }
        drained.map(|_| ())
    }
}

impl Drop for TransferEngine {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.stop() {
                warn!("transfer engine shutdown: {:#}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::{Resolution, UNWRITTEN};

    fn engine() -> TransferEngine {
        TransferEngine::spawn("test-transfer".to_string()).unwrap()
    }

    #[test]
    fn put_then_wait_returns_line() {
        let target = Arc::new(TargetBuffer::new(Resolution::new(4, 2)));
        let mut engine = engine();

        engine.put(0, vec![1, 2, 3, 4], &target, 1, 1).unwrap();
        assert!(engine.is_in_flight(0));

        let line = engine.wait(0).unwrap();
        assert_eq!(line, vec![1, 2, 3, 4]);
        assert!(!engine.is_in_flight(0));
        assert_eq!(target.pixel(2, 1), 3);
        assert_eq!(target.pixel(2, 0), UNWRITTEN);
        assert_eq!(target.row_stamp(1), 1);
    }

    #[test]
    fn both_tags_in_flight_together() {
        let target = Arc::new(TargetBuffer::new(Resolution::new(2, 2)));
        let mut engine = engine();

        engine.put(0, vec![5, 5], &target, 0, 3).unwrap();
        engine.put(1, vec![6, 6], &target, 1, 3).unwrap();

        let lines = engine.drain().unwrap();
        assert_eq!(lines[0].as_deref(), Some(&[5, 5][..]));
        assert_eq!(lines[1].as_deref(), Some(&[6, 6][..]));
        assert!(target.missing_rows(3).is_empty());
    }

    #[test]
    fn reusing_busy_tag_is_rejected() {
        let target = Arc::new(TargetBuffer::new(Resolution::new(1, 2)));
        let mut engine = engine();

        engine.put(0, vec![1], &target, 0, 1).unwrap();
        assert!(engine.put(0, vec![2], &target, 1, 1).is_err());
        engine.wait(0).unwrap();
    }

    #[test]
    fn wait_without_put_is_rejected() {
        let mut engine = engine();
        assert!(engine.wait(1).is_err());
    }

    #[test]
    fn stop_drains_outstanding_transfers() {
        let target = Arc::new(TargetBuffer::new(Resolution::new(3, 1)));
        let mut engine = engine();
        engine.put(1, vec![7, 8, 9], &target, 0, 2).unwrap();
        engine.stop().unwrap();
        assert_eq!(target.to_vec(), vec![7, 8, 9]);
        assert!(engine.put(0, vec![0, 0, 0], &target, 0, 3).is_err());
    }
}
