use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use super::target::Resolution;
use super::view::View;
use super::worker::WorkerState;

/// `response` value of a worker that finished its rows
pub const RESPONSE_DONE: u32 = 1;
/// Cleared `sync` / `response` value
pub const RESPONSE_NONE: u32 = 0;

/// Per-worker parameter record, in the layout a worker fetches every frame.
///
/// 16-byte aligned and padded to a 16-byte multiple so a whole block moves
/// in a single transfer.
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParameterBlock {
    pub id: u32,
    pub rank: u32,
    pub count: u32,
    pub sync: u32,
    pub response: u32,
    pub width: u32,
    pub height: u32,
    pub zoom: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub _pad: [u32; 2],
}

const _: () = assert!(std::mem::size_of::<ParameterBlock>() == 48);

impl ParameterBlock {
    pub fn view(&self) -> View {
        View::new(self.zoom, self.center_x, self.center_y)
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Live copy of a [`ParameterBlock`] shared between the host and one worker.
///
/// Ownership is split by field: the view transform is written only by the
/// host between frames, `sync`/`response`/`state` only by the worker. The
/// host's view writes are published by the wake notification that follows
/// them. The worker publishes `response` before `sync` with release ordering,
/// so a host that acquires `sync != 0` also sees the matching `response`.
#[repr(C, align(16))]
#[derive(Debug)]
pub struct SharedBlock {
    id: AtomicU32,
    rank: u32,
    count: u32,
    resolution: Resolution,
    zoom: AtomicU32,
    center_x: AtomicU32,
    center_y: AtomicU32,
    sync: AtomicU32,
    response: AtomicU32,
    state: AtomicU8,
}

impl SharedBlock {
    pub fn new(rank: u32, count: u32, resolution: Resolution, view: View) -> Self {
        let block = Self {
            id: AtomicU32::new(0),
            rank,
            count,
            resolution,
            zoom: AtomicU32::new(0),
            center_x: AtomicU32::new(0),
            center_y: AtomicU32::new(0),
            sync: AtomicU32::new(RESPONSE_NONE),
            response: AtomicU32::new(RESPONSE_NONE),
            state: AtomicU8::new(WorkerState::Idle as u8),
        };
        block.publish_view(view);
        block
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn set_id(&self, id: u32) {
        self.id.store(id, Ordering::Relaxed);
    }

    pub fn id(&self) -> u32 {
        self.id.load(Ordering::Relaxed)
    }

    /// Host: replace the view transform. Only valid while the worker is idle.
    pub fn publish_view(&self, view: View) {
        self.zoom.store(view.zoom.to_bits(), Ordering::Relaxed);
        self.center_x.store(view.center_x.to_bits(), Ordering::Relaxed);
        self.center_y.store(view.center_y.to_bits(), Ordering::Relaxed);
    }

    pub fn view(&self) -> View {
        View::new(
            f32::from_bits(self.zoom.load(Ordering::Relaxed)),
            f32::from_bits(self.center_x.load(Ordering::Relaxed)),
            f32::from_bits(self.center_y.load(Ordering::Relaxed)),
        )
    }

    /// Worker: snapshot the whole block
    pub fn fetch(&self) -> ParameterBlock {
        let view = self.view();
        ParameterBlock {
            id: self.id(),
            rank: self.rank,
            count: self.count,
            sync: self.sync.load(Ordering::Relaxed),
            response: self.response.load(Ordering::Relaxed),
            width: self.resolution.width,
            height: self.resolution.height,
            zoom: view.zoom,
            center_x: view.center_x,
            center_y: view.center_y,
            _pad: [0; 2],
        }
    }

    /// Host: clear the completion fields before waking the worker
    pub fn arm(&self) {
        self.response.store(RESPONSE_NONE, Ordering::Relaxed);
        self.sync.store(RESPONSE_NONE, Ordering::Relaxed);
    }

    /// Worker: publish `response`, then `sync = 1` behind a release fence
    pub fn signal(&self, response: u32) {
        self.response.store(response, Ordering::Relaxed);
        self.sync.store(1, Ordering::Release);
    }

    /// Host: `Some(response)` once the worker has signalled
    pub fn poll(&self) -> Option<u32> {
        if self.sync.load(Ordering::Acquire) != 0 {
            Some(self.response.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    pub fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    /// Last state the worker reported; advisory only
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Relaxed))
    }
}
