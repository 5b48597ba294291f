use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Marker held by every pixel a worker has not written yet.
///
/// Packed colours never use the top byte, so this cannot collide with output.
pub const UNWRITTEN: u32 = 0xFFFF_FFFF;

static NEXT_BUFFER_ID: AtomicU32 = AtomicU32::new(1);

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size in bytes of one packed row
    pub fn row_bytes(&self) -> usize {
        self.width as usize * 4
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Destination image for one frame.
///
/// Row-major, one packed `0x00RRGGBB` word per pixel. Workers write disjoint
/// rows through their transfer engines, so pixels are plain relaxed atomics;
/// visibility to the host comes from the completion flag of each worker.
/// Every row also carries the number of the frame that last wrote it.
#[derive(Debug)]
pub struct TargetBuffer {
    id: NonZeroU32,
    resolution: Resolution,
    pixels: Box<[AtomicU32]>,
    stamps: Box<[AtomicU64]>,
}

impl TargetBuffer {
    pub fn new(resolution: Resolution) -> Self {
        let raw = NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id: NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN),
            resolution,
            pixels: (0..resolution.pixel_count())
                .map(|_| AtomicU32::new(UNWRITTEN))
                .collect(),
            stamps: (0..resolution.height).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Handle carried in wake notifications. Never zero.
    pub fn id(&self) -> NonZeroU32 {
        self.id
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Store one finished scanline and stamp it with `frame`.
    ///
    /// Returns the stamp the row carried before, so a caller can detect a row
    /// delivered twice in the same frame.
    pub fn write_row(&self, row: u32, frame: u64, line: &[u32]) -> u64 {
        let width = self.resolution.width as usize;
        assert!(row < self.resolution.height, "row {} out of range", row);
        assert!(line.len() >= width, "scanline shorter than image width");

        let start = row as usize * width;
        for (slot, &value) in self.pixels[start..start + width].iter().zip(line) {
            slot.store(value, Ordering::Relaxed);
        }
        self.stamps[row as usize].swap(frame, Ordering::Relaxed)
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let idx = y as usize * self.resolution.width as usize + x as usize;
        self.pixels[idx].load(Ordering::Relaxed)
    }

    /// Frame number that last wrote `row`, 0 if never written
    pub fn row_stamp(&self, row: u32) -> u64 {
        self.stamps[row as usize].load(Ordering::Relaxed)
    }

    /// Rows not stamped with `frame`
    pub fn missing_rows(&self, frame: u64) -> Vec<u32> {
        (0..self.resolution.height)
            .filter(|&row| self.row_stamp(row) != frame)
            .collect()
    }

    /// Copy the whole image into `out`, replacing its contents
    pub fn copy_into(&self, out: &mut Vec<u32>) {
        out.clear();
        out.extend(self.pixels.iter().map(|p| p.load(Ordering::Relaxed)));
    }

    pub fn to_vec(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.pixels.len());
        self.copy_into(&mut out);
        out
    }
}
