//! Strided row partition.
//!
//! Worker `rank` of `count` owns rows `rank, rank + count, rank + 2 * count, …`
//! below `height`. Every row has exactly one owner for any `count >= 1`, and
//! neighbouring rows land on different workers, which spreads the expensive
//! interior of the set evenly.

use std::iter::StepBy;
use std::ops::Range;

/// Rows owned by worker `rank`. A zero `count` is treated as one worker.
pub fn rows(rank: u32, count: u32, height: u32) -> StepBy<Range<u32>> {
    (rank.min(height)..height).step_by(count.max(1) as usize)
}
