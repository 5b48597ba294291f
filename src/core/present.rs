use anyhow::Result;

use super::target::TargetBuffer;

/// Display side of the host loop.
///
/// The host calls [`wait_for_swap`](Presenter::wait_for_swap) before it
/// starts writing the back buffer and [`present`](Presenter::present) only
/// after every worker signalled completion for that buffer.
pub trait Presenter {
    /// Block until the previously presented frame is no longer being read
    fn wait_for_swap(&mut self) -> Result<()>;

    /// Show a fully rendered buffer
    fn present(&mut self, frame: &TargetBuffer) -> Result<()>;
}

/// Presenter without a display; records what it was given
#[derive(Debug, Default)]
pub struct NullPresenter {
    presented: u64,
    swaps: u64,
    last_buffer: Option<u32>,
}

impl NullPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    /// Id of the last buffer presented
    pub fn last_buffer(&self) -> Option<u32> {
        self.last_buffer
    }
}

impl Presenter for NullPresenter {
    fn wait_for_swap(&mut self) -> Result<()> {
        self.swaps += 1;
        Ok(())
    }

    fn present(&mut self, frame: &TargetBuffer) -> Result<()> {
        self.presented += 1;
        self.last_buffer = Some(frame.id().get());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::Resolution;

    #[test]
    fn null_presenter_counts() {
        let mut presenter = NullPresenter::new();
        let buffer = TargetBuffer::new(Resolution::new(2, 2));
        presenter.wait_for_swap().unwrap();
        presenter.present(&buffer).unwrap();
        assert_eq!(presenter.presented(), 1);
        assert_eq!(presenter.swaps(), 1);
        assert_eq!(presenter.last_buffer(), Some(buffer.id().get()));
    }
}
