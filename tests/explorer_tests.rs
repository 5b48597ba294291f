use mandelbrot_pool::config::{AppConfig, PoolConfig};
use mandelbrot_pool::core::{InputFrame, NullPresenter, ScriptedInput, View, WorkerState};
use mandelbrot_pool::{Explorer, StepOutcome};

fn config(dir: &std::path::Path) -> AppConfig {
    AppConfig {
        pool: PoolConfig {
            workers: 3,
            width: 48,
            height: 32,
            ..PoolConfig::default()
        },
        export_dir: dir.to_path_buf(),
        ..AppConfig::default()
    }
}

fn button(quit: bool, export: bool, reset: bool) -> InputFrame {
    InputFrame {
        quit,
        export,
        reset,
        ..InputFrame::NEUTRAL
    }
}

#[cfg(test)]
mod loop_tests {
    use super::*;

    #[test]
    fn each_step_presents_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut explorer =
            Explorer::new(&config(dir.path()), NullPresenter::new(), ScriptedInput::default()).unwrap();

        assert_eq!(explorer.step().unwrap(), StepOutcome::Continue);
        assert_eq!(explorer.step().unwrap(), StepOutcome::Continue);

        assert_eq!(explorer.frames(), 2);
        assert_eq!(explorer.presenter().presented(), 2);
        assert_eq!(explorer.presenter().swaps(), 2);
        assert_eq!(explorer.last_report().unwrap().frame, 2);
    }

    #[test]
    fn buffers_alternate() {
        let dir = tempfile::tempdir().unwrap();
        let mut explorer =
            Explorer::new(&config(dir.path()), NullPresenter::new(), ScriptedInput::default()).unwrap();
        assert!(explorer.front().is_none());

        let first_back = explorer.back().id();
        explorer.step().unwrap();
        assert_eq!(explorer.presenter().last_buffer(), Some(first_back.get()));
        assert_eq!(explorer.front().unwrap().id(), first_back);
        assert_ne!(explorer.back().id(), first_back);

        explorer.step().unwrap();
        assert_ne!(explorer.presenter().last_buffer(), Some(first_back.get()));
        assert_eq!(explorer.back().id(), first_back);
    }

    #[test]
    fn quit_stops_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let input = ScriptedInput::new([InputFrame::NEUTRAL, button(true, false, false)]);
        let mut explorer = Explorer::new(&config(dir.path()), NullPresenter::new(), input).unwrap();

        let frames = explorer.run(Some(10)).unwrap();
        assert_eq!(frames, 1);
        assert_eq!(explorer.presenter().presented(), 1);
    }

    #[test]
    fn run_honours_frame_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut explorer =
            Explorer::new(&config(dir.path()), NullPresenter::new(), ScriptedInput::default()).unwrap();
        assert_eq!(explorer.run(Some(5)).unwrap(), 5);
        assert_eq!(explorer.pool().frame_count(), 5);
    }

    #[test]
    fn shutdown_after_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut explorer =
            Explorer::new(&config(dir.path()), NullPresenter::new(), ScriptedInput::default()).unwrap();
        explorer.run(Some(2)).unwrap();
        assert_eq!(explorer.shutdown().unwrap(), vec![WorkerState::Terminated; 3]);
    }
}

#[cfg(test)]
mod navigation_tests {
    use super::*;

    #[test]
    fn dead_zone_keeps_view_still() {
        let dir = tempfile::tempdir().unwrap();
        let input = ScriptedInput::new([InputFrame::axes(0x80 + 7, 0x80 - 8, 0x80 + 3)]);
        let mut explorer = Explorer::new(&config(dir.path()), NullPresenter::new(), input).unwrap();
        explorer.step().unwrap();
        assert_eq!(explorer.pool().view(), View::default());
    }

    #[test]
    fn stick_moves_the_view() {
        let dir = tempfile::tempdir().unwrap();
        let input = ScriptedInput::new([InputFrame::axes(0xFF, 0x80, 0x00)]);
        let mut explorer = Explorer::new(&config(dir.path()), NullPresenter::new(), input).unwrap();
        explorer.step().unwrap();

        let view = explorer.pool().view();
        assert!((view.center_x - (-0.5 + 127.0 * 0.001)).abs() < 1e-6);
        assert!((view.zoom - (1.0 - 128.0 * 0.0005)).abs() < 1e-6);
    }

    #[test]
    fn reset_restores_initial_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = ScriptedInput::default();
        input
            .repeat(InputFrame::axes(0x00, 0xFF, 0x00), 5)
            .push(button(false, false, true));
        let mut explorer = Explorer::new(&config(dir.path()), NullPresenter::new(), input).unwrap();

        for _ in 0..5 {
            explorer.step().unwrap();
        }
        assert_ne!(explorer.pool().view(), View::default());
        explorer.step().unwrap();
        assert_eq!(explorer.pool().view(), View::default());
    }
}

#[cfg(test)]
mod export_button_tests {
    use super::*;

    #[test]
    fn export_before_first_frame_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = ScriptedInput::new([button(false, true, false)]);
        let mut explorer = Explorer::new(&config(dir.path()), NullPresenter::new(), input).unwrap();
        explorer.step().unwrap();
        assert_eq!(explorer.exporter().count(), 0);
        assert!(!dir.path().join("mandel0001.bmp").exists());
    }

    #[test]
    fn export_saves_the_displayed_frame() {
        let dir = tempfile::tempdir().unwrap();
        let input = ScriptedInput::new([
            InputFrame::NEUTRAL,
            button(false, true, false),
            button(false, true, false),
        ]);
        let mut explorer = Explorer::new(&config(dir.path()), NullPresenter::new(), input).unwrap();
        explorer.run(Some(3)).unwrap();

        assert_eq!(explorer.exporter().count(), 2);
        assert!(dir.path().join("mandel0001.bmp").exists());
        assert!(dir.path().join("mandel0002.bmp").exists());
    }

    #[test]
    fn failed_export_does_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.export_dir = dir.path().join("missing").join("nested");
        let input = ScriptedInput::new([InputFrame::NEUTRAL, button(false, true, false)]);
        let mut explorer = Explorer::new(&config, NullPresenter::new(), input).unwrap();

        assert_eq!(explorer.run(Some(2)).unwrap(), 2);
        assert_eq!(explorer.exporter().count(), 0);
    }
}
