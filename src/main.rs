use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use mandelbrot_pool::cli::Cli;
use mandelbrot_pool::core::{KeyboardInput, NullPresenter, ScriptedInput, WgpuPresenter};
use mandelbrot_pool::{AppConfig, Explorer, StepOutcome};

type WindowedExplorer = Explorer<WgpuPresenter, KeyboardInput>;

// === Application ===

struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    explorer: Option<WindowedExplorer>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            explorer: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{:#}", e);
        self.error = Some(e);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let resolution = self.config.pool.resolution();
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title("Mandelbrot")
                    .with_inner_size(winit::dpi::PhysicalSize::new(
                        resolution.width,
                        resolution.height,
                    )),
            )?,
        );

        let presenter = WgpuPresenter::new(window.clone(), resolution)?;
        let explorer = Explorer::new(&self.config, presenter, KeyboardInput::new())?;

        self.window = Some(window);
        self.explorer = Some(explorer);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(explorer) = self.explorer.take() {
            let frames = explorer.frames();
            match explorer.shutdown() {
                Ok(states) => info!("Stopped {} workers after {} frames", states.len(), frames),
                Err(e) => error!("Shutdown failed: {:#}", e),
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(explorer) = self.explorer.as_mut() else {
            return;
        };
        explorer.input_mut().process_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => explorer.presenter_mut().resize(size.width, size.height),
            WindowEvent::RedrawRequested => match explorer.step() {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Quit) => event_loop.exit(),
                Err(e) => self.fail(event_loop, e),
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.stop();
    }
}

fn run_windowed(config: AppConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);

    info!("Controls: WASD/arrows pan, Q/E or wheel zoom, R reset, Space export, Escape quit");
    event_loop.run_app(&mut app)?;
    app.stop();

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_headless(config: AppConfig, cli: &Cli) -> Result<()> {
    let mut explorer = Explorer::new(&config, NullPresenter::new(), ScriptedInput::default())?;
    let frames = explorer.run(Some(cli.frames))?;

    if let Some(report) = explorer.last_report() {
        info!(
            "Rendered {} frames, last took {:?} on {} workers",
            frames, report.elapsed, report.workers
        );
    }
    if cli.export {
        explorer.export_front()?;
    }

    let states = explorer.shutdown()?;
    info!("Stopped {} workers", states.len());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli)?;

    if cli.headless {
        run_headless(config, &cli)
    } else {
        run_windowed(config)
    }
}
