// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "mandelbrot-pool")]
#[command(about = "Real-time Mandelbrot explorer on a pool of worker threads", long_about = None)]
pub struct Cli {
    /// Number of worker threads (default: available cores)
    #[arg(long)]
    pub workers: Option<u32>,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render without a window
    #[arg(long, default_value = "false")]
    pub headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value = "60")]
    pub frames: u64,

    /// Save the last headless frame as a BMP
    #[arg(long, default_value = "false")]
    pub export: bool,

    /// Directory for exported snapshots
    #[arg(long = "export-dir")]
    pub export_dir: Option<PathBuf>,

    /// Completion timeout per frame, in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}
