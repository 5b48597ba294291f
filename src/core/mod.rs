pub mod clock;
pub mod controller;
pub mod input_adapter;
pub mod params;
pub mod partition;
pub mod pool;
pub mod present;
pub mod signal;
pub mod surface_renderer;
pub mod target;
pub mod transfer;
pub mod view;
pub mod worker;

pub use clock::FpsMeter;
pub use controller::{InputFrame, InputSource, ScriptedInput};
pub use input_adapter::KeyboardInput;
pub use params::{ParameterBlock, SharedBlock, RESPONSE_DONE};
pub use pool::{FrameReport, WorkerPool};
pub use present::{NullPresenter, Presenter};
pub use surface_renderer::WgpuPresenter;
pub use target::{Resolution, TargetBuffer, UNWRITTEN};
pub use view::{NavDelta, NavTuning, View};
pub use worker::{Wake, WorkerState};
