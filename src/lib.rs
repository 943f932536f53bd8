//! An animated radar backdrop: pulsing rings, a rotating sweep with a fading trail, a drifting
//! particle field and a flickering grid.
//!
//! The scene is host agnostic. A host lends it a [`surface::DrawingContext`], a
//! [`scheduler::FrameScheduler`] and a [`viewport::ViewportObserver`] through [`mount::mount`], and
//! everything runs on the host's thread.

pub mod config;
pub mod mount;
pub mod preview;
pub mod random;
pub mod raster;
pub mod scene;
pub mod scheduler;
pub mod surface;
pub mod viewport;

pub use config::{ConfigError, SceneConfig};
pub use mount::{MountedScene, mount};
pub use scene::SceneRenderer;
