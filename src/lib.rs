//! Virtual-tour panorama viewer core: spherical/screen coordinate math, the
//! per-frame viewer controller, the tour data file and background image loading.

pub mod coords;
pub mod error;
pub mod i18n;
pub mod loader;
pub mod panorama;
pub mod settings;
pub mod tour;
pub mod viewer;

pub use coords::{Calibration, Camera, Spherical, Viewport};
pub use error::{LoadError, RendererError, TourError, ViewerError};
pub use loader::{PanoramaSource, ThreadedLoader};
pub use settings::ViewerSettings;
pub use tour::{InfoPoint, InfoPointKind, Scene, Tour, TourStore};
pub use viewer::{KeyRotation, Marker, Placement, ViewerController, ViewerState};
