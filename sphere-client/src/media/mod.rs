mod devices;
mod stream;
mod synthetic;

pub use devices::{MediaConstraints, MediaDevices, MediaEvent};
pub use stream::{LocalStream, MediaTrack, TrackKind, TrackSource};
pub use synthetic::{Permissions, SyntheticMediaDevices};
