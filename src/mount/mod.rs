//! Volume mounting

mod gate;

pub use gate::{MountGate, MountState};
