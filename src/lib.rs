pub mod animation;
pub mod calibration;
pub mod config;
pub mod error;
pub mod kinematics;
pub mod render;
pub mod signals;
pub mod sink;

pub use error::{ErrorKind, GaitError, Result};
