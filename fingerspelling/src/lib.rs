pub mod camera;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod driver;
pub mod error;
pub mod labels;
pub mod landmarks;
pub mod replay;
pub mod sampler;
pub mod session;
pub mod stabilizer;
pub mod state;

pub use error::{FingerspellErr, Result};
