pub mod arch;
pub mod error;
pub mod loader;
mod test;

pub use error::{MlErr, Result};
