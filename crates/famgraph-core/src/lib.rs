pub mod config;
pub mod error;
pub mod thresholds;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use thresholds::*;
pub use traits::*;
pub use types::*;
