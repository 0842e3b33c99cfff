pub mod dependency;
pub mod invisible_labor;
pub mod recommendations;
pub mod temporal;

pub use dependency::*;
pub use invisible_labor::*;
pub use recommendations::*;
pub use temporal::*;
