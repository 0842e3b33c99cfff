pub mod catalog;
pub mod client;
pub mod normalize;
pub mod results;
pub mod runner;

pub use catalog::*;
pub use client::*;
pub use normalize::*;
pub use results::*;
pub use runner::*;
