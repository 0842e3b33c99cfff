pub mod anthropic_provider;
pub mod generator;
pub mod intent;
pub mod llm_provider;
pub mod router;

pub use anthropic_provider::*;
pub use generator::*;
pub use intent::*;
pub use llm_provider::*;
pub use router::*;
