pub mod cache;
pub mod loads;
pub mod residency;

pub use cache::*;
pub use loads::*;
pub use residency::*;
