pub mod feature;
pub mod store;

pub use feature::*;
pub use store::*;
