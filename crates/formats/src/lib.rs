pub mod chunk_mapping;
pub mod error;
pub mod metadata;
pub mod paths;
pub mod table;

pub use chunk_mapping::*;
pub use error::*;
pub use metadata::*;
pub use table::*;
