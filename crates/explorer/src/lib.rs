pub mod controller;
pub mod events;
pub mod fragment;
pub mod neighbors;
pub mod search;
pub mod state;
pub mod tooltip;

pub use controller::*;
pub use events::*;
pub use fragment::*;
pub use neighbors::*;
pub use search::*;
pub use state::*;
pub use tooltip::*;
