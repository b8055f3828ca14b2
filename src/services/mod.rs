pub mod adapter;
pub mod fallback;
pub mod recommendations;
pub mod selection;
pub mod shuffle;
pub mod sources;

pub use adapter::{FieldAdapter, ItemAdapter};
pub use fallback::FallbackChain;
