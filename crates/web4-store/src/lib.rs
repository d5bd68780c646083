pub mod keys;
pub mod overlay;
pub mod store;

pub use overlay::{Checkpoint, Overlay};
pub use store::Store;
