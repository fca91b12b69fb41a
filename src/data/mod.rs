//! Data module - pickup loading and view derivation

pub(crate) mod loader;
mod processor;

pub use loader::{FileSource, HttpSource, PickupLoader};
pub use processor::{DataProcessor, ProcessorError, HOURS};
