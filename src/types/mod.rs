//! Core data types shared across the engine.

pub mod document;
pub mod message;
pub mod tool;
pub mod usage;

pub use document::*;
pub use message::*;
pub use tool::*;
pub use usage::*;
