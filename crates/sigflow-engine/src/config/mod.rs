//! Signal configuration: types, YAML parsing, validation and the store.

pub mod parser;
pub mod store;
pub mod types;
pub mod validator;

pub use store::SignalStore;
pub use types::{ComponentRef, ComponentSpec, SignalDefinition};
