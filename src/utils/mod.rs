pub mod state;

pub use state::{KeyValueStore, TomlStateStore};
