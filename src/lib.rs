pub mod aggregate;
pub mod assembler;
pub mod cursor;
pub mod decoder;
mod error;
pub mod loader;
mod model;
pub mod overlap;
pub mod smf;
pub mod sort;
pub mod timeline;
mod util;

#[cfg(test)]
mod test_support;

pub use error::*;
pub use loader::counter::*;
pub use loader::notes::*;
pub use loader::MidiLoader;
pub use model::config::*;
pub use model::note::*;
pub use util::*;
