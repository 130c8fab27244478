pub mod loader;

pub use loader::{LoadedProgram, load};
