//! Cmd graph: build-artifact dependency graph reconstructed from `.cmd` files

mod build;
pub use build::*;
mod cache;
pub use cache::*;
mod hardcoded;
pub use hardcoded::*;
mod node;
pub use node::*;
