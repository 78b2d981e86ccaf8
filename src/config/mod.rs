// src/config/mod.rs

//! Configuration store and loading.
//!
//! - [`container`] is the dot-path addressed nested store every component
//!   receives its section through.
//! - [`loader`] reads a YAML file into a root container.

pub mod container;
pub mod loader;

pub use container::Container;
