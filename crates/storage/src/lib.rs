#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod json_store;
pub mod memory;
pub mod model;
pub mod seed;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;
pub use seed::FlatFileSeeder;
