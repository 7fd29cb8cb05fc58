#![forbid(unsafe_code)]

pub mod repository;
pub mod sample;
pub mod sqlite;

pub use repository::{
    HanjaRepository, InMemoryRepository, ProgressRepository, Storage, StorageError,
};
pub use sample::{sample_catalog, seed_catalog};
