//! Written-off account data structures and dataset loading

mod data;
pub mod loader;

pub use data::{
    actual_column, predicted_column, Account, AccountInfo, Dataset, ProductType, Vintage,
};
pub use loader::{load_dataset, load_dataset_from_bytes, load_dataset_from_reader, DEFAULT_DATASET_PATH};
