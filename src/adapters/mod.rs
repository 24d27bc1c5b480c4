// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod repository;
pub mod storage;

pub use http::IsinClient;
pub use repository::{JsonPatientStore, RegistrySnapshot};
pub use storage::LocalStorage;
