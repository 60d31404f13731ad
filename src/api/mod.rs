pub mod cache;
pub mod cached_client;
pub mod client;
pub mod types;

#[cfg(test)]
mod swr_tests;

pub use cache::ResourceKey;
pub use cached_client::CachedApiClient;
pub use types::{Category, Item};
