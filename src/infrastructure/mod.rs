//! Adapters for the domain ports.

pub mod identity_http;
pub mod in_memory;
pub mod provider_sdk;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
