#[cfg(feature = "sled")]
pub mod sled_store;
