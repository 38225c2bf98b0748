//! Per-vendor [`crate::adapter::Adapter`] implementations. Each is gated by
//! the Cargo feature of the same name.

#[cfg(feature = "deribit")]
pub mod deribit;

#[cfg(feature = "terminal")]
pub mod terminal;
