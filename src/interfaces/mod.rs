//! Adapters facing the merchant's own HTTP endpoints.

pub mod soap;
