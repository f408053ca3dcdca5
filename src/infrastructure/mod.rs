pub mod catalog;
#[cfg(feature = "http-transport")]
pub mod http;
pub mod in_memory;
pub mod signing;
pub mod xml;
