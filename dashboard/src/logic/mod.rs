//! Dashboard logic: API client, session cache, formatting and rendering

pub mod client;
pub mod error;
pub mod formatter;
pub mod render;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
