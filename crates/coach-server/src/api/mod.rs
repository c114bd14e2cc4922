//! API handlers for the coach server.

pub mod analysis;
pub mod commentary;
