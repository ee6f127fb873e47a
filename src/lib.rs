//! SmartTA client — async backend dispatch and a thread-confined chat display.

pub mod bus;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod render;
pub mod session;
pub mod surface;
pub mod transport;
