//! HTTP gateway translating webhook notifications into MQTT publishes.
//!
//! A single `POST /webhook` endpoint validates each request and hands the
//! extracted alarm payload to a [`camlink_core::Publisher`].

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use router::build_router;
pub use server::GatewayServer;
