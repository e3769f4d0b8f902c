//! # ssecast
//!
//! `ssecast` is an in-memory server-push messaging core built on
//! Server-Sent Events. Publishers broadcast to named channels; every client
//! attached to a channel receives the message on its own delivery queue and
//! the HTTP transport streams it out as `text/event-stream`.
//!
//! ## Core Modules
//!
//! - `broker`: messages, channels and the dispatcher that serializes all
//!   attach/detach/close/shutdown events while broadcasts run concurrently.
//! - `client`: the server-side representation of one subscriber connection.
//! - `config`: file/environment configuration for the binary.
//! - `transport`: the axum HTTP adapter streaming events to subscribers.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;

pub use broker::{Broker, Channel, Message, Options};
pub use client::Client;
pub use utils::Error;

#[cfg(test)]
mod tests;
