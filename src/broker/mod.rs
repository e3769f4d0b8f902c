//! The broadcast core: [`Message`] values, per-topic [`Channel`]s and the
//! [`Broker`] dispatcher that coordinates their lifecycle.

pub mod channel;
pub mod engine;
pub mod message;
pub mod options;

pub use channel::Channel;
pub use engine::Broker;
pub use message::Message;
pub use options::Options;

#[cfg(test)]
mod tests;
