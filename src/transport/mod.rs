//! The HTTP adapter: turns each GET request into an attached client and
//! streams that client's delivery queue back as `text/event-stream` output,
//! framing messages per the wire contract and reporting disconnects to the
//! broker exactly once.

pub mod sse;
