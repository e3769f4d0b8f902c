use std::fmt;

/// A single server-sent event: identifier, payload, optional event name and
/// an optional retry hint in milliseconds.
///
/// Messages are immutable once constructed and cheap to share between the
/// broadcast path and delivery queues. The retry hint is the one field the
/// transport may need to fill in per delivery; [`Message::with_retry`]
/// produces a delivery-local copy for that, so a message broadcast to many
/// clients is never written to concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: String,
    data: String,
    event: String,
    retry: u64,
}

impl Message {
    /// Create a message with an identifier, payload and event name.
    /// Empty identifier and event name are allowed and omitted on the wire.
    pub fn new(id: &str, data: &str, event: &str) -> Self {
        Self {
            id: id.to_string(),
            data: data.to_string(),
            event: event.to_string(),
            retry: 0,
        }
    }

    /// Create a message carrying only a payload.
    pub fn simple(data: &str) -> Self {
        Self::new("", data, "")
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Retry hint in milliseconds, 0 when unset.
    pub fn retry(&self) -> u64 {
        self.retry
    }

    pub fn has_retry(&self) -> bool {
        self.retry > 0
    }

    /// Return a copy of this message with the retry hint set.
    ///
    /// The copy keeps retry assignment local to one delivery; the shared
    /// instance handed to other clients is untouched.
    pub fn with_retry(mut self, retry_ms: u64) -> Self {
        self.retry = retry_ms;
        self
    }
}

/// Wire framing of one event.
///
/// `id:` and `event:` lines appear only when non-empty, `retry:` only when
/// set. Each line of the payload becomes its own `data:` line. A blank line
/// terminates the frame.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.id.is_empty() {
            writeln!(f, "id: {}", self.id)?;
        }

        if !self.event.is_empty() {
            writeln!(f, "event: {}", self.event)?;
        }

        if self.retry > 0 {
            writeln!(f, "retry: {}", self.retry)?;
        }

        for line in self.data.lines() {
            writeln!(f, "data: {line}")?;
        }

        writeln!(f)
    }
}
