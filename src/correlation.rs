use std::fmt;

/// Identifier used to match an RPC request with its response.
///
/// Carried in-band in the request and response envelopes as a `uint32`.
/// Ids are drawn at random; uniqueness among outstanding requests is
/// enforced by the correlation table, not by the id space itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(u32);

impl CorrelationId {
    // ---

    /// Draw a new random correlation id.
    pub fn generate() -> Self {
        // ---
        Self(rand::random::<u32>())
    }

    /// The raw wire value.
    pub fn value(self) -> u32 {
        // ---
        self.0
    }
}

impl fmt::Display for CorrelationId {
    // ---

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for CorrelationId {
    // ---

    fn from(value: u32) -> Self {
        // ---
        Self(value)
    }
}

impl From<CorrelationId> for u32 {
    // ---

    fn from(id: CorrelationId) -> Self {
        // ---
        id.0
    }
}
