pub const DEFAULT_BEACON_NODE_URL: &str = "http://localhost:5052";

// Long enough for an epoch summary against a remote node.
pub const DEFAULT_TIMEOUT_MILLIS: u64 = 30_000;
