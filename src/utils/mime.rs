//! MIME types of the assets served by the gateway.

/// Every asset kind the gateway serves is an ES module.
pub const JAVASCRIPT: &str = "application/javascript";
