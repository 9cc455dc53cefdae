// Errors in this crate are mostly user-facing messages, so a plain String
// carries everything we need.
pub type SError = String;
