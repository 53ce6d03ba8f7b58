use crate::types::Role;
use crate::Result;

/// Blocking operator port. The pipeline cannot continue until each call returns.
pub trait HumanGate: Send {
    /// Show `text` to the operator acting as `role` and return either the same
    /// text or the operator's full replacement.
    fn request_edit(&mut self, text: &str, role: Role) -> Result<String>;

    /// Ask the operator for a retrieval query.
    fn request_query(&mut self) -> Result<String>;

    /// Show informational text (review feedback, retrieved versions).
    fn present(&mut self, _heading: &str, _text: &str) -> Result<()> {
        Ok(())
    }
}
