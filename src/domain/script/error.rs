#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("lesson has no exchanges with content")]
    NoContent,
}
