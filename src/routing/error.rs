use thiserror::Error;

/// Route registration errors, reported by `RouterBuilder::build`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route `{pattern}` has a capture segment without a name")]
    EmptyCaptureName { pattern: String },

    #[error("route `{pattern}` captures `{name}` more than once")]
    DuplicateCapture { pattern: String, name: String },
}
