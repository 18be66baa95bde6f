use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    /// A rule marked as required found nothing to rewrite. The file has
    /// drifted from what the rule expects.
    #[error("required rule `{rule}` matched nothing")]
    RequiredMatchNotFound { rule: String },

    #[error("anchor for rule `{rule}` not found")]
    AnchorNotFound { rule: String },

    #[error("invalid pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl RewriteError {
    /// Name of the rule that raised the error, if any.
    pub fn rule(&self) -> Option<&str> {
        match self {
            RewriteError::RequiredMatchNotFound { rule }
            | RewriteError::AnchorNotFound { rule } => Some(rule),
            RewriteError::InvalidPattern { .. } => None,
        }
    }
}
