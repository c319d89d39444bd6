/// Per-link failures. None of these ever leave the message handler: the link
/// is logged and skipped, the rest of the message is still processed.
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    /// The link has no `wiki/<title>` path, or its anchor split is malformed.
    #[error("couldn't find title in Wikipedia link {link}")]
    Extraction { link: String },

    /// Transport error, bad status or empty body from the summary API.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The summary payload is not the expected JSON structure.
    #[error("failed to decode summary response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload decoded but holds no usable page.
    #[error("no page found in summary response")]
    NotFound,

    /// The transport refused the reply.
    #[error("failed to publish reply: {0}")]
    Publish(String),
}

impl AnnotateError {
    pub fn extraction(link: impl Into<String>) -> Self {
        Self::Extraction { link: link.into() }
    }

    /// Short label of the pipeline stage that failed, used in log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Extraction { .. } => "extract",
            Self::Fetch(_) => "fetch",
            Self::Decode(_) | Self::NotFound => "parse",
            Self::Publish(_) => "publish",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnnotateError::extraction("https://en.wikipedia.org/notwiki/Foo");
        assert_eq!(
            err.to_string(),
            "couldn't find title in Wikipedia link https://en.wikipedia.org/notwiki/Foo"
        );
        assert_eq!(
            AnnotateError::NotFound.to_string(),
            "no page found in summary response"
        );
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(AnnotateError::extraction("x").stage(), "extract");
        assert_eq!(AnnotateError::Fetch("boom".into()).stage(), "fetch");
        assert_eq!(AnnotateError::NotFound.stage(), "parse");
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(AnnotateError::from(decode).stage(), "parse");
        assert_eq!(AnnotateError::Publish("nope".into()).stage(), "publish");
    }
}
