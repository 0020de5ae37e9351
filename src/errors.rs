/// Domain-specific error types for the chain view service.
/// External failures stay at the boundaries: the engine task consumes only
/// validated events and never errors mid-transition.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("chain API error: {status} {body}")]
    ChainApi { status: u16, body: String },

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        EngineError::Network(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let e = EngineError::ChainApi {
            status: 503,
            body: "upstream down".into(),
        };
        assert_eq!(e.to_string(), "chain API error: 503 upstream down");

        let e = EngineError::Config("REFERENCE_PRICE: invalid float".into());
        assert_eq!(e.to_string(), "config error: REFERENCE_PRICE: invalid float");
    }
}
