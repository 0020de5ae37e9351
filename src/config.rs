use crate::errors::{EngineError, EngineResult};
use crate::view::window::MAX_WINDOW_SIZE;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chain_api_base_url: String,
    pub symbol: String,
    /// Fixed reference price for the session; strikes are partitioned around it.
    pub reference_price: f64,
    pub default_window_size: usize,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        let reference_price = env_var_or("REFERENCE_PRICE", "214.29")
            .parse::<f64>()
            .map_err(|e| EngineError::Config(format!("REFERENCE_PRICE: {e}")))?;

        if !reference_price.is_finite() {
            return Err(EngineError::Config(format!(
                "REFERENCE_PRICE must be finite: {reference_price}"
            )));
        }

        let default_window_size = env_var_or("DEFAULT_WINDOW_SIZE", "10")
            .parse::<usize>()
            .map_err(|e| EngineError::Config(format!("DEFAULT_WINDOW_SIZE: {e}")))?;

        if default_window_size > MAX_WINDOW_SIZE {
            return Err(EngineError::Config(format!(
                "DEFAULT_WINDOW_SIZE must be <= {MAX_WINDOW_SIZE}: {default_window_size}"
            )));
        }

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| EngineError::Config(format!("SERVER_PORT: {e}")))?;

        Ok(Self {
            chain_api_base_url: env_var_or(
                "CHAIN_API_BASE_URL",
                "https://frontendassignment-algo-one.netlify.app",
            ),
            symbol: env_var_or("CHAIN_SYMBOL", "AAPL"),
            reference_price,
            default_window_size,
            server_port,
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
