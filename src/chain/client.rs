use super::types::OptionRecord;
use crate::errors::{EngineError, EngineResult};
use reqwest::Client;

/// REST client for the option-chain snapshot source. All methods return
/// Result, never panic.
#[derive(Clone)]
pub struct ChainClient {
    client: Client,
    base_url: String,
}

impl ChainClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(4)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the full chain snapshot. Rows with a non-finite strike or
    /// moneyness are dropped here so the selector only ever sees orderable
    /// keys.
    pub async fn get_chain(&self) -> EngineResult<Vec<OptionRecord>> {
        let url = format!("{}/table_data", self.base_url);

        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::ChainApi {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<OptionRecord> = resp
            .json()
            .await
            .map_err(|e| EngineError::Parse(format!("GET /table_data: {e}")))?;

        let total = rows.len();
        let valid: Vec<OptionRecord> = rows.into_iter().filter(|r| r.has_valid_keys()).collect();

        if valid.len() < total {
            tracing::warn!(
                dropped = total - valid.len(),
                total = total,
                "dropped rows with non-numeric keys"
            );
        }

        if valid.is_empty() {
            return Err(EngineError::Parse("chain snapshot contained no usable rows".into()));
        }

        Ok(valid)
    }
}
