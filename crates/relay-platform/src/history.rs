//! HTTP history adapter — implements `HistoryPort` via browser `fetch()`.

use async_trait::async_trait;
use gloo_net::http::Request;

use relay_core::ports::HistoryPort;
use relay_types::{
    config::ClientConfig,
    history::{HistoryPage, HistoryRequest},
    ClientError, Result,
};

/// Fetches older transcript pages from the orchestration server
#[derive(Debug, Clone)]
pub struct HttpHistoryClient {
    config: ClientConfig,
}

impl HttpHistoryClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn url(&self, session_id: &str) -> String {
        let session_id = String::from(js_sys::encode_uri_component(session_id));
        self.config.history_url(&session_id)
    }
}

/// Query parameters for one page request
pub fn history_query(request: &HistoryRequest) -> Vec<(&'static str, String)> {
    vec![
        ("workspace", request.workspace.clone()),
        ("agentType", request.agent_type.as_str().to_string()),
        ("limit", request.limit.to_string()),
        ("offset", request.offset.to_string()),
    ]
}

#[async_trait(?Send)]
impl HistoryPort for HttpHistoryClient {
    async fn fetch_page(&self, request: &HistoryRequest) -> Result<HistoryPage> {
        let url = self.url(&request.session_id);
        let query = history_query(request);

        let response = Request::get(&url)
            .query(query.iter().map(|(key, value)| (*key, value.as_str())))
            .send()
            .await
            .map_err(|e| ClientError::History(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ClientError::History(format!("HTTP {}: {}", status, text)));
        }

        response
            .json::<HistoryPage>()
            .await
            .map_err(|e| ClientError::History(format!("bad history page: {}", e)))
    }
}
