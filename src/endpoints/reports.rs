use crate::client::{ApiRequest, CustomGptClient};
use crate::error::ApiResult;
use crate::models::{AnalysisInterval, Report};

use super::agent_path;

impl CustomGptClient {
    async fn report(&self, agent_id: i64, name: &str, request: ApiRequest) -> ApiResult<Report> {
        tracing::debug!(agent_id, report = name, "Fetching report");
        self.call(request).await
    }

    /// Where queries came from (web, API, integrations).
    pub async fn traffic_report(&self, agent_id: i64) -> ApiResult<Report> {
        let path = agent_path(agent_id, "/reports/traffic");
        self.report(agent_id, "traffic", ApiRequest::get(path)).await
    }

    pub async fn queries_report(&self, agent_id: i64) -> ApiResult<Report> {
        let path = agent_path(agent_id, "/reports/queries");
        self.report(agent_id, "queries", ApiRequest::get(path)).await
    }

    pub async fn conversations_report(&self, agent_id: i64) -> ApiResult<Report> {
        let path = agent_path(agent_id, "/reports/conversations");
        self.report(agent_id, "conversations", ApiRequest::get(path))
            .await
    }

    /// Query and conversation counts bucketed by `interval`.
    pub async fn analysis_report(
        &self,
        agent_id: i64,
        interval: Option<AnalysisInterval>,
    ) -> ApiResult<Report> {
        let request =
            ApiRequest::get(agent_path(agent_id, "/reports/analysis")).query("interval", interval);
        self.report(agent_id, "analysis", request).await
    }
}
