use crate::client::{ApiRequest, CustomGptClient};
use crate::error::ApiResult;
use crate::models::{
    Agent, AgentSettings, AgentSettingsUpdate, AgentStats, AgentUpdate, Deleted, NewAgent,
    Paginated, Updated,
};

use super::{agent_path, ListQuery};

impl CustomGptClient {
    /// `GET /projects`, optionally filtered by name.
    pub async fn list_agents(
        &self,
        query: &ListQuery,
        name: Option<&str>,
    ) -> ApiResult<Paginated<Agent>> {
        let request = query.apply(ApiRequest::get("/projects")).query("name", name);
        self.call(request).await
    }

    /// `POST /projects` (multipart).
    pub async fn create_agent(&self, agent: NewAgent) -> ApiResult<Agent> {
        self.call(ApiRequest::post("/projects").multipart(agent.into_form()))
            .await
    }

    pub async fn get_agent(&self, agent_id: i64) -> ApiResult<Agent> {
        self.call(ApiRequest::get(agent_path(agent_id, ""))).await
    }

    /// `POST /projects/{id}` (multipart).
    pub async fn update_agent(&self, agent_id: i64, update: AgentUpdate) -> ApiResult<Agent> {
        self.call(ApiRequest::post(agent_path(agent_id, "")).multipart(update.into_form()))
            .await
    }

    pub async fn delete_agent(&self, agent_id: i64) -> ApiResult<Deleted> {
        self.call_ack(ApiRequest::delete(agent_path(agent_id, "")), Deleted::ACK)
            .await
    }

    pub async fn replicate_agent(&self, agent_id: i64) -> ApiResult<Agent> {
        self.call(ApiRequest::post(agent_path(agent_id, "/replicate")))
            .await
    }

    pub async fn agent_stats(&self, agent_id: i64) -> ApiResult<AgentStats> {
        self.call(ApiRequest::get(agent_path(agent_id, "/stats"))).await
    }

    pub async fn agent_settings(&self, agent_id: i64) -> ApiResult<AgentSettings> {
        self.call(ApiRequest::get(agent_path(agent_id, "/settings")))
            .await
    }

    /// `POST /projects/{id}/settings` (multipart).
    pub async fn update_agent_settings(
        &self,
        agent_id: i64,
        settings: AgentSettingsUpdate,
    ) -> ApiResult<Updated> {
        self.call_ack(
            ApiRequest::post(agent_path(agent_id, "/settings")).multipart(settings.into_form()),
            Updated::ACK,
        )
        .await
    }
}
