use serde_json::json;

use crate::client::{ApiRequest, CustomGptClient};
use crate::error::ApiResult;
use crate::models::{Conversation, Deleted, Paginated};

use super::{agent_path, segment, ListQuery};

impl CustomGptClient {
    /// `GET /projects/{id}/conversations`.
    ///
    /// `user_filter` narrows by who started the conversation (`all`,
    /// `anonymous`, `team_member`, ...).
    pub async fn list_conversations(
        &self,
        agent_id: i64,
        query: &ListQuery,
        user_filter: Option<&str>,
    ) -> ApiResult<Paginated<Conversation>> {
        let request = query
            .apply(ApiRequest::get(agent_path(agent_id, "/conversations")))
            .query("userFilter", user_filter);
        self.call(request).await
    }

    pub async fn create_conversation(
        &self,
        agent_id: i64,
        name: Option<&str>,
    ) -> ApiResult<Conversation> {
        let body = match name {
            Some(name) => json!({ "name": name }),
            None => json!({}),
        };
        self.call(ApiRequest::post(agent_path(agent_id, "/conversations")).json(body))
            .await
    }

    pub async fn update_conversation(
        &self,
        agent_id: i64,
        session_id: &str,
        name: &str,
    ) -> ApiResult<Conversation> {
        let path = agent_path(agent_id, &format!("/conversations/{}", segment(session_id)));
        self.call(ApiRequest::put(path).json(json!({ "name": name })))
            .await
    }

    pub async fn delete_conversation(&self, agent_id: i64, session_id: &str) -> ApiResult<Deleted> {
        let path = agent_path(agent_id, &format!("/conversations/{}", segment(session_id)));
        self.call_ack(ApiRequest::delete(path), Deleted::ACK).await
    }
}
