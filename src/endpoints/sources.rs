use crate::client::{ApiRequest, CustomGptClient};
use crate::error::ApiResult;
use crate::models::{Deleted, NewSource, Source, SourceList};

use super::agent_path;

impl CustomGptClient {
    pub async fn list_sources(&self, agent_id: i64) -> ApiResult<SourceList> {
        self.call(ApiRequest::get(agent_path(agent_id, "/sources")))
            .await
    }

    /// Add a sitemap or upload a file (multipart; the transport sets the
    /// content type and boundary).
    pub async fn add_source(&self, agent_id: i64, source: NewSource) -> ApiResult<Source> {
        self.call(ApiRequest::post(agent_path(agent_id, "/sources")).multipart(source.into_form()))
            .await
    }

    /// Re-crawl a sitemap source now.
    pub async fn instant_sync_source(&self, agent_id: i64, source_id: i64) -> ApiResult<Source> {
        let path = agent_path(agent_id, &format!("/sources/{}/instant-sync", source_id));
        self.call(ApiRequest::put(path)).await
    }

    pub async fn delete_source(&self, agent_id: i64, source_id: i64) -> ApiResult<Deleted> {
        let path = agent_path(agent_id, &format!("/sources/{}", source_id));
        self.call_ack(ApiRequest::delete(path), Deleted::ACK).await
    }
}
