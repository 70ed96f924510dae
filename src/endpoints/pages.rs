use crate::client::{ApiRequest, CustomGptClient};
use crate::error::ApiResult;
use crate::models::{Deleted, Page, PageMetadata, Paginated, Updated};

use super::{agent_path, PageQuery};

fn page_path(agent_id: i64, page_id: i64, rest: &str) -> String {
    agent_path(agent_id, &format!("/pages/{}{}", page_id, rest))
}

impl CustomGptClient {
    pub async fn list_pages(&self, agent_id: i64, query: &PageQuery) -> ApiResult<Paginated<Page>> {
        let request = query.apply(ApiRequest::get(agent_path(agent_id, "/pages")));
        self.call(request).await
    }

    pub async fn delete_page(&self, agent_id: i64, page_id: i64) -> ApiResult<Deleted> {
        self.call_ack(ApiRequest::delete(page_path(agent_id, page_id, "")), Deleted::ACK)
            .await
    }

    pub async fn reindex_page(&self, agent_id: i64, page_id: i64) -> ApiResult<Updated> {
        self.call_ack(
            ApiRequest::post(page_path(agent_id, page_id, "/reindex")),
            Updated::ACK,
        )
        .await
    }

    pub async fn page_metadata(&self, agent_id: i64, page_id: i64) -> ApiResult<PageMetadata> {
        self.call(ApiRequest::get(page_path(agent_id, page_id, "/metadata")))
            .await
    }

    pub async fn update_page_metadata(
        &self,
        agent_id: i64,
        page_id: i64,
        metadata: &PageMetadata,
    ) -> ApiResult<PageMetadata> {
        let request =
            ApiRequest::put(page_path(agent_id, page_id, "/metadata")).json_body(metadata)?;
        self.call(request).await
    }
}
