//! Typed endpoint methods on [`CustomGptClient`].
//!
//! Each method is a fixed path template plus parameters on top of
//! [`CustomGptClient::execute`] or [`CustomGptClient::stream`]; the response
//! envelope is unwrapped to its `data`. Path segments are percent-encoded.

mod account;
mod agents;
mod conversations;
mod messages;
mod pages;
mod reports;
mod sources;

use std::fmt::Display;

use serde::de::DeserializeOwned;

use crate::client::{ApiRequest, CustomGptClient};
use crate::error::ApiResult;
use crate::models::{Envelope, SortOrder};

/// Paging and sorting shared by the list endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub order: Option<SortOrder>,
    pub order_by: Option<String>,
}

impl ListQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .query("page", self.page)
            .query("order", self.order)
            .query("orderBy", self.order_by.as_deref())
    }
}

/// Filters for the page listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub order: Option<SortOrder>,
    pub crawl_status: Option<String>,
    pub index_status: Option<String>,
}

impl PageQuery {
    pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .query("page", self.page)
            .query("limit", self.limit)
            .query("order", self.order)
            .query("crawl_status", self.crawl_status.as_deref())
            .query("index_status", self.index_status.as_deref())
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(value: impl Display) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

/// `/projects/{agent_id}` followed by `rest`.
pub(crate) fn agent_path(agent_id: i64, rest: &str) -> String {
    format!("/projects/{}{}", agent_id, rest)
}

impl CustomGptClient {
    /// Execute and unwrap the `{status, data}` envelope.
    pub(crate) async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let envelope: Envelope<T> = self.execute(request).await?;
        Ok(envelope.data)
    }

    /// [`call`](Self::call) for acknowledgement endpoints. An empty 2xx body,
    /// such as a `204 No Content`, yields `on_empty`.
    pub(crate) async fn call_ack<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        on_empty: T,
    ) -> ApiResult<T> {
        let envelope: Option<Envelope<T>> = self.execute(request).await?;
        Ok(envelope.map_or(on_empty, |envelope| envelope.data))
    }
}
