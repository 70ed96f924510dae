use serde_json::json;

use crate::client::{ApiRequest, CustomGptClient, RequestOptions};
use crate::error::{ApiError, ApiResult};
use crate::models::{ConversationMessages, Message, Reaction, SendMessage};
use crate::stream::{StreamHandler, StreamOutcome};

use super::{agent_path, segment, ListQuery};

fn messages_path(agent_id: i64, session_id: &str) -> String {
    agent_path(
        agent_id,
        &format!("/conversations/{}/messages", segment(session_id)),
    )
}

impl CustomGptClient {
    pub async fn list_messages(
        &self,
        agent_id: i64,
        session_id: &str,
        query: &ListQuery,
    ) -> ApiResult<ConversationMessages> {
        let request = query.apply(ApiRequest::get(messages_path(agent_id, session_id)));
        self.call(request).await
    }

    /// Send a prompt and wait for the whole answer.
    pub async fn send_message(
        &self,
        agent_id: i64,
        session_id: &str,
        message: &SendMessage,
        lang: Option<&str>,
    ) -> ApiResult<Message> {
        let request = ApiRequest::post(messages_path(agent_id, session_id))
            .query("stream", Some(false))
            .query("lang", Some(lang.unwrap_or(self.config().lang())))
            .json_body(message)?;
        self.call(request).await
    }

    /// Send a prompt and stream the answer into `handler`.
    ///
    /// `options.lang`, `options.timeout` and `options.cancel` apply;
    /// `options.retry` is ignored.
    pub async fn stream_message<H>(
        &self,
        agent_id: i64,
        session_id: &str,
        message: &SendMessage,
        options: RequestOptions,
        handler: &mut H,
    ) -> StreamOutcome
    where
        H: StreamHandler + ?Sized,
    {
        let request = match ApiRequest::post(messages_path(agent_id, session_id)).json_body(message)
        {
            Ok(request) => request.options(options),
            Err(err) => return fail_before_open(err, handler),
        };
        self.stream(request, handler).await
    }

    pub async fn get_message(
        &self,
        agent_id: i64,
        session_id: &str,
        prompt_id: i64,
    ) -> ApiResult<Message> {
        let path = format!("{}/{}", messages_path(agent_id, session_id), prompt_id);
        self.call(ApiRequest::get(path)).await
    }

    /// `PUT .../messages/{prompt_id}/feedback`.
    pub async fn message_feedback(
        &self,
        agent_id: i64,
        session_id: &str,
        prompt_id: i64,
        reaction: Reaction,
    ) -> ApiResult<Message> {
        let path = format!(
            "{}/{}/feedback",
            messages_path(agent_id, session_id),
            prompt_id
        );
        self.call(ApiRequest::put(path).json(json!({ "reaction": reaction })))
            .await
    }
}

fn fail_before_open<H>(err: ApiError, handler: &mut H) -> StreamOutcome
where
    H: StreamHandler + ?Sized,
{
    handler.on_error(err.clone());
    StreamOutcome::Failed(err)
}
