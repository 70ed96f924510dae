//! Agents (called "projects" by the REST API).

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::deserialize_flag;
use crate::traits::MultipartForm;

/// An agent as returned by `/projects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub project_name: String,
    #[serde(default)]
    pub sitemap_path: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_chat_active: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub team_id: Option<i64>,
    /// `SITEMAP`, `UPLOAD`, ...
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_shared: bool,
    #[serde(default)]
    pub shareable_slug: Option<String>,
    #[serde(default)]
    pub shareable_link: Option<String>,
    #[serde(default)]
    pub embed_code: Option<String>,
    #[serde(default)]
    pub live_chat_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Crawl, index and usage counters for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentStats {
    pub pages_found: u64,
    pub pages_crawled: u64,
    pub pages_indexed: u64,
    pub crawl_credits_used: u64,
    pub query_credits_used: u64,
    pub total_queries: u64,
    pub total_words_indexed: u64,
    pub total_storage_credits_used: u64,
}

/// Chatbot settings of one agent.
///
/// Only the commonly used fields are typed; everything else the server sends
/// is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub chatbot_avatar: Option<String>,
    #[serde(default)]
    pub chatbot_background: Option<String>,
    #[serde(default)]
    pub default_prompt: Option<String>,
    #[serde(default)]
    pub example_questions: Vec<String>,
    #[serde(default)]
    pub response_source: Option<String>,
    #[serde(default)]
    pub chatbot_msg_lang: Option<String>,
    #[serde(default)]
    pub chatbot_model: Option<String>,
    #[serde(default)]
    pub persona_instructions: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Source of a new agent: a sitemap to crawl or a single uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub enum NewAgent {
    Sitemap {
        project_name: String,
        sitemap_path: String,
    },
    File {
        project_name: String,
        file_name: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

impl NewAgent {
    pub fn sitemap(project_name: impl Into<String>, sitemap_path: impl Into<String>) -> Self {
        NewAgent::Sitemap {
            project_name: project_name.into(),
            sitemap_path: sitemap_path.into(),
        }
    }

    pub fn file(
        project_name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        NewAgent::File {
            project_name: project_name.into(),
            file_name: file_name.into(),
            content_type,
            data: data.into(),
        }
    }

    pub(crate) fn into_form(self) -> MultipartForm {
        match self {
            NewAgent::Sitemap {
                project_name,
                sitemap_path,
            } => MultipartForm::new()
                .text("project_name", project_name)
                .text("sitemap_path", sitemap_path),
            NewAgent::File {
                project_name,
                file_name,
                content_type,
                data,
            } => MultipartForm::new().text("project_name", project_name).file(
                "file",
                file_name,
                content_type,
                data,
            ),
        }
    }
}

/// Fields to change on an agent. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentUpdate {
    pub project_name: Option<String>,
    pub is_shared: Option<bool>,
    pub sitemap_path: Option<String>,
    pub are_licenses_allowed: Option<bool>,
}

impl AgentUpdate {
    pub(crate) fn into_form(self) -> MultipartForm {
        MultipartForm::new()
            .text_opt("project_name", self.project_name)
            .text_opt("is_shared", self.is_shared.map(flag))
            .text_opt("sitemap_path", self.sitemap_path)
            .text_opt("are_licenses_allowed", self.are_licenses_allowed.map(flag))
    }
}

/// Settings to change on an agent. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentSettingsUpdate {
    pub default_prompt: Option<String>,
    pub example_questions: Option<Vec<String>>,
    pub response_source: Option<String>,
    pub chatbot_msg_lang: Option<String>,
    pub chatbot_model: Option<String>,
    pub persona_instructions: Option<String>,
    pub chatbot_avatar: Option<(String, Bytes)>,
}

impl AgentSettingsUpdate {
    pub(crate) fn into_form(self) -> MultipartForm {
        let mut form = MultipartForm::new()
            .text_opt("default_prompt", self.default_prompt)
            .text_opt("response_source", self.response_source)
            .text_opt("chatbot_msg_lang", self.chatbot_msg_lang)
            .text_opt("chatbot_model", self.chatbot_model)
            .text_opt("persona_instructions", self.persona_instructions);
        for question in self.example_questions.unwrap_or_default() {
            form = form.text("example_questions[]", question);
        }
        if let Some((file_name, data)) = self.chatbot_avatar {
            form = form.file("chatbot_avatar", file_name, None, data);
        }
        form
    }
}

fn flag(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}
