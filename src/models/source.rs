//! Sources (sitemaps and uploads) and the pages indexed from them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::deserialize_flag;
use crate::traits::MultipartForm;

/// A content source of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    /// `sitemap` or `upload`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Response of the source listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceList {
    #[serde(default)]
    pub sitemaps: Vec<Source>,
    #[serde(default)]
    pub uploads: Option<Source>,
}

impl SourceList {
    pub fn len(&self) -> usize {
        self.sitemaps.len() + usize::from(self.uploads.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A source to add to an existing agent.
#[derive(Debug, Clone, PartialEq)]
pub enum NewSource {
    Sitemap(String),
    File {
        file_name: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

impl NewSource {
    pub fn file(
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        NewSource::File {
            file_name: file_name.into(),
            content_type,
            data: data.into(),
        }
    }

    pub(crate) fn into_form(self) -> MultipartForm {
        match self {
            NewSource::Sitemap(path) => MultipartForm::new().text("sitemap_path", path),
            NewSource::File {
                file_name,
                content_type,
                data,
            } => MultipartForm::new().file("file", file_name, content_type, data),
        }
    }
}

/// One crawled or uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub page_url_hash: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub crawl_status: Option<String>,
    #[serde(default)]
    pub index_status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_file: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Display metadata of a page, used in citations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_list() {
        let list: SourceList = serde_json::from_value(json!({
            "sitemaps": [{"id": 1, "type": "sitemap", "pages": []}],
            "uploads": {"id": 2, "type": "upload", "pages": [
                {"id": 10, "is_file": 1, "filename": "faq.pdf", "filesize": 2048,
                 "crawl_status": "ok", "index_status": "ok"}
            ]}
        }))
        .unwrap();
        assert_eq!(list.len(), 2);
        let upload = list.uploads.unwrap();
        assert!(upload.pages[0].is_file);
        assert_eq!(upload.pages[0].filesize, Some(2048));
    }

    #[test]
    fn test_metadata_serializes_only_set_fields() {
        let meta = PageMetadata {
            title: Some("FAQ".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(meta).unwrap(), json!({"title": "FAQ"}));
    }
}
