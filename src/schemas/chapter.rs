//! Chapter-detail response shapes. Elements arrive as a loosely typed bag
//! with a numeric `type` discriminant; the reconciler classifies them against
//! the owning page's content type and drops mismatches.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChapterDetailResponse {
    #[serde(rename = "chapterid")]
    pub(crate) chapter_id: i64,
    #[serde(rename = "wholepageItemDTOList", default)]
    pub(crate) items: Vec<ChapterItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChapterItem {
    #[serde(rename = "itemid")]
    pub(crate) section_id: i64,
    #[serde(rename = "wholepageDTOList", default)]
    pub(crate) pages: Vec<ChapterPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChapterPage {
    #[serde(rename = "id")]
    pub(crate) page_id: i64,
    #[serde(rename = "relationid")]
    pub(crate) page_relation_id: i64,
    #[serde(rename = "contentType")]
    pub(crate) content_type: i64,
    #[serde(rename = "coursepageDTOList", default)]
    pub(crate) elements: Vec<RawElement>,
}

/// Remote element type codes: 4 video, 6 question, 10 document, 12 content.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawElement {
    #[serde(rename = "type")]
    pub(crate) type_code: i64,
    #[serde(default)]
    pub(crate) content: Option<String>,
    #[serde(rename = "resourceid", default)]
    pub(crate) resource_id: Option<i64>,
    #[serde(rename = "videoLength", default)]
    pub(crate) video_length: Option<i64>,
    #[serde(rename = "questionDTOList", default)]
    pub(crate) questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawQuestion {
    #[serde(rename = "questionid")]
    pub(crate) question_id: i64,
    pub(crate) score: f64,
    pub(crate) title: String,
}
