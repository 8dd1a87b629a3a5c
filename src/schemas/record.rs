//! Study-record and answer-key response shapes.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StudyRecordResponse {
    /// Section identity.
    pub(crate) item_id: i64,
    /// Chapter identity.
    pub(crate) node_id: i64,
    #[serde(rename = "pageStudyRecordDTOList", default)]
    pub(crate) pages: Vec<PageRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PageRecord {
    /// Matches local pages by relation id, never by stable page id.
    #[serde(rename = "pageid")]
    pub(crate) page_relation_id: i64,
    /// 0: incomplete, 1: complete.
    #[serde(default)]
    pub(crate) complete: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuestionAnswerResponse {
    #[serde(rename = "questionid")]
    pub(crate) question_id: i64,
    #[serde(rename = "correctAnswerList", default)]
    pub(crate) correct_answer_list: Vec<String>,
}
