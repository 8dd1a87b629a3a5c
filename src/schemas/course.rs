//! Course-level response shapes: course list, textbook list, the textbook
//! directory tree, and the two user-info payloads.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CourseListResponse {
    #[serde(default)]
    pub(crate) total: i64,
    #[serde(rename = "courseList", default)]
    pub(crate) course_list: Vec<CourseSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CourseSummary {
    pub(crate) id: i64,
    pub(crate) name: String,
    #[serde(rename = "classId")]
    pub(crate) class_id: i64,
    #[serde(rename = "classUserId")]
    pub(crate) class_user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TextbookListResponse {
    #[serde(default)]
    pub(crate) textbooks: Vec<TextbookSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TextbookSummary {
    /// Textbook identity; the remote service calls this `courseId`.
    #[serde(rename = "courseId")]
    pub(crate) textbook_id: i64,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) status: i64,
    #[serde(default)]
    pub(crate) limit: i64,
}

/// Nested chapter/item/page listing for one textbook.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TextbookDirectoryResponse {
    #[serde(rename = "courseid")]
    pub(crate) textbook_id: i64,
    #[serde(default)]
    pub(crate) chapters: Vec<DirectoryChapter>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DirectoryChapter {
    #[serde(rename = "nodeid")]
    pub(crate) chapter_id: i64,
    #[serde(rename = "nodetitle")]
    pub(crate) name: String,
    /// 0: visible, 1: hidden.
    #[serde(default)]
    pub(crate) hide: i64,
    #[serde(default)]
    pub(crate) items: Vec<DirectoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DirectoryItem {
    #[serde(rename = "itemid")]
    pub(crate) section_id: i64,
    #[serde(rename = "title")]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) hide: i64,
    #[serde(default)]
    pub(crate) coursepages: Vec<DirectoryPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DirectoryPage {
    #[serde(rename = "id")]
    pub(crate) page_id: i64,
    #[serde(rename = "relationid")]
    pub(crate) page_relation_id: i64,
    #[serde(rename = "title")]
    pub(crate) name: String,
    #[serde(rename = "contentType")]
    pub(crate) content_type: i64,
}

/// User payload carried in the login redirect's `USERINFO` cookie.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginUserInfo {
    pub(crate) authorization: String,
    #[serde(rename = "userId")]
    pub(crate) user_id: i64,
    pub(crate) name: String,
}

/// Learner profile from the ua host; `name` goes into report payloads.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserInfoResponse {
    pub(crate) userid: i64,
    pub(crate) name: String,
}
