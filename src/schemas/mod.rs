mod chapter;
mod course;
mod record;
mod sync;

use serde::de::DeserializeOwned;

use crate::core::errors::EngineError;

pub(crate) use chapter::{ChapterDetailResponse, ChapterItem, ChapterPage, RawElement, RawQuestion};
pub(crate) use course::{
    CourseListResponse, DirectoryChapter, DirectoryItem, DirectoryPage, LoginUserInfo,
    TextbookDirectoryResponse, TextbookListResponse, UserInfoResponse,
};
pub(crate) use record::{PageRecord, QuestionAnswerResponse, StudyRecordResponse};
pub(crate) use sync::{
    PageStudyRecord, QuestionRecord, StartEndTime, SyncStudyRecordRequest, VideoRecord,
};

/// Deserialize a response body, tolerating extra and unknown fields. A
/// failure is logged and surfaced as [`EngineError::Parse`], which callers
/// treat as the call having returned no data.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, EngineError> {
    serde_json::from_str(body).map_err(|err| {
        tracing::warn!(error = %err, "response body failed schema validation");
        tracing::debug!(body, "unparseable response body");
        EngineError::Parse(err.to_string())
    })
}
