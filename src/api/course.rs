//! Courseware, study-record and report-sync calls.
//!
//! Handles are `Clone` over a shared client so fan-out tasks can each own one.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::api::urls::ApiUrls;
use crate::client::{RawResponse, RemoteClient};
use crate::core::errors::EngineError;
use crate::schemas::{
    self, ChapterDetailResponse, CourseListResponse, QuestionAnswerResponse, StudyRecordResponse,
    SyncStudyRecordRequest, TextbookDirectoryResponse, TextbookListResponse, UserInfoResponse,
};

// Refreshing completion server-side can take the better part of a minute.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(35);

#[derive(Clone)]
pub(crate) struct CourseApi {
    client: Arc<RemoteClient>,
    urls: ApiUrls,
}

impl CourseApi {
    pub(crate) fn new(client: Arc<RemoteClient>, urls: ApiUrls) -> Self {
        Self { client, urls }
    }

    pub(crate) async fn get_user_info(&self) -> Result<UserInfoResponse, EngineError> {
        let url = format!("{}/user", self.urls.api);
        let response = self.client.get(&url, &[]).await?;
        expect_ok(&response)?;
        schemas::parse_json(&response.body)
    }

    pub(crate) async fn list_courses(&self) -> Result<CourseListResponse, EngineError> {
        let url = format!("{}/courses/students", self.urls.course);
        let payload = json!({
            "keyword": "",
            "publishStatus": 1,
            "type": 1,
            "pn": 1,
            "ps": 999,
            "lang": "zh",
        });
        let response = self.client.post_json(&url, &[], payload).await?;
        expect_ok(&response)?;
        schemas::parse_json(&response.body)
    }

    pub(crate) async fn list_textbooks(
        &self,
        course_id: i64,
    ) -> Result<TextbookListResponse, EngineError> {
        let url = format!("{}/textbook/student/{}/list", self.urls.course, course_id);
        let response = self.client.get(&url, &[]).await?;
        expect_ok(&response)?;
        schemas::parse_json(&response.body)
    }

    pub(crate) async fn textbook_directory(
        &self,
        textbook_id: i64,
        class_id: i64,
    ) -> Result<TextbookDirectoryResponse, EngineError> {
        let url = format!("{}/course/stu/{}/directory", self.urls.api, textbook_id);
        let params = vec![("classId".to_string(), class_id.to_string())];
        let response = self.client.get(&url, &params).await?;
        expect_ok(&response)?;
        schemas::parse_json(&response.body)
    }

    pub(crate) async fn chapter_detail(
        &self,
        chapter_id: i64,
    ) -> Result<ChapterDetailResponse, EngineError> {
        let url = format!("{}/wholepage/chapter/stu/{}", self.urls.api, chapter_id);
        let response = self.client.get(&url, &[]).await?;
        expect_ok(&response)?;
        schemas::parse_json(&response.body)
    }

    /// `None` means the learner has not studied this section yet.
    pub(crate) async fn study_record(
        &self,
        section_id: i64,
    ) -> Result<Option<StudyRecordResponse>, EngineError> {
        let url = format!("{}/studyrecord/item/{}", self.urls.api, section_id);
        let response = self.client.get(&url, &[]).await?;
        expect_ok(&response)?;
        let body = response.body.trim();
        if body.is_empty() || body == "null" {
            return Ok(None);
        }
        schemas::parse_json(body).map(Some)
    }

    pub(crate) async fn question_answers(
        &self,
        question_id: i64,
        page_id: i64,
    ) -> Result<QuestionAnswerResponse, EngineError> {
        let url = format!("{}/questionAnswer/{}", self.urls.api, question_id);
        let params = vec![("parentId".to_string(), page_id.to_string())];
        let response = self.client.get(&url, &params).await?;
        expect_ok(&response)?;
        schemas::parse_json(&response.body)
    }

    /// Opens a study session for the section and returns the server-issued
    /// start timestamp, unix seconds.
    pub(crate) async fn initialize_section(&self, section_id: i64) -> Result<i64, EngineError> {
        let url = format!("{}/yws/api/personal/study/{}/init", self.urls.api, section_id);
        let response = self.client.get(&url, &[]).await?;
        expect_ok(&response)?;
        let body = response.body.trim();
        if let Ok(Value::Number(number)) = serde_json::from_str::<Value>(body) {
            if let Some(timestamp) = number.as_i64() {
                return Ok(timestamp);
            }
        }
        body.parse::<i64>()
            .map_err(|_| EngineError::Parse(format!("unexpected init response: {body}")))
    }

    pub(crate) async fn watch_video_ping(
        &self,
        class_id: i64,
        textbook_id: i64,
        chapter_id: i64,
        video_id: i64,
    ) -> Result<bool, EngineError> {
        let url = format!("{}/video/behavior/watch", self.urls.api);
        let params = vec![
            ("classId".to_string(), class_id.to_string()),
            ("courseId".to_string(), textbook_id.to_string()),
            ("chapterId".to_string(), chapter_id.to_string()),
            ("videoId".to_string(), video_id.to_string()),
        ];
        let response = self.client.get(&url, &params).await?;
        expect_ok(&response)?;
        Ok(response.body.trim().eq_ignore_ascii_case("true"))
    }

    pub(crate) async fn sync_study_record(
        &self,
        request: &SyncStudyRecordRequest,
    ) -> Result<bool, EngineError> {
        let url = format!("{}/yws/api/personal/sync", self.urls.api);
        let params = vec![
            ("courseType".to_string(), "4".to_string()),
            ("platform".to_string(), "PC".to_string()),
        ];
        let body = serde_json::to_value(request)
            .map_err(|err| EngineError::Parse(format!("failed to encode report: {err}")))?;
        let response = self.client.post_json(&url, &params, body).await?;
        expect_ok(&response)?;
        Ok(response.body.trim().eq_ignore_ascii_case("true"))
    }

    /// Asks the server to recompute completion for the whole textbook. Slow,
    /// hence the widened timeout.
    pub(crate) async fn refresh_textbook(
        &self,
        course_id: i64,
        textbook_id: i64,
    ) -> Result<bool, EngineError> {
        let url = format!("{}/studyrecord/refresh", self.urls.api);
        let params = vec![
            ("courseId".to_string(), course_id.to_string()),
            ("textbookId".to_string(), textbook_id.to_string()),
        ];
        let response = self.client.get_with_timeout(&url, &params, REFRESH_TIMEOUT).await?;
        expect_ok(&response)?;
        Ok(response.body.trim().eq_ignore_ascii_case("true"))
    }
}

fn expect_ok(response: &RawResponse) -> Result<(), EngineError> {
    match response.status {
        200 => Ok(()),
        401 | 403 => Err(EngineError::Auth(format!(
            "endpoint answered with status {}",
            response.status
        ))),
        status => Err(EngineError::Parse(format!("unexpected status {status}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> RawResponse {
        RawResponse { status, body: String::new(), set_cookies: vec![] }
    }

    #[test]
    fn auth_statuses_map_to_auth_errors() {
        assert!(matches!(expect_ok(&response(401)), Err(EngineError::Auth(_))));
        assert!(matches!(expect_ok(&response(403)), Err(EngineError::Auth(_))));
        assert!(matches!(expect_ok(&response(500)), Err(EngineError::Parse(_))));
        assert!(expect_ok(&response(200)).is_ok());
    }
}
