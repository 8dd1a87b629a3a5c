//! The study-record sync request, field names exactly as the remote service
//! expects them.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SyncStudyRecordRequest {
    /// Section identity.
    pub(crate) itemid: i64,
    #[serde(rename = "autoSave")]
    pub(crate) auto_save: i64,
    #[serde(rename = "withoutOld")]
    pub(crate) without_old: Option<i64>,
    pub(crate) complete: i64,
    /// Session start timestamp from the initialize call, unix seconds.
    #[serde(rename = "studyStartTime")]
    pub(crate) study_start_time: i64,
    #[serde(rename = "userName")]
    pub(crate) user_name: String,
    pub(crate) score: i64,
    #[serde(rename = "pageStudyRecordDTOList")]
    pub(crate) pages: Vec<PageStudyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PageStudyRecord {
    /// Relation id, not the stable page id.
    pub(crate) pageid: i64,
    pub(crate) complete: i64,
    #[serde(rename = "studyTime")]
    pub(crate) study_time: i64,
    pub(crate) score: i64,
    #[serde(rename = "answerTime")]
    pub(crate) answer_time: i64,
    #[serde(rename = "submitTimes")]
    pub(crate) submit_times: i64,
    /// Stable page id, set only when question records are present; the
    /// server uses it to distinguish the page by content identity.
    #[serde(rename = "coursepageId", skip_serializing_if = "Option::is_none")]
    pub(crate) coursepage_id: Option<i64>,
    pub(crate) questions: Vec<QuestionRecord>,
    pub(crate) videos: Vec<VideoRecord>,
    pub(crate) speaks: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct VideoRecord {
    pub(crate) videoid: i64,
    /// Playback position reached, seconds.
    pub(crate) current: f64,
    pub(crate) status: i64,
    #[serde(rename = "recordTime")]
    pub(crate) record_time: f64,
    /// Full video length, seconds.
    pub(crate) time: f64,
    #[serde(rename = "startEndTimeList")]
    pub(crate) start_end_times: Vec<StartEndTime>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StartEndTime {
    #[serde(rename = "startTime")]
    pub(crate) start_time: i64,
    #[serde(rename = "endTime")]
    pub(crate) end_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionRecord {
    pub(crate) questionid: i64,
    #[serde(rename = "answerList")]
    pub(crate) answer_list: Vec<String>,
    pub(crate) score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coursepage_id_is_omitted_when_absent() {
        let record = PageStudyRecord {
            pageid: 9501,
            complete: 1,
            study_time: 0,
            score: 0,
            answer_time: 1,
            submit_times: 0,
            coursepage_id: None,
            questions: vec![],
            videos: vec![],
            speaks: vec![],
        };

        let value = serde_json::to_value(&record).expect("serialize");
        assert!(value.get("coursepageId").is_none());
        assert_eq!(value["pageid"], 9501);
    }

    #[test]
    fn request_uses_remote_field_names() {
        let request = SyncStudyRecordRequest {
            itemid: 41,
            auto_save: 1,
            without_old: None,
            complete: 1,
            study_start_time: 1_700_000_000,
            user_name: "Learner".to_string(),
            score: 100,
            pages: vec![],
        };

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["studyStartTime"], 1_700_000_000);
        assert_eq!(value["userName"], "Learner");
        assert!(value["withoutOld"].is_null());
        assert!(value["pageStudyRecordDTOList"].as_array().expect("list").is_empty());
    }
}
