//! Builds synthetic study reports for a section.
//!
//! The first pass registers every page with zero study time so the server
//! creates its records; the second pass fills in realistic durations, video
//! playback traces and question answers. Randomness and the clock are
//! injected so report generation stays deterministic under test.

use rand::Rng;

use crate::core::config::{MinMaxSeconds, StudyTimeSettings};
use crate::core::errors::EngineError;
use crate::model::{
    Element, Page, Section, CONTENT_TYPE_DOCUMENT, CONTENT_TYPE_QUESTION, CONTENT_TYPE_VIDEO,
};
use crate::schemas::{
    PageStudyRecord, QuestionRecord, StartEndTime, SyncStudyRecordRequest, VideoRecord,
};

/// Hard ceiling on any reported per-page duration, seconds.
const MAX_STUDY_TIME: i64 = 3600;

pub(crate) fn build_report(
    study_start_time: i64,
    section: &Section,
    user_name: &str,
    timing: &StudyTimeSettings,
    first_pass: bool,
    now_unix: f64,
    rng: &mut impl Rng,
) -> Result<SyncStudyRecordRequest, EngineError> {
    let mut pages = Vec::with_capacity(section.pages.len());

    for page in section.pages.values() {
        let record = if first_pass {
            Some(registration_record(page))
        } else {
            study_record(page, timing, now_unix, rng)?
        };
        if let Some(record) = record {
            pages.push(record);
        }
    }

    Ok(SyncStudyRecordRequest {
        itemid: section.section_id,
        auto_save: 1,
        without_old: None,
        complete: 1,
        study_start_time,
        user_name: user_name.to_string(),
        score: 100,
        pages,
    })
}

/// First-pass record: announce the page, claim nothing.
fn registration_record(page: &Page) -> PageStudyRecord {
    PageStudyRecord {
        pageid: page.page_relation_id,
        complete: 1,
        study_time: 0,
        score: 0,
        answer_time: 1,
        submit_times: 0,
        coursepage_id: None,
        questions: vec![],
        videos: vec![],
        speaks: vec![],
    }
}

fn study_record(
    page: &Page,
    timing: &StudyTimeSettings,
    now_unix: f64,
    rng: &mut impl Rng,
) -> Result<Option<PageStudyRecord>, EngineError> {
    let mut record = registration_record(page);

    match page.content_type {
        CONTENT_TYPE_DOCUMENT => {
            let bucket = document_bucket(page, timing)?;
            record.study_time = random_duration(bucket, page.elements.len(), rng);
            record.score = 100;
        }
        CONTENT_TYPE_VIDEO => {
            let (study_time, videos) = video_records(page, now_unix, rng)?;
            record.study_time = study_time;
            record.score = 100;
            record.videos = videos;
        }
        CONTENT_TYPE_QUESTION => {
            let (score, questions) = question_records(page)?;
            // One draw regardless of how many question blocks the page holds.
            record.study_time = random_duration(timing.question, 1, rng);
            record.score = score;
            record.questions = questions;
        }
        other => {
            tracing::warn!(
                page_id = page.page_id,
                content_type = other,
                "unknown content type, page not reported"
            );
            return Ok(None);
        }
    }

    if !record.questions.is_empty() {
        record.coursepage_id = Some(page.page_id);
    }

    Ok(Some(record))
}

/// Document pages hold plain content blocks, reading-material blocks, or a
/// mix; the mix studies at the reading-material pace.
fn document_bucket(
    page: &Page,
    timing: &StudyTimeSettings,
) -> Result<MinMaxSeconds, EngineError> {
    let mut has_document = false;
    for element in &page.elements {
        match element {
            Element::Document { .. } => has_document = true,
            Element::Content { .. } => {}
            other => {
                return Err(EngineError::invariant(format!(
                    "document page {} holds a non-text element {other:?}",
                    page.page_id
                )));
            }
        }
    }
    Ok(if has_document { timing.document } else { timing.content })
}

/// Scales with the raw element count: a page stripped of all its elements
/// reports zero seconds.
fn random_duration(bucket: MinMaxSeconds, element_count: usize, rng: &mut impl Rng) -> i64 {
    let per_element = rng.gen_range(bucket.min..=bucket.max) as i64;
    let total = per_element.saturating_mul(element_count as i64);
    total.min(MAX_STUDY_TIME)
}

fn video_records(
    page: &Page,
    now_unix: f64,
    rng: &mut impl Rng,
) -> Result<(i64, Vec<VideoRecord>), EngineError> {
    let mut study_time = 0i64;
    let mut videos = Vec::with_capacity(page.elements.len());

    for element in &page.elements {
        let (video_id, video_length) = match element {
            Element::Video { video_id, video_length } => (*video_id, *video_length),
            other => {
                return Err(EngineError::invariant(format!(
                    "video page {} holds a non-video element {other:?}",
                    page.page_id
                )));
            }
        };

        // Unlike the randomized buckets, the video sum is not capped: it
        // mirrors real playback length.
        study_time = study_time.saturating_add(video_length);

        // Stop a few seconds short of the end, like a real player would.
        let watched = video_length as f64 - rng.gen_range(2.0..=8.0);
        let start = now_unix as i64;
        let end = start + watched.round() as i64;

        videos.push(VideoRecord {
            videoid: video_id,
            current: watched,
            status: 1,
            record_time: watched,
            time: video_length as f64,
            start_end_times: vec![StartEndTime { start_time: start, end_time: end }],
        });
    }

    Ok((study_time, videos))
}

fn question_records(page: &Page) -> Result<(i64, Vec<QuestionRecord>), EngineError> {
    let mut score = 0i64;
    let mut records = Vec::new();

    for element in &page.elements {
        let questions = match element {
            Element::Question { questions } => questions,
            other => {
                return Err(EngineError::invariant(format!(
                    "question page {} holds a non-question element {other:?}",
                    page.page_id
                )));
            }
        };
        for question in questions {
            score = score.saturating_add(question.score);
            records.push(QuestionRecord {
                questionid: question.question_id,
                answer_list: question.answer_list.clone(),
                score: question.score,
            });
        }
    }

    Ok((score, records))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::model::Question;

    use super::*;

    fn timing() -> StudyTimeSettings {
        StudyTimeSettings {
            document: MinMaxSeconds { min: 180, max: 360 },
            content: MinMaxSeconds { min: 60, max: 120 },
            question: MinMaxSeconds { min: 180, max: 360 },
        }
    }

    fn section_with(page: Page) -> Section {
        let mut pages = BTreeMap::new();
        pages.insert(page.page_id, page);
        Section { section_id: 41, name: "Section".to_string(), pages }
    }

    fn page(content_type: i64, elements: Vec<Element>) -> Page {
        Page {
            page_id: 501,
            page_relation_id: 9501,
            name: "page".to_string(),
            content_type,
            is_complete: false,
            elements,
        }
    }

    fn report(section: &Section, first_pass: bool) -> SyncStudyRecordRequest {
        let mut rng = StdRng::seed_from_u64(7);
        build_report(1_700_000_000, section, "Learner", &timing(), first_pass, 1_700_000_100.0, &mut rng)
            .expect("report")
    }

    #[test]
    fn first_pass_reports_zero_study_time_for_every_page() {
        let section = section_with(page(
            CONTENT_TYPE_VIDEO,
            vec![Element::Video { video_id: 7, video_length: 600 }],
        ));

        let request = report(&section, true);

        assert_eq!(request.itemid, 41);
        assert_eq!(request.pages.len(), 1);
        assert_eq!(request.pages[0].study_time, 0);
        assert_eq!(request.pages[0].score, 0);
        assert!(request.pages[0].videos.is_empty());
    }

    #[test]
    fn document_duration_scales_with_elements_and_caps_at_an_hour() {
        let elements = vec![
            Element::Document { content: "a".to_string() },
            Element::Document { content: "b".to_string() },
            Element::Document { content: "c".to_string() },
        ];
        let section = section_with(page(CONTENT_TYPE_DOCUMENT, elements));

        let request = report(&section, false);
        let study_time = request.pages[0].study_time;

        assert!(study_time >= 180 * 3);
        assert!(study_time <= 3600.min(360 * 3));
        assert_eq!(request.pages[0].score, 100);
    }

    #[test]
    fn page_with_no_elements_left_reports_zero_seconds() {
        // The state a page ends up in after every element was dropped as
        // unrecognized during the merge.
        let section = section_with(page(CONTENT_TYPE_DOCUMENT, vec![]));

        let request = report(&section, false);

        assert_eq!(request.pages[0].study_time, 0);
    }

    #[test]
    fn video_sum_is_not_capped_at_an_hour() {
        let section = section_with(page(
            CONTENT_TYPE_VIDEO,
            vec![
                Element::Video { video_id: 7, video_length: 3000 },
                Element::Video { video_id: 8, video_length: 3000 },
            ],
        ));

        let request = report(&section, false);

        assert_eq!(request.pages[0].study_time, 6000);
        assert_eq!(request.pages[0].videos.len(), 2);
    }

    #[test]
    fn pure_content_pages_use_the_content_bucket() {
        let section = section_with(page(
            CONTENT_TYPE_DOCUMENT,
            vec![Element::Content { content: "text".to_string() }],
        ));

        let request = report(&section, false);
        let study_time = request.pages[0].study_time;

        assert!((60..=120).contains(&study_time));
    }

    #[test]
    fn video_record_watches_almost_to_the_end() {
        let section = section_with(page(
            CONTENT_TYPE_VIDEO,
            vec![Element::Video { video_id: 7, video_length: 600 }],
        ));

        let request = report(&section, false);
        let record = &request.pages[0];

        assert_eq!(record.study_time, 600);
        assert_eq!(record.score, 100);
        let video = &record.videos[0];
        assert_eq!(video.time, 600.0);
        assert!(video.current >= 592.0 && video.current <= 598.0);
        let window = &video.start_end_times[0];
        assert_eq!(window.end_time - window.start_time, video.current.round() as i64);
    }

    #[test]
    fn question_page_sums_scores_and_carries_answers() {
        let questions = vec![
            Question {
                question_id: 601,
                score: 40,
                content: "Q1".to_string(),
                answer_list: vec!["A".to_string()],
            },
            Question {
                question_id: 602,
                score: 60,
                content: "Q2".to_string(),
                answer_list: vec!["B".to_string(), "C".to_string()],
            },
        ];
        let section = section_with(page(CONTENT_TYPE_QUESTION, vec![Element::Question { questions }]));

        let request = report(&section, false);
        let record = &request.pages[0];

        assert_eq!(record.score, 100);
        assert!((180..=360).contains(&record.study_time));
        assert_eq!(record.questions.len(), 2);
        assert_eq!(record.questions[1].answer_list, vec!["B", "C"]);
        assert_eq!(record.coursepage_id, Some(501));
    }

    #[test]
    fn mismatched_element_fails_the_section() {
        let section = section_with(page(
            CONTENT_TYPE_VIDEO,
            vec![Element::Document { content: "not a video".to_string() }],
        ));

        let mut rng = StdRng::seed_from_u64(7);
        let result = build_report(
            1_700_000_000,
            &section,
            "Learner",
            &timing(),
            false,
            1_700_000_100.0,
            &mut rng,
        );

        assert!(matches!(result, Err(EngineError::Invariant(_))));
    }

    #[test]
    fn unknown_content_type_is_skipped_not_fatal() {
        let section = section_with(page(99, vec![]));

        let request = report(&section, false);

        assert!(request.pages.is_empty());
    }
}
