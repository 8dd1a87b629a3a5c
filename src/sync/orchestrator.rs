//! Drives the two-pass sync for every selected textbook.
//!
//! Each textbook moves through a fixed phase sequence: a first pass that
//! registers every page, a server-side completion refresh, then a second pass
//! that submits the synthetic study reports. A failed textbook is abandoned
//! and the run continues with the next one.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::thread_rng;
use tokio::task::JoinSet;
use tokio::time::sleep;

use crate::api::CourseApi;
use crate::core::config::{Settings, StudyTimeSettings};
use crate::core::errors::EngineError;
use crate::core::time::{unix_now, unix_now_f64};
use crate::model::{Course, Element, Section, Textbook, CONTENT_TYPE_VIDEO};
use crate::sync::{reconciler, simulator};

const SUBMIT_ATTEMPTS: u32 = 3;
const SUBMIT_RETRY_DELAY: Duration = Duration::from_secs(1);
const VIDEO_PING_PACING: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncPhase {
    Init,
    FirstPass,
    Refresh,
    SecondPass,
    Done,
    Failed,
}

pub(crate) struct SyncOrchestrator {
    api: CourseApi,
    timing: StudyTimeSettings,
    cooldown: Duration,
}

impl SyncOrchestrator {
    pub(crate) fn new(api: CourseApi, settings: &Settings) -> Self {
        Self {
            api,
            timing: settings.study_time().clone(),
            cooldown: Duration::from_secs_f64(settings.sync().cooldown_seconds),
        }
    }

    /// Runs both passes over every textbook, then refreshes completion and
    /// prunes finished content. Only an authentication failure on the user
    /// lookup aborts the whole run.
    pub(crate) async fn run(
        &self,
        courses: &mut BTreeMap<i64, Course>,
    ) -> Result<(), EngineError> {
        // Only uncompleted leaves are walked; anything already complete is
        // dropped up front along with the containers it empties.
        prune_completed(courses);
        if courses.is_empty() {
            tracing::info!("everything is already complete");
            return Ok(());
        }

        let user = self.api.get_user_info().await?;
        tracing::info!(user_id = user.userid, name = %user.name, "starting sync run");

        for course in courses.values() {
            for textbook in course.textbooks.values() {
                self.run_textbook(course.class_id, course.course_id, textbook, &user.name).await;
            }
        }

        reconciler::refresh_completion(&self.api, courses).await;
        for course in courses.values_mut() {
            course.prune(true);
        }
        courses.retain(|_, course| !course.textbooks.is_empty());

        for course in courses.values() {
            tracing::warn!(
                course_id = course.course_id,
                name = %course.name,
                "content remains incomplete after sync"
            );
        }

        Ok(())
    }

    async fn run_textbook(&self, class_id: i64, course_id: i64, textbook: &Textbook, user_name: &str) {
        let mut phase = SyncPhase::Init;

        while phase != SyncPhase::Done && phase != SyncPhase::Failed {
            phase = match phase {
                SyncPhase::Init => {
                    tracing::info!(
                        textbook_id = textbook.textbook_id,
                        name = %textbook.name,
                        "syncing textbook"
                    );
                    SyncPhase::FirstPass
                }
                SyncPhase::FirstPass => {
                    match self.process_pass(class_id, textbook, user_name, true).await {
                        Ok(()) => SyncPhase::Refresh,
                        Err(err) => {
                            tracing::error!(
                                textbook_id = textbook.textbook_id,
                                error = %err,
                                "first pass failed"
                            );
                            SyncPhase::Failed
                        }
                    }
                }
                SyncPhase::Refresh => {
                    // The server recomputes completion for the whole
                    // textbook; this regularly takes half a minute.
                    tracing::info!(textbook_id = textbook.textbook_id, "refreshing study records");
                    match self.api.refresh_textbook(course_id, textbook.textbook_id).await {
                        Ok(true) => {}
                        Ok(false) => {
                            tracing::warn!(
                                textbook_id = textbook.textbook_id,
                                "refresh was not acknowledged"
                            );
                        }
                        Err(err) => {
                            tracing::warn!(
                                textbook_id = textbook.textbook_id,
                                error = %err,
                                "refresh failed"
                            );
                        }
                    }
                    SyncPhase::SecondPass
                }
                SyncPhase::SecondPass => {
                    match self.process_pass(class_id, textbook, user_name, false).await {
                        Ok(()) => SyncPhase::Done,
                        Err(err) => {
                            tracing::error!(
                                textbook_id = textbook.textbook_id,
                                error = %err,
                                "second pass failed"
                            );
                            SyncPhase::Failed
                        }
                    }
                }
                SyncPhase::Done | SyncPhase::Failed => phase,
            };
        }

        if phase == SyncPhase::Done {
            tracing::info!(textbook_id = textbook.textbook_id, "textbook synced");
        }
    }

    async fn process_pass(
        &self,
        class_id: i64,
        textbook: &Textbook,
        user_name: &str,
        first_pass: bool,
    ) -> Result<(), EngineError> {
        for chapter in textbook.chapters.values() {
            for section in chapter.sections.values() {
                let start = match self.api.initialize_section(section.section_id).await {
                    // Some deployments answer the init call with 0.
                    Ok(0) => unix_now(),
                    Ok(start) => start,
                    Err(err @ EngineError::Auth(_)) => return Err(err),
                    Err(err) => {
                        tracing::warn!(
                            section_id = section.section_id,
                            error = %err,
                            "section init failed, skipping"
                        );
                        continue;
                    }
                };

                if !first_pass {
                    self.ping_videos(class_id, textbook.textbook_id, chapter.chapter_id, section)
                        .await;
                }

                self.submit_report(start, section, user_name, first_pass).await;

                if !first_pass {
                    sleep(self.cooldown).await;
                }
            }
        }
        Ok(())
    }

    /// The server expects a watch beacon per video before it accepts playback
    /// in the study report. Beacons are fired concurrently; the pacing sleep
    /// applies per video as results come back.
    async fn ping_videos(&self, class_id: i64, textbook_id: i64, chapter_id: i64, section: &Section) {
        let mut beacons = JoinSet::new();
        for page in section.pages.values() {
            if page.content_type != CONTENT_TYPE_VIDEO {
                continue;
            }
            for element in &page.elements {
                let Element::Video { video_id, .. } = element else { continue };
                let api = self.api.clone();
                let video_id = *video_id;
                beacons.spawn(async move {
                    (video_id, api.watch_video_ping(class_id, textbook_id, chapter_id, video_id).await)
                });
            }
        }

        while let Some(joined) = beacons.join_next().await {
            let Ok((video_id, outcome)) = joined else {
                tracing::warn!("watch beacon task aborted");
                continue;
            };
            match outcome {
                Ok(true) => tracing::debug!(video_id, "watch beacon accepted"),
                Ok(false) => tracing::warn!(video_id, "watch beacon rejected"),
                Err(err) => tracing::warn!(video_id, error = %err, "watch beacon failed"),
            }
            sleep(VIDEO_PING_PACING).await;
        }
    }

    async fn submit_report(
        &self,
        study_start_time: i64,
        section: &Section,
        user_name: &str,
        first_pass: bool,
    ) {
        for attempt in 1..=SUBMIT_ATTEMPTS {
            let report = {
                let mut rng = thread_rng();
                simulator::build_report(
                    study_start_time,
                    section,
                    user_name,
                    &self.timing,
                    first_pass,
                    unix_now_f64(),
                    &mut rng,
                )
            };

            let request = match report {
                Ok(request) => request,
                Err(err) => {
                    // A malformed tree will not fix itself between attempts.
                    tracing::warn!(
                        section_id = section.section_id,
                        error = %err,
                        "report generation failed"
                    );
                    return;
                }
            };

            match self.api.sync_study_record(&request).await {
                Ok(true) => {
                    metrics::counter!("coursesync_reports_submitted_total").increment(1);
                    tracing::info!(
                        section_id = section.section_id,
                        first_pass,
                        "study report accepted"
                    );
                    return;
                }
                Ok(false) => {
                    tracing::warn!(section_id = section.section_id, attempt, "report rejected");
                }
                Err(err) => {
                    tracing::warn!(
                        section_id = section.section_id,
                        attempt,
                        error = %err,
                        "report submission failed"
                    );
                }
            }

            if attempt < SUBMIT_ATTEMPTS {
                sleep(SUBMIT_RETRY_DELAY).await;
            }
        }

        metrics::counter!("coursesync_reports_failed_total").increment(1);
        tracing::warn!(section_id = section.section_id, "giving up on section report");
    }
}

fn prune_completed(courses: &mut BTreeMap<i64, Course>) {
    for course in courses.values_mut() {
        course.prune(true);
    }
    courses.retain(|_, course| !course.textbooks.is_empty());
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::api::ApiUrls;
    use crate::client::{
        RawResponse, RemoteClient, Transport, TransportFailure, TransportRequest,
    };
    use crate::core::config::{MinMaxSeconds, Site};
    use crate::model::{Chapter, Page, Question, Textbook, CONTENT_TYPE_QUESTION};

    use super::*;

    fn page(page_id: i64, content_type: i64, is_complete: bool, elements: Vec<Element>) -> Page {
        Page {
            page_id,
            page_relation_id: page_id + 9000,
            name: format!("page {page_id}"),
            content_type,
            is_complete,
            elements,
        }
    }

    fn course_with(course_id: i64, pages: Vec<Page>) -> Course {
        let mut section =
            Section { section_id: 41, name: "Section".to_string(), pages: BTreeMap::new() };
        for page in pages {
            section.pages.insert(page.page_id, page);
        }
        let mut chapter =
            Chapter { chapter_id: 31, name: "Chapter".to_string(), sections: BTreeMap::new() };
        chapter.sections.insert(41, section);
        let mut textbook = Textbook {
            textbook_id: 21,
            name: "Textbook".to_string(),
            status: 1,
            limit: 0,
            chapters: BTreeMap::new(),
        };
        textbook.chapters.insert(31, chapter);
        let mut course = Course {
            course_id,
            name: format!("Course {course_id}"),
            class_id: 1,
            class_user_id: 2,
            textbooks: BTreeMap::new(),
        };
        course.textbooks.insert(21, textbook);
        course
    }

    #[test]
    fn completed_pages_are_dropped_before_the_walk() {
        let question = Element::Question {
            questions: vec![Question {
                question_id: 601,
                score: 100,
                content: "Q".to_string(),
                answer_list: vec![],
            }],
        };
        let mut courses = BTreeMap::new();
        courses.insert(11, course_with(11, vec![page(501, CONTENT_TYPE_VIDEO, true, vec![])]));
        courses.insert(
            12,
            course_with(
                12,
                vec![
                    page(502, CONTENT_TYPE_QUESTION, true, vec![]),
                    page(503, CONTENT_TYPE_QUESTION, false, vec![question]),
                ],
            ),
        );

        prune_completed(&mut courses);

        // The fully-completed course cascades away entirely.
        assert!(!courses.contains_key(&11));
        let pages = &courses[&12].textbooks[&21].chapters[&31].sections[&41].pages;
        assert_eq!(pages.len(), 1);
        assert!(pages.contains_key(&503));
    }

    struct RecordingTransport {
        urls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn execute(
            &self,
            request: TransportRequest,
        ) -> Result<RawResponse, TransportFailure> {
            self.urls.lock().expect("lock").push(request.url);
            Ok(RawResponse { status: 200, body: "true".to_string(), set_cookies: vec![] })
        }
    }

    fn orchestrator_with(urls: Arc<Mutex<Vec<String>>>) -> SyncOrchestrator {
        let transport = RecordingTransport { urls };
        let client =
            Arc::new(RemoteClient::new(Box::new(transport), Duration::from_secs(8)));
        let api = CourseApi::new(client, ApiUrls::for_site(Site::Ulearning));
        let range = MinMaxSeconds { min: 180, max: 360 };
        SyncOrchestrator {
            api,
            timing: StudyTimeSettings { document: range, content: range, question: range },
            cooldown: Duration::from_secs(0),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn watch_beacons_cover_every_video_in_the_section() {
        let urls = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = orchestrator_with(urls.clone());

        let mut section =
            Section { section_id: 41, name: "Section".to_string(), pages: BTreeMap::new() };
        let videos = vec![
            Element::Video { video_id: 7, video_length: 600 },
            Element::Video { video_id: 8, video_length: 300 },
        ];
        section.pages.insert(501, page(501, CONTENT_TYPE_VIDEO, false, videos));
        section.pages.insert(
            502,
            page(502, CONTENT_TYPE_VIDEO, false, vec![Element::Video { video_id: 9, video_length: 60 }]),
        );

        orchestrator.ping_videos(1, 21, 31, &section).await;

        let seen = urls.lock().expect("lock");
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|url| url.ends_with("/video/behavior/watch")));
    }
}
