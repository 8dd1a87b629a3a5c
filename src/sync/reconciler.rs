//! Builds and enriches the local course tree from the remote catalogue.
//!
//! The tree is assembled in layers: the directory call yields chapters,
//! sections and page stubs; chapter details fill in typed elements; study
//! records mark completion; answer keys fill in question answers. Each layer
//! fans out concurrently and merges back into the tree, so a failure in one
//! branch degrades that branch only.

use std::collections::BTreeMap;

use tokio::task::JoinSet;

use crate::api::CourseApi;
use crate::core::config::SyncSettings;
use crate::core::errors::EngineError;
use crate::model::{
    Chapter, Course, Element, Page, Question, Section, Textbook, CONTENT_TYPE_DOCUMENT,
    CONTENT_TYPE_QUESTION, CONTENT_TYPE_VIDEO,
};
use crate::schemas::{
    ChapterDetailResponse, QuestionAnswerResponse, RawElement, TextbookDirectoryResponse,
};
use crate::sync::tracker;

/// Builds the course tree for the selected courses and textbooks, fully
/// enriched and with empty branches pruned away.
pub(crate) async fn configure(
    api: &CourseApi,
    selection: &SyncSettings,
) -> Result<BTreeMap<i64, Course>, EngineError> {
    let listing = api.list_courses().await?;
    tracing::info!(total = listing.total, "fetched course list");

    let mut courses = BTreeMap::new();
    for summary in listing.course_list {
        if !selection.course_ids.is_empty() && !selection.course_ids.contains(&summary.id) {
            continue;
        }
        courses.insert(
            summary.id,
            Course {
                course_id: summary.id,
                name: summary.name,
                class_id: summary.class_id,
                class_user_id: summary.class_user_id,
                textbooks: BTreeMap::new(),
            },
        );
    }

    for course in courses.values_mut() {
        let textbooks = match api.list_textbooks(course.course_id).await {
            Ok(listing) => listing.textbooks,
            Err(err) => {
                tracing::warn!(course_id = course.course_id, error = %err, "textbook list unavailable");
                continue;
            }
        };
        for summary in textbooks {
            if !selection.textbook_ids.is_empty()
                && !selection.textbook_ids.contains(&summary.textbook_id)
            {
                continue;
            }
            course.textbooks.insert(
                summary.textbook_id,
                Textbook {
                    textbook_id: summary.textbook_id,
                    name: summary.name,
                    status: summary.status,
                    limit: summary.limit,
                    chapters: BTreeMap::new(),
                },
            );
        }
    }

    enrich(api, &mut courses).await;

    for course in courses.values_mut() {
        course.prune(false);
    }
    courses.retain(|_, course| !course.textbooks.is_empty());
    Ok(courses)
}

async fn enrich(api: &CourseApi, courses: &mut BTreeMap<i64, Course>) {
    fetch_directories(api, courses).await;
    fetch_chapter_details(api, courses).await;
    refresh_completion(api, courses).await;
    fetch_answer_keys(api, courses).await;
}

async fn fetch_directories(api: &CourseApi, courses: &mut BTreeMap<i64, Course>) {
    let mut tasks = JoinSet::new();
    for course in courses.values() {
        for textbook_id in course.textbooks.keys().copied() {
            let api = api.clone();
            let course_id = course.course_id;
            let class_id = course.class_id;
            tasks.spawn(async move {
                (course_id, textbook_id, api.textbook_directory(textbook_id, class_id).await)
            });
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let Ok((course_id, textbook_id, outcome)) = joined else {
            tracing::warn!("directory fetch task aborted");
            continue;
        };
        match outcome {
            Ok(directory) => {
                if let Some(course) = courses.get_mut(&course_id) {
                    if let Err(err) = build_from_directory(course, &directory) {
                        tracing::warn!(textbook_id, error = %err, "directory merge failed");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(textbook_id, error = %err, "directory fetch failed");
            }
        }
    }
}

async fn fetch_chapter_details(api: &CourseApi, courses: &mut BTreeMap<i64, Course>) {
    let mut tasks = JoinSet::new();
    for course in courses.values() {
        for textbook in course.textbooks.values() {
            for chapter_id in textbook.chapters.keys().copied() {
                let api = api.clone();
                let course_id = course.course_id;
                let textbook_id = textbook.textbook_id;
                tasks.spawn(async move {
                    (course_id, textbook_id, api.chapter_detail(chapter_id).await)
                });
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let Ok((course_id, textbook_id, outcome)) = joined else {
            tracing::warn!("chapter fetch task aborted");
            continue;
        };
        match outcome {
            Ok(detail) => {
                if let Some(course) = courses.get_mut(&course_id) {
                    if let Err(err) = merge_chapter_detail(course, textbook_id, &detail) {
                        tracing::warn!(
                            chapter_id = detail.chapter_id,
                            error = %err,
                            "chapter merge failed"
                        );
                    }
                }
            }
            Err(err) => {
                tracing::warn!(textbook_id, error = %err, "chapter fetch failed");
            }
        }
    }
}

/// Re-pulls every section's study record and applies completion flags.
/// Records the server does not have yet, and records that no longer match the
/// tree, degrade to warnings.
pub(crate) async fn refresh_completion(api: &CourseApi, courses: &mut BTreeMap<i64, Course>) {
    let mut tasks = JoinSet::new();
    for course in courses.values() {
        for textbook in course.textbooks.values() {
            for chapter in textbook.chapters.values() {
                for section_id in chapter.sections.keys().copied() {
                    let api = api.clone();
                    let course_id = course.course_id;
                    let textbook_id = textbook.textbook_id;
                    tasks.spawn(async move {
                        (course_id, textbook_id, section_id, api.study_record(section_id).await)
                    });
                }
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let Ok((course_id, textbook_id, section_id, outcome)) = joined else {
            tracing::warn!("study record task aborted");
            continue;
        };
        match outcome {
            Ok(Some(record)) => {
                if let Some(course) = courses.get_mut(&course_id) {
                    if let Err(err) = tracker::apply_study_record(course, textbook_id, &record) {
                        tracing::warn!(section_id, error = %err, "study record mismatch");
                    }
                }
            }
            // No record yet: the section has never been studied.
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(section_id, error = %err, "study record fetch failed");
            }
        }
    }
}

async fn fetch_answer_keys(api: &CourseApi, courses: &mut BTreeMap<i64, Course>) {
    let mut tasks = JoinSet::new();
    for course in courses.values() {
        for textbook in course.textbooks.values() {
            for chapter in textbook.chapters.values() {
                for section in chapter.sections.values() {
                    for page in section.pages.values() {
                        for element in &page.elements {
                            let Element::Question { questions } = element else { continue };
                            for question in questions {
                                let api = api.clone();
                                let course_id = course.course_id;
                                let page_id = page.page_id;
                                let question_id = question.question_id;
                                tasks.spawn(async move {
                                    (
                                        course_id,
                                        page_id,
                                        api.question_answers(question_id, page_id).await,
                                    )
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let Ok((course_id, page_id, outcome)) = joined else {
            tracing::warn!("answer key task aborted");
            continue;
        };
        match outcome {
            Ok(answer) => {
                if let Some(course) = courses.get_mut(&course_id) {
                    apply_answer_key_to_course(course, page_id, &answer);
                }
            }
            // Pages without an answer key still get reported, with empty
            // answer lists.
            Err(err) => {
                tracing::warn!(page_id, error = %err, "answer key unavailable");
            }
        }
    }
}

/// Fills chapters, sections and page stubs under an already known textbook.
/// Hidden chapters and sections never enter the tree.
pub(crate) fn build_from_directory(
    course: &mut Course,
    directory: &TextbookDirectoryResponse,
) -> Result<(), EngineError> {
    let textbook = course
        .textbooks
        .get_mut(&directory.textbook_id)
        .ok_or(EngineError::Reconciliation { entity: "textbook", id: directory.textbook_id })?;

    for raw_chapter in &directory.chapters {
        if raw_chapter.hide == 1 {
            continue;
        }
        let chapter = textbook.chapters.entry(raw_chapter.chapter_id).or_insert_with(|| Chapter {
            chapter_id: raw_chapter.chapter_id,
            name: raw_chapter.name.clone(),
            sections: BTreeMap::new(),
        });

        for raw_section in &raw_chapter.items {
            if raw_section.hide == 1 {
                continue;
            }
            let section = chapter.sections.entry(raw_section.section_id).or_insert_with(|| {
                Section {
                    section_id: raw_section.section_id,
                    name: raw_section.name.clone(),
                    pages: BTreeMap::new(),
                }
            });

            for raw_page in &raw_section.coursepages {
                section.pages.entry(raw_page.page_id).or_insert_with(|| Page {
                    page_id: raw_page.page_id,
                    page_relation_id: raw_page.page_relation_id,
                    name: raw_page.name.clone(),
                    content_type: raw_page.content_type,
                    is_complete: false,
                    elements: vec![],
                });
            }
        }
    }

    Ok(())
}

/// Replaces element lists on pages already present in the tree. Sections and
/// pages the directory never produced (hidden ones included) are skipped.
/// Re-merging the same detail is a no-op.
pub(crate) fn merge_chapter_detail(
    course: &mut Course,
    textbook_id: i64,
    detail: &ChapterDetailResponse,
) -> Result<(), EngineError> {
    let textbook = course
        .textbooks
        .get_mut(&textbook_id)
        .ok_or(EngineError::Reconciliation { entity: "textbook", id: textbook_id })?;
    let chapter = textbook
        .chapters
        .get_mut(&detail.chapter_id)
        .ok_or(EngineError::Reconciliation { entity: "chapter", id: detail.chapter_id })?;

    for item in &detail.items {
        let Some(section) = chapter.sections.get_mut(&item.section_id) else { continue };
        for raw_page in &item.pages {
            let Some(page) = section.pages.get_mut(&raw_page.page_id) else { continue };
            page.elements.clear();
            for raw_element in &raw_page.elements {
                match classify_element(page.content_type, raw_element) {
                    Some(element) => page.elements.push(element),
                    None => {
                        tracing::warn!(
                            page_id = page.page_id,
                            content_type = page.content_type,
                            type_code = raw_element.type_code,
                            "element type not recognized, dropped"
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Element classification over (page content type, element type code). Codes
/// outside the known set yield `None`.
fn classify_element(content_type: i64, raw: &RawElement) -> Option<Element> {
    match (content_type, raw.type_code) {
        (CONTENT_TYPE_DOCUMENT, 10) => {
            Some(Element::Document { content: raw.content.clone().unwrap_or_default() })
        }
        (CONTENT_TYPE_DOCUMENT, 12) => {
            Some(Element::Content { content: raw.content.clone().unwrap_or_default() })
        }
        (CONTENT_TYPE_VIDEO, 4) => Some(Element::Video {
            video_id: raw.resource_id?,
            video_length: raw.video_length?,
        }),
        (CONTENT_TYPE_QUESTION, 6) => Some(Element::Question {
            questions: raw
                .questions
                .iter()
                .map(|question| Question {
                    question_id: question.question_id,
                    score: question.score as i64,
                    content: question.title.clone(),
                    answer_list: vec![],
                })
                .collect(),
        }),
        _ => None,
    }
}

pub(crate) fn apply_answer_key(question: &mut Question, answer: &QuestionAnswerResponse) {
    question.answer_list = answer.correct_answer_list.clone();
}

fn apply_answer_key_to_course(course: &mut Course, page_id: i64, answer: &QuestionAnswerResponse) {
    for textbook in course.textbooks.values_mut() {
        for chapter in textbook.chapters.values_mut() {
            for section in chapter.sections.values_mut() {
                let Some(page) = section.pages.get_mut(&page_id) else { continue };
                for element in &mut page.elements {
                    let Element::Question { questions } = element else { continue };
                    for question in questions {
                        if question.question_id == answer.question_id {
                            apply_answer_key(question, answer);
                        }
                    }
                }
            }
        }
    }
}
