//! Applies server study records onto the local tree.

use crate::core::errors::EngineError;
use crate::model::Course;
use crate::schemas::StudyRecordResponse;

/// Marks pages complete or incomplete from one section's study record.
///
/// Records address the tree by chapter (`node_id`) and section (`item_id`);
/// pages match by relation id only, so a page re-added to an assignment under
/// a fresh relation id counts as unstudied even though its stable id is known.
pub(crate) fn apply_study_record(
    course: &mut Course,
    textbook_id: i64,
    record: &StudyRecordResponse,
) -> Result<(), EngineError> {
    let textbook = course
        .textbooks
        .get_mut(&textbook_id)
        .ok_or(EngineError::Reconciliation { entity: "textbook", id: textbook_id })?;
    let chapter = textbook
        .chapters
        .get_mut(&record.node_id)
        .ok_or(EngineError::Reconciliation { entity: "chapter", id: record.node_id })?;
    let section = chapter
        .sections
        .get_mut(&record.item_id)
        .ok_or(EngineError::Reconciliation { entity: "section", id: record.item_id })?;

    for page_record in &record.pages {
        for page in section
            .pages
            .values_mut()
            .filter(|page| page.page_relation_id == page_record.page_relation_id)
        {
            page.is_complete = page_record.complete != 0;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::model::{Chapter, Page, Section, Textbook, CONTENT_TYPE_DOCUMENT};
    use crate::schemas::PageRecord;

    use super::*;

    fn page(page_id: i64, relation_id: i64) -> Page {
        Page {
            page_id,
            page_relation_id: relation_id,
            name: format!("page {page_id}"),
            content_type: CONTENT_TYPE_DOCUMENT,
            is_complete: false,
            elements: vec![],
        }
    }

    fn course_with_pages(pages: Vec<Page>) -> Course {
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
            course_id: 11,
            name: "Course".to_string(),
            class_id: 1,
            class_user_id: 2,
            textbooks: BTreeMap::new(),
        };
        course.textbooks.insert(21, textbook);
        course
    }

    fn record(pages: Vec<PageRecord>) -> StudyRecordResponse {
        StudyRecordResponse { item_id: 41, node_id: 31, pages }
    }

    #[test]
    fn completion_matches_by_relation_id_not_page_id() {
        let mut course = course_with_pages(vec![page(501, 9501), page(502, 9502)]);

        // 502 happens to collide with another page's stable id; only the
        // relation id may match.
        let record = record(vec![PageRecord { page_relation_id: 9501, complete: 1 }]);
        apply_study_record(&mut course, 21, &record).expect("apply");

        let pages = &course.textbooks[&21].chapters[&31].sections[&41].pages;
        assert!(pages[&501].is_complete);
        assert!(!pages[&502].is_complete);
    }

    #[test]
    fn zero_complete_clears_the_flag() {
        let mut course = course_with_pages(vec![page(501, 9501)]);
        if let Some(page) = course
            .textbooks
            .get_mut(&21)
            .and_then(|t| t.chapters.get_mut(&31))
            .and_then(|c| c.sections.get_mut(&41))
            .and_then(|s| s.pages.get_mut(&501))
        {
            page.is_complete = true;
        }

        let record = record(vec![PageRecord { page_relation_id: 9501, complete: 0 }]);
        apply_study_record(&mut course, 21, &record).expect("apply");

        assert!(!course.textbooks[&21].chapters[&31].sections[&41].pages[&501].is_complete);
    }

    #[test]
    fn unknown_chapter_reports_reconciliation_error() {
        let mut course = course_with_pages(vec![page(501, 9501)]);
        let record = StudyRecordResponse { item_id: 41, node_id: 999, pages: vec![] };

        match apply_study_record(&mut course, 21, &record) {
            Err(EngineError::Reconciliation { entity: "chapter", id: 999 }) => {}
            other => panic!("expected chapter reconciliation error, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_page_records_are_ignored() {
        let mut course = course_with_pages(vec![page(501, 9501)]);

        let record = record(vec![PageRecord { page_relation_id: 12345, complete: 1 }]);
        apply_study_record(&mut course, 21, &record).expect("apply");

        assert!(!course.textbooks[&21].chapters[&31].sections[&41].pages[&501].is_complete);
    }
}
