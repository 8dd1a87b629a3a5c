use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Page content types as the remote service encodes them. A page carries
/// exactly one; unknown codes may appear and are kept in the tree but never
/// simulated.
pub(crate) const CONTENT_TYPE_DOCUMENT: i64 = 5; // document or plain text
pub(crate) const CONTENT_TYPE_VIDEO: i64 = 6;
pub(crate) const CONTENT_TYPE_QUESTION: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Question {
    pub(crate) question_id: i64,
    pub(crate) score: i64,
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) answer_list: Vec<String>,
}

/// Typed content unit inside a page. Closed set, discriminated during
/// reconciliation by the page content type and the remote element type code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Element {
    Video { video_id: i64, video_length: i64 },
    Question { questions: Vec<Question> },
    Document { content: String },
    Content { content: String },
}

/// A displayable screen within a section.
///
/// `page_id` is the stable content identity used for local lookups and
/// deletion; `page_relation_id` is the per-assignment identity the remote
/// service uses in study-record matching and report submission. They are
/// never interchangeable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Page {
    pub(crate) page_id: i64,
    pub(crate) page_relation_id: i64,
    pub(crate) name: String,
    pub(crate) content_type: i64,
    #[serde(default)]
    pub(crate) is_complete: bool,
    #[serde(default)]
    pub(crate) elements: Vec<Element>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Section {
    pub(crate) section_id: i64,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) pages: BTreeMap<i64, Page>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Chapter {
    pub(crate) chapter_id: i64,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) sections: BTreeMap<i64, Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Textbook {
    pub(crate) textbook_id: i64,
    pub(crate) name: String,
    pub(crate) status: i64,
    pub(crate) limit: i64,
    #[serde(default)]
    pub(crate) chapters: BTreeMap<i64, Chapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Course {
    pub(crate) course_id: i64,
    pub(crate) name: String,
    pub(crate) class_id: i64,
    pub(crate) class_user_id: i64,
    #[serde(default)]
    pub(crate) textbooks: BTreeMap<i64, Textbook>,
}

impl Section {
    fn prune_complete(&mut self) {
        self.pages.retain(|_, page| !page.is_complete);
    }
}

impl Chapter {
    pub(crate) fn prune(&mut self, remove_complete: bool) {
        for section in self.sections.values_mut() {
            if remove_complete {
                section.prune_complete();
            }
        }
        self.sections.retain(|_, section| !section.pages.is_empty());
    }
}

impl Textbook {
    pub(crate) fn prune(&mut self, remove_complete: bool) {
        for chapter in self.chapters.values_mut() {
            chapter.prune(remove_complete);
        }
        self.chapters.retain(|_, chapter| !chapter.sections.is_empty());
    }
}

impl Course {
    /// Bottom-up prune: empty containers are always removed; completed pages
    /// are removed too when `remove_complete` is set. Idempotent.
    pub(crate) fn prune(&mut self, remove_complete: bool) {
        for textbook in self.textbooks.values_mut() {
            textbook.prune(remove_complete);
        }
        self.textbooks.retain(|_, textbook| !textbook.chapters.is_empty());
    }

    /// Remove a page by its stable id, then prune emptied containers.
    pub(crate) fn remove_page(&mut self, page_id: i64) -> bool {
        let mut removed = false;
        for textbook in self.textbooks.values_mut() {
            for chapter in textbook.chapters.values_mut() {
                for section in chapter.sections.values_mut() {
                    removed |= section.pages.remove(&page_id).is_some();
                }
            }
        }
        if removed {
            self.prune(false);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_page_course(is_complete: bool) -> Course {
        let page = Page {
            page_id: 501,
            page_relation_id: 9501,
            name: "1-1 Intro".to_string(),
            content_type: CONTENT_TYPE_VIDEO,
            is_complete,
            elements: vec![Element::Video { video_id: 7, video_length: 600 }],
        };
        let mut section =
            Section { section_id: 41, name: "Section one".to_string(), pages: BTreeMap::new() };
        section.pages.insert(page.page_id, page);

        let mut chapter =
            Chapter { chapter_id: 31, name: "Chapter one".to_string(), sections: BTreeMap::new() };
        chapter.sections.insert(section.section_id, section);

        let mut textbook = Textbook {
            textbook_id: 21,
            name: "Textbook".to_string(),
            status: 1,
            limit: 0,
            chapters: BTreeMap::new(),
        };
        textbook.chapters.insert(chapter.chapter_id, chapter);

        let mut course = Course {
            course_id: 11,
            name: "Course".to_string(),
            class_id: 1,
            class_user_id: 2,
            textbooks: BTreeMap::new(),
        };
        course.textbooks.insert(textbook.textbook_id, textbook);
        course
    }

    #[test]
    fn prune_cascades_through_emptied_containers() {
        let mut course = single_page_course(true);

        course.prune(true);

        // Page removed, then section, chapter and textbook in turn.
        assert!(course.textbooks.is_empty());
    }

    #[test]
    fn prune_keeps_incomplete_pages() {
        let mut course = single_page_course(false);

        course.prune(true);

        let pages =
            &course.textbooks[&21].chapters[&31].sections[&41].pages;
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn prune_without_remove_complete_keeps_completed_pages() {
        let mut course = single_page_course(true);

        course.prune(false);

        assert_eq!(course.textbooks[&21].chapters[&31].sections[&41].pages.len(), 1);
    }

    #[test]
    fn prune_is_idempotent() {
        let mut once = single_page_course(true);
        once.prune(true);

        let mut twice = single_page_course(true);
        twice.prune(true);
        twice.prune(true);

        assert_eq!(
            serde_json::to_value(&once).expect("serialize"),
            serde_json::to_value(&twice).expect("serialize"),
        );
    }

    #[test]
    fn remove_page_uses_stable_id_and_prunes() {
        let mut course = single_page_course(false);

        // The relation id must not match anything.
        assert!(!course.remove_page(9501));
        assert!(course.remove_page(501));
        assert!(course.textbooks.is_empty());
    }
}
