mod courseware;

pub(crate) use courseware::{
    Chapter, Course, Element, Page, Question, Section, Textbook, CONTENT_TYPE_DOCUMENT,
    CONTENT_TYPE_QUESTION, CONTENT_TYPE_VIDEO,
};
