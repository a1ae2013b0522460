use quiz_core::model::Bookmark;

use crate::vm::time_fmt::format_datetime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookmarkVm {
    pub lesson: String,
    pub location: String,
    pub notes: Option<String>,
    pub created_at_str: String,
}

impl From<&Bookmark> for BookmarkVm {
    fn from(bookmark: &Bookmark) -> Self {
        Self {
            lesson: bookmark.lesson_id.to_string(),
            location: format!("{} / {}", bookmark.course_id, bookmark.module_id),
            notes: bookmark.notes.clone(),
            created_at_str: format_datetime(bookmark.created_at),
        }
    }
}

#[must_use]
pub fn map_bookmarks(bookmarks: &[Bookmark]) -> Vec<BookmarkVm> {
    bookmarks.iter().map(BookmarkVm::from).collect()
}
