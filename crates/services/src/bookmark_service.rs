use std::sync::Arc;

use quiz_core::model::{Bookmark, CourseId, LessonId, ModuleId, UserId};
use storage::repository::BookmarkRepository;
use tracing::info;

use crate::Clock;
use crate::error::BookmarkError;

#[derive(Clone)]
pub struct BookmarkService {
    clock: Clock,
    bookmarks: Arc<dyn BookmarkRepository>,
}

impl BookmarkService {
    #[must_use]
    pub fn new(clock: Clock, bookmarks: Arc<dyn BookmarkRepository>) -> Self {
        Self { clock, bookmarks }
    }

    /// Bookmark a lesson. Bookmarking it again replaces the notes.
    ///
    /// # Errors
    ///
    /// Returns `BookmarkError::Storage` on persistence failures.
    pub async fn add(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        module_id: &ModuleId,
        lesson_id: &LessonId,
        notes: Option<&str>,
    ) -> Result<Bookmark, BookmarkError> {
        let bookmark = Bookmark::new(
            user_id.clone(),
            course_id.clone(),
            module_id.clone(),
            lesson_id.clone(),
            notes,
            self.clock.now(),
        );
        self.bookmarks.upsert_bookmark(&bookmark).await?;
        info!(%user_id, %lesson_id, "lesson bookmarked");
        Ok(bookmark)
    }

    /// # Errors
    ///
    /// Returns `BookmarkError::NotFound` if the lesson was not bookmarked.
    pub async fn remove(&self, user_id: &UserId, lesson_id: &LessonId) -> Result<(), BookmarkError> {
        if self.bookmarks.remove_bookmark(user_id, lesson_id).await? {
            info!(%user_id, %lesson_id, "bookmark removed");
            Ok(())
        } else {
            Err(BookmarkError::NotFound)
        }
    }

    /// # Errors
    ///
    /// Returns `BookmarkError::Storage` on backend failures.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<Bookmark>, BookmarkError> {
        Ok(self.bookmarks.list_bookmarks(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn add_list_and_remove() {
        let svc = BookmarkService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let user = UserId::new("u1");
        let lesson = LessonId::new("l1");

        svc.add(
            &user,
            &CourseId::new("ftce"),
            &ModuleId::new("m1"),
            &lesson,
            Some("  wait time  "),
        )
        .await
        .unwrap();
        let list = svc.list(&user).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].notes.as_deref(), Some("wait time"));

        svc.remove(&user, &lesson).await.unwrap();
        assert!(matches!(
            svc.remove(&user, &lesson).await,
            Err(BookmarkError::NotFound)
        ));
        assert!(svc.list(&user).await.unwrap().is_empty());
    }
}
