use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, LessonId, ModuleId};
use crate::model::question::QuestionDraft;
use crate::model::quiz::{PassingThreshold, Quiz, QuizError};

/// Lesson header as listed in module content. Lesson bodies are not modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    pub id: LessonId,
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizContent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub passing_score: Option<PassingThreshold>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

/// Authored content document for one course module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleContent {
    pub module_id: ModuleId,
    #[serde(default)]
    pub lessons: Vec<LessonSummary>,
    #[serde(default)]
    pub quiz: QuizContent,
}

impl ModuleContent {
    /// Build the module's quiz under the given course.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` when a question is structurally incomplete.
    pub fn to_quiz(&self, course_id: CourseId) -> Result<Quiz, QuizError> {
        let mut quiz = Quiz::from_drafts(
            course_id,
            self.module_id.clone(),
            self.quiz.questions.iter().cloned(),
        )?;
        if let Some(title) = &self.quiz.title {
            quiz = quiz.with_title(title.clone());
        }
        if let Some(threshold) = self.quiz.passing_score {
            quiz = quiz.with_passing_threshold(threshold);
        }
        Ok(quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE_JSON: &str = r#"{
        "moduleId": "module-1",
        "lessons": [
            { "id": "lesson-1", "number": 1, "title": "Child Development", "duration": "25 min",
              "content": { "introduction": "ignored" } }
        ],
        "quiz": {
            "title": "Module 1 Check",
            "passingScore": 80,
            "questions": [
                { "id": "q1", "type": "multiple-choice", "question": "Q1?",
                  "options": ["A) a", "B) b"], "correctAnswer": "B", "explanation": "because" }
            ]
        }
    }"#;

    #[test]
    fn parses_module_document_and_builds_quiz() {
        let module: ModuleContent = serde_json::from_str(MODULE_JSON).unwrap();
        assert_eq!(module.lessons.len(), 1);
        assert_eq!(module.lessons[0].id.as_str(), "lesson-1");

        let quiz = module.to_quiz(CourseId::new("ftce")).unwrap();
        assert_eq!(quiz.id().as_str(), "module-1-quiz");
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz.title(), "Module 1 Check");
        assert_eq!(quiz.passing_threshold().percent(), 80.0);
    }

    #[test]
    fn rejects_out_of_range_passing_score() {
        let json = r#"{ "moduleId": "m", "quiz": { "passingScore": 140, "questions": [] } }"#;
        assert!(serde_json::from_str::<ModuleContent>(json).is_err());
    }
}
