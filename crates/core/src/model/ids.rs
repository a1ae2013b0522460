use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ─── Content Identifiers ───────────────────────────────────────────────────────

/// Error type for building an identifier from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }
        }
    };
}

content_id!(
    /// Identifier of a question inside a quiz (e.g. `q1`).
    QuestionId
);
content_id!(
    /// Identifier of a course (one certification exam prep track).
    CourseId
);
content_id!(
    /// Identifier of a module within a course.
    ModuleId
);
content_id!(
    /// Identifier of a quiz; defaults to `{module_id}-quiz`.
    QuizId
);
content_id!(
    /// Identifier of an authenticated user, as issued by the auth provider.
    UserId
);
content_id!(LessonId);
content_id!(StateId);
content_id!(ExamId);

impl QuizId {
    /// The quiz id used for a module's end-of-module quiz.
    #[must_use]
    pub fn for_module(module_id: &ModuleId) -> Self {
        Self(format!("{module_id}-quiz"))
    }
}

// ─── Record Identifiers ────────────────────────────────────────────────────────

/// Unique identifier for a persisted quiz attempt.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

/// Unique identifier for a course enrollment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentId(Uuid);

impl EnrollmentId {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttemptId({})", self.0)
    }
}

impl fmt::Debug for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnrollmentId({})", self.0)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttemptId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(AttemptId::new)
            .map_err(|_| ParseIdError { kind: "AttemptId" })
    }
}

impl FromStr for EnrollmentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(EnrollmentId::new)
            .map_err(|_| ParseIdError {
                kind: "EnrollmentId",
            })
    }
}

/// Unique identifier for an issued completion certificate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(Uuid);

impl CertificateId {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateId({})", self.0)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_id_display() {
        let id = QuestionId::new("q1");
        assert_eq!(id.to_string(), "q1");
    }

    #[test]
    fn content_id_from_str_trims() {
        let id: CourseId = "  ftce-prek3 ".parse().unwrap();
        assert_eq!(id, CourseId::new("ftce-prek3"));
    }

    #[test]
    fn content_id_from_str_rejects_blank() {
        assert!("   ".parse::<UserId>().is_err());
    }

    #[test]
    fn quiz_id_for_module() {
        let id = QuizId::for_module(&ModuleId::new("module-1"));
        assert_eq!(id.as_str(), "module-1-quiz");
    }

    #[test]
    fn attempt_id_parses_uuid() {
        let original = AttemptId::generate();
        let parsed: AttemptId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn attempt_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<AttemptId>().is_err());
    }

    #[test]
    fn content_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&QuestionId::new("q7")).unwrap();
        assert_eq!(json, "\"q7\"");
    }
}
