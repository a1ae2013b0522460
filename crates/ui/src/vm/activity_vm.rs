use quiz_core::model::{Achievement, StudyDay};
use services::StudyStreak;

use crate::vm::time_fmt::{format_datetime, format_minutes};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AchievementVm {
    pub name: String,
    pub description: String,
    pub earned_at_str: String,
}

impl From<&Achievement> for AchievementVm {
    fn from(achievement: &Achievement) -> Self {
        Self {
            name: achievement.kind.name().into(),
            description: achievement.kind.description().into(),
            earned_at_str: format_datetime(achievement.earned_at),
        }
    }
}

#[must_use]
pub fn map_achievements(achievements: &[Achievement]) -> Vec<AchievementVm> {
    achievements.iter().map(AchievementVm::from).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudyDayVm {
    pub date_str: String,
    pub lessons: u32,
    pub quizzes: u32,
    pub time: String,
}

impl From<&StudyDay> for StudyDayVm {
    fn from(day: &StudyDay) -> Self {
        Self {
            date_str: day.date.format("%Y-%m-%d").to_string(),
            lessons: day.lessons_completed,
            quizzes: day.quizzes_taken,
            time: format_minutes(day.minutes_studied),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreakVm {
    pub headline: String,
    /// Newest first.
    pub days: Vec<StudyDayVm>,
}

impl StreakVm {
    /// Show at most `days` recent study days.
    #[must_use]
    pub fn new(streak: &StudyStreak, days: usize) -> Self {
        let headline = match streak.current_days {
            0 => "No current study streak.".to_string(),
            n => format!("{n}-day study streak"),
        };
        Self {
            headline,
            days: streak.recent.iter().take(days).map(StudyDayVm::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{StudyActivity, UserId};
    use quiz_core::time::fixed_now;

    #[test]
    fn streak_headline_and_days() {
        let mut day = StudyDay::new(UserId::new("u1"), fixed_now().date_naive());
        day.record(StudyActivity::lesson(1));
        let streak = StudyStreak {
            current_days: 1,
            recent: vec![day],
        };

        let vm = StreakVm::new(&streak, 7);
        assert_eq!(vm.headline, "1-day study streak");
        assert_eq!(
            vm.days,
            vec![StudyDayVm {
                date_str: "2023-11-14".into(),
                lessons: 1,
                quizzes: 0,
                time: "1 min".into(),
            }]
        );
        let idle = StudyStreak {
            current_days: 0,
            recent: Vec::new(),
        };
        assert_eq!(StreakVm::new(&idle, 7).headline, "No current study streak.");
    }
}
