//! Plain-text rendering of the view-models for terminal front ends.

use std::fmt;

use crate::vm::{
    AchievementVm, AttemptCardVm, BookmarkVm, CertificateVm, QuizScreenVm, ResultsVm, StreakVm,
};

const RULE: &str = "────────────────────────────────────────";

impl fmt::Display for QuizScreenVm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}    ⏱ {}", self.title, self.timer)?;
        writeln!(f, "{}    {}% Complete", self.heading, self.progress_percent)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "{}", self.prompt)?;
        writeln!(f)?;
        for option in &self.options {
            let mark = if option.selected { "(•)" } else { "( )" };
            writeln!(f, "  {mark} {}", option.label)?;
        }
        if let Some(explanation) = &self.explanation {
            writeln!(f)?;
            writeln!(f, "  Correct Answer: {}", explanation.correct_answer)?;
            if !explanation.text.is_empty() {
                writeln!(f, "  {}", explanation.text)?;
            }
        }
        writeln!(f, "{RULE}")?;
        writeln!(f, "{}", self.answered_line)?;
        f.write_str(&key_hints(self))
    }
}

/// Answers are single letters, so every other command avoids letters.
fn key_hints(screen: &QuizScreenVm) -> String {
    let letters = match (screen.options.first(), screen.options.last()) {
        (Some(first), Some(last)) if first.letter != last.letter => {
            format!("[{}-{}] answer", first.letter, last.letter)
        }
        (Some(only), _) => format!("[{}] answer", only.letter),
        _ => String::new(),
    };
    let mut hints = vec![letters];
    if screen.can_go_back {
        hints.push("[<] previous".into());
    }
    if screen.is_last {
        if screen.submit_enabled {
            hints.push("[!] submit".into());
        }
    } else {
        hints.push("[>] next".into());
    }
    if screen.can_toggle_explanation {
        hints.push(if screen.explanation.is_some() {
            "[?] hide explanation".into()
        } else {
            "[?] show explanation".into()
        });
    }
    hints.push("[quit] quit".into());
    hints.retain(|h| !h.is_empty());
    hints.join("  ")
}

impl fmt::Display for ResultsVm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "{}", self.headline)?;
        writeln!(f, "{}", self.subline)?;
        writeln!(f)?;
        writeln!(f, "  Your Score:       {}%", self.percent)?;
        writeln!(f, "  Correct Answers:  {}", self.correct_line)?;
        writeln!(f, "  Time Taken:       {}", self.time)?;
        writeln!(f)?;
        writeln!(f, "{}", self.passing_line)?;
        for outcome in &self.outcomes {
            let mark = if outcome.is_correct { "✓" } else { "✗" };
            writeln!(
                f,
                "  {mark} Question {}: you answered {}, correct {}",
                outcome.number, outcome.selected, outcome.correct
            )?;
        }
        if let Some(notice) = &self.notice {
            writeln!(f)?;
            writeln!(f, "{notice}")?;
        }
        writeln!(f, "{RULE}")
    }
}

/// A user's attempt list, one line per attempt.
pub struct HistoryView<'a>(pub &'a [AttemptCardVm]);

impl fmt::Display for HistoryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No quiz attempts yet.");
        }
        for card in self.0 {
            let status = if card.passed { "passed" } else { "failed" };
            writeln!(
                f,
                "{}  {:<12} {:>3}%  {:>5}  {:>7}  {status}  {}",
                card.attempted_at_str,
                card.module,
                card.percent,
                card.correct_line,
                card.time,
                card.id
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for CertificateVm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Certificate of Completion")?;
        writeln!(f)?;
        writeln!(f, "This is to certify that")?;
        writeln!(f, "  {}", self.learner)?;
        writeln!(f, "has successfully completed")?;
        writeln!(f, "  {}", self.course_name)?;
        writeln!(f)?;
        writeln!(f, "Date: {}", self.date_str)?;
        writeln!(f, "Certificate No: {}", self.number)?;
        writeln!(f, "{RULE}")
    }
}

/// A user's achievements, one line each.
pub struct AchievementsView<'a>(pub &'a [AchievementVm]);

impl fmt::Display for AchievementsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No achievements yet.");
        }
        for achievement in self.0 {
            writeln!(
                f,
                "★ {:<22} {}  ({})",
                achievement.name, achievement.description, achievement.earned_at_str
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for StreakVm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline)?;
        for day in &self.days {
            writeln!(
                f,
                "  {}  {} lessons  {} quizzes  {:>7}",
                day.date_str, day.lessons, day.quizzes, day.time
            )?;
        }
        Ok(())
    }
}

/// A user's bookmarked lessons.
pub struct BookmarksView<'a>(pub &'a [BookmarkVm]);

impl fmt::Display for BookmarksView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No bookmarks yet.");
        }
        for bookmark in self.0 {
            writeln!(
                f,
                "{}  {:<12} {}",
                bookmark.created_at_str, bookmark.lesson, bookmark.location
            )?;
            if let Some(notes) = &bookmark.notes {
                writeln!(f, "    {notes}")?;
            }
        }
        Ok(())
    }
}
