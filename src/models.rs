//! Domain models for the Atheno study app.
//!
//! These mirror the rows the Supabase backend stores, including the
//! embedded-resource shapes PostgREST returns when a query selects
//! `course:courses(...)` alongside the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course the user is studying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Course title embedded in a roadmap row (`course:courses(title)`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseTitle {
    pub title: String,
}

/// Course reference embedded in task and pomodoro rows
/// (`course:courses(id,title)`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseRef {
    pub id: String,
    pub title: String,
}

/// A learning roadmap generated for a course or subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Roadmap {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub course_id: Option<String>,
    pub title: String,
    /// Completion percentage, 0–100.
    #[serde(default)]
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    /// Embedded course title when fetched with the join select.
    #[serde(default)]
    pub course: Option<CourseTitle>,
}

/// Task completion state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Wire representation used in PostgREST filters.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// A study task, optionally linked to a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub course_id: Option<String>,
    pub title: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// Embedded course when fetched with the join select.
    #[serde(default)]
    pub course: Option<CourseRef>,
}

/// A completed (or interrupted) pomodoro session row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PomodoroSession {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub course_id: Option<String>,
    pub notes: String,
    /// Work block length in minutes.
    pub work_duration: u32,
    /// Break block length in minutes.
    pub break_duration: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
    pub interruptions: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub course: Option<CourseRef>,
}

/// Insert payload for a pomodoro session (no id; the backend assigns one).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPomodoroSession {
    pub user_id: String,
    #[serde(default)]
    pub course_id: Option<String>,
    pub notes: String,
    pub work_duration: u32,
    pub break_duration: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
    pub interruptions: u32,
}

/// A study log row used for the hours-today statistic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyLog {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl StudyLog {
    /// Duration of this log in fractional hours; zero when the clock
    /// ran backwards.
    pub fn hours(&self) -> f64 {
        let secs = (self.ended_at - self.started_at).num_seconds();
        if secs <= 0 {
            0.0
        } else {
            secs as f64 / 3600.0
        }
    }
}

/// Aggregate statistics shown on the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub pending_tasks: u64,
    /// Hours studied today, rounded to one decimal.
    pub hours_today: f64,
    pub completed_tasks: u64,
    pub active_courses: u64,
}

/// A generated flashcard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flashcard {
    pub front_content: String,
    pub back_content: String,
    #[serde(default)]
    pub hint: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_roadmap_deserializes_with_embedded_course() {
        let json = r#"{
            "id": "r1",
            "user_id": "u1",
            "course_id": "c1",
            "title": "Linear Algebra",
            "progress": 40,
            "created_at": "2026-01-05T10:00:00Z",
            "course": { "title": "Math 201" }
        }"#;

        let roadmap: Roadmap = serde_json::from_str(json).unwrap();
        assert_eq!(roadmap.progress, 40.0);
        assert_eq!(roadmap.course.unwrap().title, "Math 201");
    }

    #[test]
    fn test_roadmap_deserializes_without_embed() {
        let json = r#"{
            "id": "r1",
            "user_id": "u1",
            "title": "Solo",
            "created_at": "2026-01-05T10:00:00Z"
        }"#;

        let roadmap: Roadmap = serde_json::from_str(json).unwrap();
        assert_eq!(roadmap.progress, 0.0);
        assert!(roadmap.course.is_none());
    }

    #[test]
    fn test_task_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        assert_eq!(TaskStatus::Completed.as_str(), "completed");

        let status: TaskStatus = serde_json::from_str(r#""pending""#).unwrap();
        assert_eq!(status, TaskStatus::Pending);
    }

    #[test]
    fn test_study_log_hours() {
        let log = StudyLog {
            started_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            ended_at: Utc.with_ymd_and_hms(2026, 1, 5, 10, 30, 0).unwrap(),
        };
        assert!((log.hours() - 1.5).abs() < f64::EPSILON);

        // Reversed timestamps count as zero, not negative time.
        let broken = StudyLog {
            started_at: log.ended_at,
            ended_at: log.started_at,
        };
        assert_eq!(broken.hours(), 0.0);
    }

    #[test]
    fn test_flashcard_hint_defaults_empty() {
        let card: Flashcard =
            serde_json::from_str(r#"{"front_content": "Q", "back_content": "A"}"#).unwrap();
        assert_eq!(card.hint, "");
    }
}
