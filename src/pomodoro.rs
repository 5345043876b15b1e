//! Pomodoro timer state machine.
//!
//! Tick-driven (one tick per second) rather than wall-clock driven, so a
//! host can drive it from any timer source and tests never sleep.
//! Completed sessions become [`NewPomodoroSession`] rows; saving prefers
//! a direct insert and falls back to the offline queue.

use chrono::{DateTime, Utc};

use crate::backend::{tables, SupabaseClient};
use crate::models::NewPomodoroSession;
use crate::queue::{MutationKind, OfflineQueue};
use crate::sync::Connectivity;

/// Work/break block lengths and cycle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroConfig {
    /// Work block length in minutes.
    pub work_minutes: u32,
    /// Break block length in minutes.
    pub break_minutes: u32,
    /// Work blocks per session.
    pub cycles: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            cycles: 4,
        }
    }
}

/// Where the timer is in its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PomodoroPhase {
    Idle,
    /// In work block `cycle` (1-based).
    Work { cycle: u32 },
    /// In the break after work block `cycle`.
    Break { cycle: u32 },
    /// All cycles finished.
    Complete,
}

/// Error starting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// A session needs something to attribute the time to.
    MissingSubject,
}

impl std::fmt::Display for TimerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerError::MissingSubject => {
                write!(f, "A session needs notes or a course to start")
            }
        }
    }
}

impl std::error::Error for TimerError {}

/// How a finished session reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Inserted directly.
    Synced,
    /// Parked in the offline queue for a later flush.
    Queued,
}

/// The timer itself. Drive it with [`tick`](Self::tick) once per second.
#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    config: PomodoroConfig,
    phase: PomodoroPhase,
    remaining_secs: u32,
    running: bool,
    notes: String,
    course_id: Option<String>,
    interruptions: u32,
    started_at: Option<DateTime<Utc>>,
}

impl PomodoroTimer {
    pub fn new(config: PomodoroConfig) -> Self {
        Self {
            config,
            phase: PomodoroPhase::Idle,
            remaining_secs: config.work_minutes * 60,
            running: false,
            notes: String::new(),
            course_id: None,
            interruptions: 0,
            started_at: None,
        }
    }

    /// Start a session. Requires notes or a course so the resulting row
    /// is attributable to something.
    pub fn start(&mut self, notes: &str, course_id: Option<&str>) -> Result<(), TimerError> {
        if notes.trim().is_empty() && course_id.is_none() {
            return Err(TimerError::MissingSubject);
        }

        self.notes = notes.trim().to_string();
        self.course_id = course_id.map(|id| id.to_string());
        self.phase = PomodoroPhase::Work { cycle: 1 };
        self.remaining_secs = self.config.work_minutes * 60;
        self.interruptions = 0;
        self.started_at = Some(Utc::now());
        self.running = true;
        Ok(())
    }

    /// Pause the countdown. Each pause of a live session counts as an
    /// interruption.
    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            if matches!(self.phase, PomodoroPhase::Work { .. } | PomodoroPhase::Break { .. }) {
                self.interruptions += 1;
            }
        }
    }

    /// Resume a paused countdown.
    pub fn resume(&mut self) {
        if matches!(self.phase, PomodoroPhase::Work { .. } | PomodoroPhase::Break { .. }) {
            self.running = true;
        }
    }

    /// Pause when running, resume when paused.
    pub fn toggle(&mut self) {
        if self.running {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Back to idle, discarding session state.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        if self.remaining_secs > 1 {
            self.remaining_secs -= 1;
            return;
        }
        self.remaining_secs = 0;
        self.advance_phase();
    }

    /// Every work block is followed by a break, the last one included;
    /// the session completes when the final break ends.
    fn advance_phase(&mut self) {
        match self.phase {
            PomodoroPhase::Work { cycle } => {
                self.phase = PomodoroPhase::Break { cycle };
                self.remaining_secs = self.config.break_minutes * 60;
            }
            PomodoroPhase::Break { cycle } if cycle >= self.config.cycles => {
                self.phase = PomodoroPhase::Complete;
                self.running = false;
            }
            PomodoroPhase::Break { cycle } => {
                self.phase = PomodoroPhase::Work { cycle: cycle + 1 };
                self.remaining_secs = self.config.work_minutes * 60;
            }
            PomodoroPhase::Idle | PomodoroPhase::Complete => {}
        }
    }

    pub fn phase(&self) -> PomodoroPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interruptions(&self) -> u32 {
        self.interruptions
    }

    /// Seconds left in the current block.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Percentage of the current block elapsed, 0 to 100.
    pub fn progress(&self) -> f64 {
        let total = match self.phase {
            PomodoroPhase::Work { .. } | PomodoroPhase::Idle => self.config.work_minutes * 60,
            PomodoroPhase::Break { .. } => self.config.break_minutes * 60,
            PomodoroPhase::Complete => return 100.0,
        };
        if total == 0 {
            return 100.0;
        }
        f64::from(total - self.remaining_secs) / f64::from(total) * 100.0
    }

    /// The current countdown as `mm:ss`.
    pub fn display_time(&self) -> String {
        format_time(self.remaining_secs)
    }

    /// The session row for this timer run, if a session was started.
    ///
    /// `completed` reflects whether every cycle finished; an abandoned
    /// session still produces a row so partial work is logged.
    pub fn session(&self, user_id: &str) -> Option<NewPomodoroSession> {
        let started_at = self.started_at?;
        Some(NewPomodoroSession {
            user_id: user_id.to_string(),
            course_id: self.course_id.clone(),
            notes: self.notes.clone(),
            work_duration: self.config.work_minutes,
            break_duration: self.config.break_minutes,
            started_at,
            ended_at: Utc::now(),
            completed: self.phase == PomodoroPhase::Complete,
            interruptions: self.interruptions,
        })
    }
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new(PomodoroConfig::default())
    }
}

/// Seconds as `mm:ss`.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Persist a finished session: insert directly when online, park it in
/// the offline queue when offline or when the insert fails.
pub async fn save_session(
    client: &SupabaseClient,
    queue: &OfflineQueue,
    connectivity: &Connectivity,
    session: NewPomodoroSession,
) -> SaveOutcome {
    if connectivity.is_online() {
        match client
            .table(tables::POMODORO_SESSIONS)
            .insert_only(&session)
            .await
        {
            Ok(()) => return SaveOutcome::Synced,
            Err(err) => {
                tracing::warn!("Session insert failed, queueing instead: {}", err);
            }
        }
    }
    queue.enqueue(MutationKind::CreatePomodoroSession(session));
    SaveOutcome::Queued
}
