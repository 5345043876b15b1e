//! Domain stores: read-through caches over the backend tables.
//!
//! One [`CachedStore`] per domain collection, each bound to a PostgREST
//! query filtered by the current user id. With no signed-in user every
//! fetch resolves to an empty collection without touching the network.

use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;

use crate::backend::{tables, SupabaseClient};
use crate::cache::CacheStore;
use crate::error::AthenoResult;
use crate::models::{Course, PomodoroSession, Roadmap, StudyLog, Task, UserStats};
use crate::store::{CachedStore, FetchFn};

/// Shared slot holding the current user id.
type UserSlot = Arc<RwLock<Option<String>>>;

/// The set of domain stores.
pub struct DataStores {
    client: SupabaseClient,
    user_id: UserSlot,
    /// Courses, newest first.
    pub courses: CachedStore<Vec<Course>>,
    /// Roadmaps with their course title embedded, newest first.
    pub roadmaps: CachedStore<Vec<Roadmap>>,
    /// Tasks with their course embedded, newest first.
    pub tasks: CachedStore<Vec<Task>>,
    /// Pomodoro sessions with their course embedded, newest first.
    pub pomodoros: CachedStore<Vec<PomodoroSession>>,
    /// Aggregate dashboard statistics.
    pub stats: CachedStore<UserStats>,
}

impl DataStores {
    /// Build the stores over `client`, persisting through `cache`.
    pub fn new(client: SupabaseClient, cache: CacheStore) -> Self {
        let user_id: UserSlot = Arc::new(RwLock::new(None));

        let courses = CachedStore::with_fetch(
            "courses",
            Vec::new(),
            cache.clone(),
            Self::courses_fetch(client.clone(), Arc::clone(&user_id)),
        );
        let roadmaps = CachedStore::with_fetch(
            "roadmaps",
            Vec::new(),
            cache.clone(),
            Self::roadmaps_fetch(client.clone(), Arc::clone(&user_id)),
        );
        let tasks = CachedStore::with_fetch(
            "tasks",
            Vec::new(),
            cache.clone(),
            Self::tasks_fetch(client.clone(), Arc::clone(&user_id)),
        );
        let pomodoros = CachedStore::with_fetch(
            "pomodoros",
            Vec::new(),
            cache.clone(),
            Self::pomodoros_fetch(client.clone(), Arc::clone(&user_id)),
        );
        let stats = CachedStore::with_fetch(
            "user_stats",
            UserStats::default(),
            cache,
            Self::stats_fetch(client.clone(), Arc::clone(&user_id)),
        );

        Self {
            client,
            user_id,
            courses,
            roadmaps,
            tasks,
            pomodoros,
            stats,
        }
    }

    /// The backend client the stores query through.
    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }

    /// Point the stores at a user (or no user).
    ///
    /// Clearing the user resets every store to its empty state; the next
    /// refresh for a signed-in user repopulates them.
    pub fn set_user(&self, user_id: Option<String>) {
        *self.user_id.write().unwrap() = user_id.clone();
        if user_id.is_none() {
            self.clear_all();
        }
    }

    /// The user id the stores are currently scoped to.
    pub fn current_user_id(&self) -> Option<String> {
        self.user_id.read().unwrap().clone()
    }

    /// Refetch every store. Individual failures are logged by the stores;
    /// the first error is returned after all refreshes have run.
    pub async fn refresh_all(&self) -> AthenoResult<()> {
        let (courses, roadmaps, tasks, pomodoros, stats) = tokio::join!(
            self.courses.refresh(),
            self.roadmaps.refresh(),
            self.tasks.refresh(),
            self.pomodoros.refresh(),
            self.stats.refresh(),
        );
        courses?;
        roadmaps?;
        tasks?;
        pomodoros?;
        stats?;
        Ok(())
    }

    /// Reset every store to its empty state, dropping cache entries.
    pub fn clear_all(&self) {
        self.courses.reset(Vec::new());
        self.roadmaps.reset(Vec::new());
        self.tasks.reset(Vec::new());
        self.pomodoros.reset(Vec::new());
        self.stats.reset(UserStats::default());
    }

    fn current(user_id: &UserSlot) -> Option<String> {
        user_id.read().unwrap().clone()
    }

    /// Today's date in the `YYYY-MM-DD` form PostgREST filters accept.
    fn today() -> String {
        chrono::Utc::now().format("%Y-%m-%d").to_string()
    }

    fn courses_fetch(client: SupabaseClient, user_id: UserSlot) -> FetchFn<Vec<Course>> {
        Arc::new(move || {
            let client = client.clone();
            let user = Self::current(&user_id);
            Box::pin(async move {
                let Some(user) = user else {
                    return Ok(Vec::new());
                };
                client
                    .table(tables::COURSES)
                    .eq("user_id", &user)
                    .order("created_at", false)
                    .execute()
                    .await
            })
        })
    }

    fn roadmaps_fetch(client: SupabaseClient, user_id: UserSlot) -> FetchFn<Vec<Roadmap>> {
        Arc::new(move || {
            let client = client.clone();
            let user = Self::current(&user_id);
            Box::pin(async move {
                let Some(user) = user else {
                    return Ok(Vec::new());
                };
                client
                    .table(tables::ROADMAPS)
                    .select("*,course:courses(title)")
                    .eq("user_id", &user)
                    .order("created_at", false)
                    .execute()
                    .await
            })
        })
    }

    fn tasks_fetch(client: SupabaseClient, user_id: UserSlot) -> FetchFn<Vec<Task>> {
        Arc::new(move || {
            let client = client.clone();
            let user = Self::current(&user_id);
            Box::pin(async move {
                let Some(user) = user else {
                    return Ok(Vec::new());
                };
                client
                    .table(tables::TASKS)
                    .select("*,course:courses(id,title)")
                    .eq("user_id", &user)
                    .order("created_at", false)
                    .execute()
                    .await
            })
        })
    }

    fn pomodoros_fetch(
        client: SupabaseClient,
        user_id: UserSlot,
    ) -> FetchFn<Vec<PomodoroSession>> {
        Arc::new(move || {
            let client = client.clone();
            let user = Self::current(&user_id);
            Box::pin(async move {
                let Some(user) = user else {
                    return Ok(Vec::new());
                };
                client
                    .table(tables::POMODORO_SESSIONS)
                    .select("*,course:courses(id,title)")
                    .eq("user_id", &user)
                    .order("created_at", false)
                    .execute()
                    .await
            })
        })
    }

    fn stats_fetch(client: SupabaseClient, user_id: UserSlot) -> FetchFn<UserStats> {
        Arc::new(move || {
            let client = client.clone();
            let user = Self::current(&user_id);
            Self::fetch_stats(client, user)
        })
    }

    /// The four dashboard statistics, issued concurrently.
    fn fetch_stats(
        client: SupabaseClient,
        user: Option<String>,
    ) -> BoxFuture<'static, AthenoResult<UserStats>> {
        Box::pin(async move {
            let Some(user) = user else {
                return Ok(UserStats::default());
            };
            let today = Self::today();

            let pending = client
                .table(tables::TASKS)
                .eq("user_id", &user)
                .neq("status", "completed")
                .count();
            let logs = client
                .table(tables::STUDY_LOGS)
                .select("started_at,ended_at")
                .eq("user_id", &user)
                .gte("started_at", &today)
                .execute::<StudyLog>();
            let completed = client
                .table(tables::TASKS)
                .eq("user_id", &user)
                .eq("status", "completed")
                .gte("created_at", &today)
                .count();
            let active = client.table(tables::COURSES).eq("user_id", &user).count();

            let (pending, logs, completed, active) =
                tokio::join!(pending, logs, completed, active);

            let hours: f64 = logs?.iter().map(StudyLog::hours).sum();

            Ok(UserStats {
                pending_tasks: pending?,
                hours_today: (hours * 10.0).round() / 10.0,
                completed_tasks: completed?,
                active_courses: active?,
            })
        })
    }
}
