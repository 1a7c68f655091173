//! Named background tasks on a fixed or wall-clock cadence.
//!
//! Each started task is its own tokio loop. Stopping cancels the wait for
//! the next tick but lets a tick that is already running finish.

use crate::error::{BuildrollError, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A unit of scheduled work. Called once per tick.
pub type TaskFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed interval, first tick one interval after start.
    Every(Duration),
    /// Once a day at this UTC wall-clock time.
    DailyAt(NaiveTime),
}

impl Schedule {
    /// Time to wait from `now` until the next tick.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match *self {
            Schedule::Every(interval) => interval,
            Schedule::DailyAt(at) => {
                let today = Utc.from_utc_datetime(&now.date_naive().and_time(at));
                let next = if today > now {
                    today
                } else {
                    today + ChronoDuration::days(1)
                };
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Schedule::Every(interval) if interval.is_zero() => Err(BuildrollError::Validation(
                "schedule interval must be > 0".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Every(interval) => write!(f, "every {}s", interval.as_secs()),
            Schedule::DailyAt(at) => write!(f, "daily at {} UTC", at.format("%H:%M")),
        }
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Entry {
    schedule: Schedule,
    task: TaskFn,
    running: Option<Running>,
}

/// Registry of named tasks.
pub struct Scheduler {
    tasks: Mutex<BTreeMap<String, Entry>>,
    root: CancellationToken,
    closed: AtomicBool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(BTreeMap::new()),
            root: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BuildrollError::Scheduler("scheduler is shut down".into()));
        }
        Ok(())
    }

    pub fn register(&self, name: impl Into<String>, schedule: Schedule, task: TaskFn) -> Result<()> {
        self.ensure_open()?;
        schedule.validate()?;

        let name = name.into();
        let mut tasks = self.tasks();
        if tasks.contains_key(&name) {
            return Err(BuildrollError::Scheduler(format!(
                "task '{}' is already registered",
                name
            )));
        }

        debug!("Registered task '{}' ({})", name, schedule);
        tasks.insert(
            name,
            Entry {
                schedule,
                task,
                running: None,
            },
        );
        Ok(())
    }

    /// Start the loop for `name`. Starting a running task is a no-op.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, name: &str) -> Result<()> {
        self.ensure_open()?;

        let mut tasks = self.tasks();
        let entry = tasks.get_mut(name).ok_or_else(|| unknown(name))?;

        if let Some(running) = &entry.running {
            if !running.handle.is_finished() {
                return Ok(());
            }
        }

        let cancel = self.root.child_token();
        let handle = tokio::spawn(run_loop(
            name.to_string(),
            entry.schedule,
            entry.task.clone(),
            cancel.clone(),
        ));
        entry.running = Some(Running { cancel, handle });
        Ok(())
    }

    /// Stop the loop for `name` and wait for an in-flight tick to finish.
    pub async fn stop(&self, name: &str) -> Result<()> {
        let running = {
            let mut tasks = self.tasks();
            let entry = tasks.get_mut(name).ok_or_else(|| unknown(name))?;
            entry.running.take()
        };

        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(e) = running.handle.await {
                error!("Task '{}' ended abnormally: {}", name, e);
            }
        }
        Ok(())
    }

    pub fn start_all(&self) -> Result<()> {
        for name in self.task_names() {
            self.start(&name)?;
        }
        Ok(())
    }

    pub async fn stop_all(&self) {
        for name in self.task_names() {
            // Names come from the registry, which never shrinks.
            let _ = self.stop(&name).await;
        }
    }

    /// Refuse further registrations and starts, then stop every task.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.root.cancel();
        self.stop_all().await;
        info!("Scheduler shut down");
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.tasks()
            .get(name)
            .and_then(|entry| entry.running.as_ref())
            .map_or(false, |running| !running.handle.is_finished())
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks().keys().cloned().collect()
    }

    /// Run one tick of `name` immediately on the caller's task.
    pub async fn run_now(&self, name: &str) -> Result<()> {
        let task = {
            let tasks = self.tasks();
            tasks.get(name).ok_or_else(|| unknown(name))?.task.clone()
        };
        task().await
    }
}

fn unknown(name: &str) -> BuildrollError {
    BuildrollError::Scheduler(format!("no task named '{}'", name))
}

async fn run_loop(name: String, schedule: Schedule, task: TaskFn, cancel: CancellationToken) {
    info!("Task '{}' started ({})", name, schedule);

    loop {
        let delay = schedule.next_delay(Utc::now());
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        // Not raced against cancellation: a started tick runs to completion.
        match AssertUnwindSafe(task()).catch_unwind().await {
            Ok(Ok(())) => debug!("Task '{}' tick complete", name),
            Ok(Err(e)) => error!("Task '{}' tick failed: {}", name, e),
            Err(_) => error!("Task '{}' tick panicked", name),
        }
    }

    info!("Task '{}' stopped", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(count: Arc<AtomicUsize>, fail: bool) -> TaskFn {
        Arc::new(move || {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(BuildrollError::Validation("boom".into()))
                } else {
                    Ok(())
                }
            }
            .boxed()
        })
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn daily_delay_targets_next_occurrence() {
        let schedule = Schedule::DailyAt(at(12, 30));
        assert_eq!(schedule.next_delay(utc(10, 0)), Duration::from_secs(150 * 60));
        assert_eq!(schedule.next_delay(utc(13, 0)), Duration::from_secs(23 * 3600 + 30 * 60));
        assert_eq!(schedule.next_delay(utc(12, 30)), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn zero_interval_rejected() {
        assert!(Schedule::Every(Duration::ZERO).validate().is_err());
        assert!(Schedule::DailyAt(at(0, 0)).validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        scheduler
            .register("tick", Schedule::Every(Duration::from_secs(60)), counting(count.clone(), false))
            .unwrap();
        scheduler.start("tick").unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(160)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ticks_do_not_stop_the_loop() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        scheduler
            .register("flaky", Schedule::Every(Duration::from_secs(10)), counting(count.clone(), true))
            .unwrap();
        scheduler.start("flaky").unwrap();

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_running("flaky"));
        scheduler.stop("flaky").await.unwrap();
        assert!(!scheduler.is_running("flaky"));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_in_flight_tick() {
        let scheduler = Scheduler::new();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let slow: TaskFn = Arc::new(move || {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
            .boxed()
        });
        scheduler
            .register("slow", Schedule::Every(Duration::from_secs(1)), slow)
            .unwrap();
        scheduler.start("slow").unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!finished.load(Ordering::SeqCst));
        scheduler.stop("slow").await.unwrap();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn registry_rules() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        let every = Schedule::Every(Duration::from_secs(3600));

        scheduler.register("b", every, counting(count.clone(), false)).unwrap();
        scheduler.register("a", every, counting(count.clone(), false)).unwrap();
        assert!(scheduler.register("a", every, counting(count.clone(), false)).is_err());
        assert_eq!(scheduler.task_names(), vec!["a", "b"]);

        assert!(scheduler.start("missing").is_err());
        assert!(scheduler.stop("missing").await.is_err());
        assert!(scheduler.run_now("missing").await.is_err());

        scheduler.run_now("a").await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        scheduler.start_all().unwrap();
        scheduler.start("a").unwrap();
        assert!(scheduler.is_running("a") && scheduler.is_running("b"));

        scheduler.shutdown().await;
        assert!(!scheduler.is_running("a"));
        assert!(scheduler.start("a").is_err());
        assert!(scheduler.register("c", every, counting(count, false)).is_err());
    }
}
