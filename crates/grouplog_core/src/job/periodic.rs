//! Periodic write job and its caller-facing handle.
//!
//! # Responsibility
//! - Validate the two target files before anything is spawned.
//! - Run the write loop on a dedicated thread under the group's write lock.
//! - Report progress and the terminal state through `JobHandle`.
//!
//! # Invariants
//! - Target files are opened in append mode and never created or truncated.
//! - The write lock is held from the first write step until the job ends.
//! - Each write step writes and flushes the primary target before the
//!   secondary one; the pair is not atomic.
//! - Every write step is followed by one pause; stop conditions are checked
//!   only after it.

use crate::job::error::{ConfigError, JobError, JobResult, TargetRole};
use crate::job::lock::WriteLock;
use crate::job::stop::StopToken;
use crate::model::group::Group;
use log::{debug, error, info, warn};
use std::any::Any;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use uuid::Uuid;

/// Stable identifier of one job start.
pub type JobId = Uuid;

/// How many write steps a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationBudget {
    Bounded(u64),
    Unbounded,
}

impl IterationBudget {
    /// Maps a raw count: positive values bound the job, zero or negative run it
    /// until stopped.
    pub fn from_count(count: i64) -> Self {
        match u64::try_from(count) {
            Ok(0) | Err(_) => Self::Unbounded,
            Ok(value) => Self::Bounded(value),
        }
    }

    fn is_spent(self, steps: u64) -> bool {
        match self {
            Self::Bounded(limit) => steps >= limit,
            Self::Unbounded => false,
        }
    }
}

/// Lifecycle state of a periodic job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Validating,
    /// Targets are open; waiting for the write lock.
    AwaitingLock,
    Running,
    Completed,
    Stopped,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Validating => "validating",
            Self::AwaitingLock => "awaiting_lock",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

/// Summary returned by a job that ended without a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub group_id: String,
    pub final_state: JobState,
    pub write_steps: u64,
}

#[derive(Debug)]
struct JobStatus {
    state: Mutex<JobState>,
    write_steps: AtomicU64,
}

impl JobStatus {
    fn new() -> Self {
        Self {
            state: Mutex::new(JobState::Created),
            write_steps: AtomicU64::new(0),
        }
    }

    fn set(&self, next: JobState) {
        match self.state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn get(&self) -> JobState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Checks that both targets are given and exist as regular files.
pub fn validate_targets(primary: &Path, secondary: &Path) -> Result<(), ConfigError> {
    validate_target(TargetRole::Primary, primary)?;
    validate_target(TargetRole::Secondary, secondary)
}

fn validate_target(role: TargetRole, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::MissingTarget(role));
    }
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(()),
        Ok(_) => Err(ConfigError::TargetNotAFile {
            role,
            path: path.to_path_buf(),
        }),
        Err(_) => Err(ConfigError::TargetNotFound {
            role,
            path: path.to_path_buf(),
        }),
    }
}

/// One start request, owned by its background thread.
pub(crate) struct PeriodicWriteJob {
    id: JobId,
    group: Group,
    primary: PathBuf,
    secondary: PathBuf,
    budget: IterationBudget,
    interval: Duration,
    lock: WriteLock,
    stop: Arc<StopToken>,
    status: Arc<JobStatus>,
}

impl PeriodicWriteJob {
    pub(crate) fn new(
        group: Group,
        primary: PathBuf,
        secondary: PathBuf,
        budget: IterationBudget,
    ) -> Self {
        let interval = group.settings().interval();
        let lock = group.write_lock().clone();
        Self {
            id: Uuid::new_v4(),
            group,
            primary,
            secondary,
            budget,
            interval,
            lock,
            stop: Arc::new(StopToken::new()),
            status: Arc::new(JobStatus::new()),
        }
    }

    pub(crate) fn stop_token(&self) -> &Arc<StopToken> {
        &self.stop
    }

    /// Validates targets on the caller's thread, then launches the job.
    ///
    /// A `Validating → Failed` transition here is reported only as the `Err`
    /// returned to the caller; no handle exists yet to observe the state.
    pub(crate) fn spawn(self) -> JobResult<JobHandle> {
        self.status.set(JobState::Validating);
        if let Err(err) = validate_targets(&self.primary, &self.secondary) {
            error!(
                "event=job_failed module=job status=error group_id={} job_id={} stage=validate role={} error={}",
                self.group.group_id(),
                self.id,
                err.role(),
                err
            );
            return Err(JobError::Configuration(err));
        }

        let id = self.id;
        let group_id = self.group.group_id().to_string();
        let stop = Arc::clone(&self.stop);
        let status = Arc::clone(&self.status);
        let thread = thread::Builder::new()
            .name(format!("grouplog-job-{id}"))
            .spawn(move || self.run())
            .map_err(JobError::Spawn)?;

        info!(
            "event=job_start module=job status=ok group_id={} job_id={}",
            group_id, id
        );
        Ok(JobHandle {
            id,
            group_id,
            stop,
            status,
            thread,
        })
    }

    fn run(self) -> JobResult<JobReport> {
        let result = self
            .open_targets()
            .and_then(|(mut primary, mut secondary)| self.write_loop(&mut primary, &mut secondary));
        self.settle(result)
    }

    /// Logs the outcome and records `Failed` for fatal errors.
    fn settle(&self, result: JobResult<JobReport>) -> JobResult<JobReport> {
        match &result {
            Ok(report) => info!(
                "event=job_completed module=job status=ok group_id={} job_id={} state={} write_steps={}",
                report.group_id,
                report.job_id,
                report.final_state.as_str(),
                report.write_steps
            ),
            Err(err) => {
                self.status.set(JobState::Failed);
                error!(
                    "event=job_failed module=job status=error group_id={} job_id={} write_steps={} error={}",
                    self.group.group_id(),
                    self.id,
                    self.status.write_steps.load(Ordering::SeqCst),
                    err
                );
            }
        }
        result
    }

    fn open_targets(&self) -> JobResult<(BufWriter<File>, BufWriter<File>)> {
        // Targets may have vanished since the synchronous check.
        validate_targets(&self.primary, &self.secondary)?;
        Ok((open_append(&self.primary)?, open_append(&self.secondary)?))
    }

    /// Runs write steps under the write lock until the budget is spent, a stop
    /// is observed, or a write fails.
    ///
    /// Every write step is followed by a full pause, the last one included, so
    /// the next job queued on the lock keeps the cadence.
    fn write_loop<W: Write>(&self, primary: &mut W, secondary: &mut W) -> JobResult<JobReport> {
        self.status.set(JobState::AwaitingLock);
        let _guard = match self.lock.try_acquire() {
            Some(guard) => guard,
            None => {
                debug!(
                    "event=job_lock_contended module=job status=waiting group_id={} job_id={}",
                    self.group.group_id(),
                    self.id
                );
                self.lock.acquire()
            }
        };
        self.status.set(JobState::Running);
        debug!(
            "event=job_lock_acquired module=job status=ok group_id={} job_id={}",
            self.group.group_id(),
            self.id
        );

        let mut steps = 0_u64;
        loop {
            self.write_step(primary, secondary)?;
            steps += 1;
            self.status.write_steps.store(steps, Ordering::SeqCst);

            if let Err(err) = self
                .stop
                .pause(self.interval, || self.group.is_stop_requested())
            {
                warn!(
                    "event=pause_interrupted module=job status=ignored group_id={} job_id={} error={}",
                    self.group.group_id(),
                    self.id,
                    err
                );
            }

            if self.budget.is_spent(steps) {
                return Ok(self.finish(JobState::Completed, steps));
            }

            if self.stop.is_stopped() || self.group.is_stop_requested() {
                info!(
                    "event=job_stop_observed module=job status=ok group_id={} job_id={} write_steps={}",
                    self.group.group_id(),
                    self.id,
                    steps
                );
                return Ok(self.finish(JobState::Stopped, steps));
            }
        }
    }

    fn write_step<W: Write>(&self, primary: &mut W, secondary: &mut W) -> JobResult<()> {
        let report = self.group.format_members_report();
        write_block(primary, &self.primary, &report)?;
        write_block(secondary, &self.secondary, &report)?;
        debug!(
            "event=write_step module=job status=ok group_id={} job_id={} bytes={}",
            self.group.group_id(),
            self.id,
            report.len()
        );
        Ok(())
    }

    fn finish(&self, state: JobState, write_steps: u64) -> JobReport {
        self.status.set(state);
        JobReport {
            job_id: self.id,
            group_id: self.group.group_id().to_string(),
            final_state: state,
            write_steps,
        }
    }
}

fn open_append(path: &Path) -> JobResult<BufWriter<File>> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .map(BufWriter::new)
        .map_err(|source| JobError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn write_block<W: Write>(writer: &mut W, path: &Path, block: &str) -> JobResult<()> {
    writer
        .write_all(block.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|source| JobError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Caller-side handle to a running job.
///
/// Dropping the handle detaches the job; it keeps running until it completes
/// or observes a stop.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    group_id: String,
    stop: Arc<StopToken>,
    status: Arc<JobStatus>,
    thread: JoinHandle<JobResult<JobReport>>,
}

impl JobHandle {
    pub fn job_id(&self) -> JobId {
        self.id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn state(&self) -> JobState {
        self.status.get()
    }

    /// Number of write steps completed so far.
    pub fn write_steps(&self) -> u64 {
        self.status.write_steps.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Asks this job, and only this job, to stop at its next poll point.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Waits for the job thread and returns its outcome.
    pub fn join(self) -> JobResult<JobReport> {
        match self.thread.join() {
            Ok(result) => result,
            Err(payload) => {
                self.status.set(JobState::Failed);
                Err(JobError::Panicked(panic_message(payload.as_ref())))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        validate_targets, write_block, IterationBudget, JobState, PeriodicWriteJob,
    };
    use crate::job::error::{ConfigError, JobError, TargetRole};
    use crate::job::lock::WriteLock;
    use crate::job::settings::JobSettings;
    use crate::model::group::Group;
    use crate::model::member::Member;
    use std::error::Error;
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    fn read_only_writer(path: &Path) -> BufWriter<File> {
        BufWriter::new(File::open(path).expect("open target read-only"))
    }

    #[test]
    fn write_block_maps_flush_failure_to_io_error_with_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("primary.txt");
        std::fs::write(&path, "").expect("create primary");

        let mut writer = read_only_writer(&path);
        let err = write_block(&mut writer, &path, "memberId=m1, age=180\n")
            .expect_err("read-only handle cannot be written");

        match &err {
            JobError::Io { path: failed, .. } => assert_eq!(failed, &path),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_fatal());
        assert!(err.source().is_some());
    }

    #[test]
    fn write_failure_marks_job_failed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let primary: PathBuf = dir.path().join("primary.txt");
        let secondary: PathBuf = dir.path().join("secondary.txt");
        std::fs::write(&primary, "").expect("create primary");
        std::fs::write(&secondary, "").expect("create secondary");

        let settings = JobSettings::default().with_interval(Duration::from_millis(5));
        let group = Group::with_settings("g-fail", WriteLock::isolated(), settings);
        group.add_member(Member::new("m1", 18));
        let job = PeriodicWriteJob::new(
            group,
            primary.clone(),
            secondary.clone(),
            IterationBudget::Bounded(3),
        );
        let status = Arc::clone(&job.status);

        let mut primary_writer = read_only_writer(&primary);
        let mut secondary_writer = read_only_writer(&secondary);
        let result = job.write_loop(&mut primary_writer, &mut secondary_writer);
        let err = job.settle(result).expect_err("write step must fail");

        assert!(matches!(err, JobError::Io { ref path, .. } if path == &primary));
        assert_eq!(status.get(), JobState::Failed);
        assert_eq!(status.write_steps.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_to_string(&secondary).expect("read"), "");
    }

    #[test]
    fn budget_maps_non_positive_counts_to_unbounded() {
        assert_eq!(IterationBudget::from_count(3), IterationBudget::Bounded(3));
        assert_eq!(IterationBudget::from_count(0), IterationBudget::Unbounded);
        assert_eq!(IterationBudget::from_count(-1), IterationBudget::Unbounded);
    }

    #[test]
    fn bounded_budget_is_spent_at_limit() {
        let budget = IterationBudget::Bounded(2);
        assert!(!budget.is_spent(1));
        assert!(budget.is_spent(2));
        assert!(!IterationBudget::Unbounded.is_spent(u64::MAX));
    }

    #[test]
    fn terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Stopped.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::AwaitingLock.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }

    #[test]
    fn validate_rejects_empty_and_directory_targets() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("primary.txt");
        std::fs::write(&file, "").expect("create primary");

        let err = validate_targets(&file, Path::new("")).unwrap_err();
        assert_eq!(err, ConfigError::MissingTarget(TargetRole::Secondary));

        let err = validate_targets(dir.path(), &file).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TargetNotAFile {
                role: TargetRole::Primary,
                ..
            }
        ));

        validate_targets(&file, &file).expect("existing files are valid");
    }
}
