//! Group domain model and job-control entry points.
//!
//! # Responsibility
//! - Own a named, deduplicated member set.
//! - Start periodic write jobs bound to this group and signal them to stop.
//!
//! # Invariants
//! - `add_member(None)` is a no-op, never an error.
//! - Adding a member whose id is already present keeps the existing member.
//! - Every report is rendered from a snapshot taken under the member read lock,
//!   so concurrent `add_member` calls never tear a write step.
//! - The stop flag belongs to the group; every job of the group observes it.

use crate::job::error::JobResult;
use crate::job::lock::{LockScope, WriteLock};
use crate::job::periodic::{IterationBudget, JobHandle, PeriodicWriteJob};
use crate::job::settings::{JobSettings, StopPolicy, DEFAULT_BOUNDED_ITERATIONS};
use crate::job::stop::StopToken;
use crate::model::member::Member;
use crate::report::formatter::format_members_report;
use log::{debug, info};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

/// A named collection of members.
///
/// Cloning yields another handle to the same group.
#[derive(Debug, Clone)]
pub struct Group {
    inner: Arc<GroupState>,
}

#[derive(Debug)]
struct GroupState {
    group_id: String,
    members: RwLock<HashSet<Member>>,
    stop_requested: AtomicBool,
    // Tokens of jobs that may be pausing; woken when a group stop is requested.
    stop_listeners: Mutex<Vec<Weak<StopToken>>>,
    write_lock: WriteLock,
    settings: JobSettings,
}

impl Group {
    /// Creates an empty group that serializes its jobs on the process-wide lock.
    pub fn new(group_id: impl Into<String>) -> Self {
        Self::with_settings(group_id, WriteLock::global(), JobSettings::default())
    }

    pub fn with_lock_scope(group_id: impl Into<String>, scope: LockScope) -> Self {
        Self::with_settings(group_id, WriteLock::for_scope(scope), JobSettings::default())
    }

    /// Creates an empty group with an explicit write lock and job settings.
    pub fn with_settings(
        group_id: impl Into<String>,
        write_lock: WriteLock,
        settings: JobSettings,
    ) -> Self {
        Self {
            inner: Arc::new(GroupState {
                group_id: group_id.into(),
                members: RwLock::new(HashSet::new()),
                stop_requested: AtomicBool::new(false),
                stop_listeners: Mutex::new(Vec::new()),
                write_lock,
                settings,
            }),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.inner.group_id
    }

    pub fn settings(&self) -> &JobSettings {
        &self.inner.settings
    }

    pub fn write_lock(&self) -> &WriteLock {
        &self.inner.write_lock
    }

    /// Adds `member` when present.
    ///
    /// Returns `true` when the member set grew.
    pub fn add_member(&self, member: impl Into<Option<Member>>) -> bool {
        let Some(member) = member.into() else {
            return false;
        };
        let mut members = self
            .inner
            .members
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let inserted = members.insert(member);
        if inserted {
            info!(
                "event=member_added module=group status=ok group_id={} member_count={}",
                self.group_id(),
                members.len()
            );
        } else {
            debug!(
                "event=member_duplicate module=group status=skipped group_id={} member_count={}",
                self.group_id(),
                members.len()
            );
        }
        inserted
    }

    /// Returns a snapshot of the current members in unspecified order.
    pub fn members(&self) -> Vec<Member> {
        self.inner
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn member_count(&self) -> usize {
        self.inner
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Renders the member report block written by every write step.
    pub fn format_members_report(&self) -> String {
        let snapshot = self.members();
        format_members_report(&snapshot)
    }

    /// Starts a job writing the member report `iterations` times.
    ///
    /// Zero or negative `iterations` runs the job until it is stopped.
    ///
    /// # Errors
    /// - `JobError::Configuration` when a target is empty, missing or not a
    ///   regular file. No thread is spawned and no file is touched.
    /// - `JobError::Spawn` when the OS refuses a new thread.
    pub fn start_job(
        &self,
        primary: impl AsRef<Path>,
        secondary: impl AsRef<Path>,
        iterations: i64,
    ) -> JobResult<JobHandle> {
        self.start_job_with_budget(primary, secondary, IterationBudget::from_count(iterations))
    }

    pub fn start_job_ten_times(
        &self,
        primary: impl AsRef<Path>,
        secondary: impl AsRef<Path>,
    ) -> JobResult<JobHandle> {
        self.start_job_with_budget(
            primary,
            secondary,
            IterationBudget::Bounded(DEFAULT_BOUNDED_ITERATIONS),
        )
    }

    pub fn start_job_indefinitely(
        &self,
        primary: impl AsRef<Path>,
        secondary: impl AsRef<Path>,
    ) -> JobResult<JobHandle> {
        self.start_job_with_budget(primary, secondary, IterationBudget::Unbounded)
    }

    pub fn start_job_with_budget(
        &self,
        primary: impl AsRef<Path>,
        secondary: impl AsRef<Path>,
        budget: IterationBudget,
    ) -> JobResult<JobHandle> {
        if self.inner.settings.stop_policy == StopPolicy::ResetOnStart {
            self.clear_stop();
        }
        debug!(
            "event=job_requested module=group status=ok group_id={} budget={:?}",
            self.group_id(),
            budget
        );

        let job = PeriodicWriteJob::new(
            self.clone(),
            primary.as_ref().to_path_buf(),
            secondary.as_ref().to_path_buf(),
            budget,
        );
        self.register_stop_listener(job.stop_token());
        job.spawn()
    }

    /// Asks every job of this group to stop at its next poll point.
    pub fn request_stop(&self) {
        self.inner.stop_requested.store(true, Ordering::SeqCst);
        let listeners = self
            .inner
            .stop_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for token in listeners.iter().filter_map(Weak::upgrade) {
            token.wake();
        }
        info!(
            "event=stop_requested module=group status=ok group_id={}",
            self.group_id()
        );
    }

    /// Clears a sticky stop request so new jobs run again.
    pub fn clear_stop(&self) {
        self.inner.stop_requested.store(false, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.inner.stop_requested.load(Ordering::SeqCst)
    }

    fn register_stop_listener(&self, token: &Arc<StopToken>) {
        let mut listeners = self
            .inner
            .stop_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|listener| listener.strong_count() > 0);
        listeners.push(Arc::downgrade(token));
    }
}
