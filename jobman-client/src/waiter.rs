//! Job waiter
//!
//! Polls a job through a [`StatusSource`] until it reaches a terminal state,
//! a fatal error occurs, transient failures pile up, or the wait budget runs
//! out. Between polls the waiter suspends on the tokio timer, so any number
//! of waits can share one runtime. Dropping the future stops the wait; the
//! remote job is never touched.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use jobman_core::domain::job::{JobId, JobStatus};
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// What a single status fetch observed
///
/// The variant decides how the waiter proceeds: stop with success, keep
/// polling, retry within the transient budget, or abort.
#[derive(Debug)]
pub enum FetchOutcome<P> {
    /// The job reached a terminal status, optionally with its result
    Terminal { status: JobStatus, payload: Option<P> },
    /// The job is still queued or running
    NonTerminal(JobStatus),
    /// The fetch failed in a way that may clear up on retry
    Transient(ClientError),
    /// The fetch failed in a way retrying cannot fix
    Fatal(ClientError),
}

impl<P> FetchOutcome<P> {
    /// Tag an observed status, without payload
    pub fn from_status(status: JobStatus) -> Self {
        if status.is_terminal() {
            FetchOutcome::Terminal {
                status,
                payload: None,
            }
        } else {
            FetchOutcome::NonTerminal(status)
        }
    }

    /// Tag a failed fetch using [`ClientError::is_transient`]
    pub fn from_error(error: ClientError) -> Self {
        if error.is_transient() {
            FetchOutcome::Transient(error)
        } else {
            FetchOutcome::Fatal(error)
        }
    }

    /// Make the tag agree with the status it carries
    fn normalize(self) -> Self {
        match self {
            FetchOutcome::Terminal { status, .. } if !status.is_terminal() => {
                FetchOutcome::NonTerminal(status)
            }
            FetchOutcome::NonTerminal(status) if status.is_terminal() => FetchOutcome::Terminal {
                status,
                payload: None,
            },
            other => other,
        }
    }
}

impl<P> From<crate::Result<JobStatus>> for FetchOutcome<P> {
    fn from(result: crate::Result<JobStatus>) -> Self {
        match result {
            Ok(status) => FetchOutcome::from_status(status),
            Err(error) => FetchOutcome::from_error(error),
        }
    }
}

/// Capability to look up the current status of a job
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Result data attached to a terminal observation
    type Payload: Send;

    async fn fetch_status(&self, job_id: &JobId) -> FetchOutcome<Self::Payload>;
}

/// Polling and retry settings for a wait
#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    /// Delay before the second poll
    pub poll_interval: Duration,
    /// Factor applied to the delay after every poll
    pub backoff_multiplier: f64,
    /// Upper bound for the delay
    pub max_backoff: Duration,
    /// Overall deadline, measured from the first poll
    pub max_wait: Duration,
    /// Consecutive transient failures tolerated before giving up
    pub max_transient_retries: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(15),
            max_wait: Duration::from_secs(3600),
            max_transient_retries: 5,
        }
    }
}

impl WaitConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_max_transient_retries(mut self, retries: u32) -> Self {
        self.max_transient_retries = retries;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), WaitError> {
        if self.poll_interval.is_zero() {
            return Err(WaitError::InvalidConfig(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(WaitError::InvalidConfig(
                "backoff_multiplier must be a finite number >= 1".to_string(),
            ));
        }

        if self.max_backoff < self.poll_interval {
            return Err(WaitError::InvalidConfig(
                "max_backoff must not be smaller than poll_interval".to_string(),
            ));
        }

        if self.max_wait.is_zero() {
            return Err(WaitError::InvalidConfig(
                "max_wait must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Growing delay between polls
///
/// Starts at `poll_interval`, multiplies by `backoff_multiplier` after every
/// step and never exceeds `max_backoff`.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    multiplier: f64,
    max: Duration,
}

impl Backoff {
    pub fn new(config: &WaitConfig) -> Self {
        Self {
            next: config.poll_interval.min(config.max_backoff),
            multiplier: config.backoff_multiplier,
            max: config.max_backoff,
        }
    }

    /// Delay to use now; advances the sequence
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        let scaled = Duration::try_from_secs_f64(self.next.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max);
        self.next = scaled.max(self.next).min(self.max);
        delay
    }
}

/// One call to the status source, as seen by the waiter
#[derive(Debug, Clone)]
pub struct PollAttempt {
    /// 1-based call number
    pub attempt: u32,
    /// Time since the wait started
    pub elapsed: Duration,
    /// Status observed, if the call succeeded
    pub status: Option<JobStatus>,
    /// Failure raised by the call, if any
    pub condition: Option<String>,
}

/// Successful end of a wait
#[derive(Debug, Clone)]
pub struct WaitOutcome<P> {
    pub job_id: JobId,
    /// Always terminal
    pub status: JobStatus,
    pub payload: Option<P>,
    /// Number of calls made to the status source
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Ways a wait can end without a terminal status
#[derive(Debug, Error)]
pub enum WaitError {
    /// The status source reported a non-retryable failure
    #[error("waiting for job {job_id} failed: {source}")]
    Fatal { job_id: JobId, source: ClientError },

    /// Too many consecutive transient failures
    #[error("waiting for job {job_id} failed after {retries} retries: {source}")]
    RetriesExhausted {
        job_id: JobId,
        retries: u32,
        source: ClientError,
    },

    /// The deadline passed while the job was still unfinished
    #[error(
        "timed out after {}s waiting for job {job_id} (last status: {})",
        .elapsed.as_secs(),
        LastStatus(.last_status)
    )]
    TimedOut {
        job_id: JobId,
        elapsed: Duration,
        last_status: Option<JobStatus>,
    },

    #[error("invalid wait configuration: {0}")]
    InvalidConfig(String),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::TimedOut { .. })
    }

    /// Last status seen before timing out
    pub fn last_status(&self) -> Option<JobStatus> {
        match self {
            WaitError::TimedOut { last_status, .. } => *last_status,
            _ => None,
        }
    }

    /// Underlying client error for fatal and exhausted waits
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            WaitError::Fatal { source, .. } | WaitError::RetriesExhausted { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

struct LastStatus<'a>(&'a Option<JobStatus>);

impl fmt::Display for LastStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(status) => write!(f, "{}", status),
            None => f.write_str("unknown"),
        }
    }
}

pub type WaitResult<P> = Result<WaitOutcome<P>, WaitError>;

type Observer<'a> = Box<dyn Fn(&PollAttempt) + Send + Sync + 'a>;

/// Polls a [`StatusSource`] until a job is done
///
/// ```no_run
/// # use jobman_client::waiter::{JobWaiter, WaitConfig};
/// # use jobman_client::JobManagerClient;
/// # use jobman_core::domain::job::JobId;
/// # async fn example(client: &JobManagerClient) -> Result<(), Box<dyn std::error::Error>> {
/// let waiter = JobWaiter::new(client, WaitConfig::default())
///     .with_observer(|attempt| eprintln!("poll #{}: {:?}", attempt.attempt, attempt.status));
/// let outcome = waiter.wait(&JobId::from("0d7c2a5e")).await?;
/// println!("finished as {}", outcome.status);
/// # Ok(())
/// # }
/// ```
pub struct JobWaiter<'a, S: StatusSource + ?Sized> {
    source: &'a S,
    config: WaitConfig,
    observer: Option<Observer<'a>>,
}

impl<'a, S: StatusSource + ?Sized> JobWaiter<'a, S> {
    pub fn new(source: &'a S, config: WaitConfig) -> Self {
        Self {
            source,
            config,
            observer: None,
        }
    }

    /// Call `observer` after every poll
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&PollAttempt) + Send + Sync + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Wait for `job_id` to reach a terminal status
    ///
    /// Returns as soon as a terminal status is observed. Transient failures
    /// are retried with the same backoff as unfinished polls, up to
    /// `max_transient_retries` in a row. Fatal failures end the wait at once.
    /// The final sleep is clipped so that one last poll happens exactly at
    /// `max_wait`; if that poll is still unfinished the wait times out.
    pub async fn wait(&self, job_id: &JobId) -> WaitResult<S::Payload> {
        self.config.validate()?;

        let started = Instant::now();
        let mut backoff = Backoff::new(&self.config);
        let mut attempt: u32 = 0;
        let mut consecutive_transient: u32 = 0;
        let mut last_status: Option<JobStatus> = None;

        loop {
            attempt += 1;
            let outcome = self.source.fetch_status(job_id).await.normalize();
            let elapsed = started.elapsed();

            match outcome {
                FetchOutcome::Terminal { status, payload } => {
                    self.record(PollAttempt {
                        attempt,
                        elapsed,
                        status: Some(status),
                        condition: None,
                    });
                    info!(
                        "Job {} reached {} after {} poll(s) in {:?}",
                        job_id, status, attempt, elapsed
                    );
                    return Ok(WaitOutcome {
                        job_id: job_id.clone(),
                        status,
                        payload,
                        attempts: attempt,
                        elapsed,
                    });
                }
                FetchOutcome::NonTerminal(status) => {
                    consecutive_transient = 0;
                    last_status = Some(status);
                    self.record(PollAttempt {
                        attempt,
                        elapsed,
                        status: Some(status),
                        condition: None,
                    });
                }
                FetchOutcome::Transient(error) => {
                    consecutive_transient += 1;
                    self.record(PollAttempt {
                        attempt,
                        elapsed,
                        status: None,
                        condition: Some(error.to_string()),
                    });

                    if consecutive_transient > self.config.max_transient_retries {
                        warn!(
                            "Giving up on job {} after {} consecutive transient failures",
                            job_id, consecutive_transient
                        );
                        return Err(WaitError::RetriesExhausted {
                            job_id: job_id.clone(),
                            retries: self.config.max_transient_retries,
                            source: error,
                        });
                    }

                    warn!(
                        "Transient failure polling job {} (retry {}/{}): {}",
                        job_id, consecutive_transient, self.config.max_transient_retries, error
                    );
                }
                FetchOutcome::Fatal(error) => {
                    self.record(PollAttempt {
                        attempt,
                        elapsed,
                        status: None,
                        condition: Some(error.to_string()),
                    });
                    return Err(WaitError::Fatal {
                        job_id: job_id.clone(),
                        source: error,
                    });
                }
            }

            let remaining = self.config.max_wait.saturating_sub(elapsed);
            if remaining.is_zero() {
                warn!(
                    "Timed out waiting for job {} after {:?} (last status: {})",
                    job_id,
                    elapsed,
                    LastStatus(&last_status)
                );
                return Err(WaitError::TimedOut {
                    job_id: job_id.clone(),
                    elapsed,
                    last_status,
                });
            }

            let delay = backoff.next_delay().min(remaining);
            debug!("Next poll of job {} in {:?}", job_id, delay);
            sleep(delay).await;
        }
    }

    fn record(&self, attempt: PollAttempt) {
        debug!(
            attempt = attempt.attempt,
            elapsed_ms = attempt.elapsed.as_millis() as u64,
            status = ?attempt.status,
            condition = ?attempt.condition,
            "Polled job status"
        );

        if let Some(observer) = &self.observer {
            observer(&attempt);
        }
    }
}
