use crate::RateLimitOptions;
use futures::{
    FutureExt as _, Stream, StreamExt as _,
    future::BoxFuture,
    stream::{self, FuturesUnordered},
};
use sps_core::ports::{PlatformError, PlatformErrorKind};
use std::{fmt::Display, time::Duration};
use tracing::{Level, event};

/// Errors that know whether repeating the failed operation may succeed.
pub trait Retryable {
    /// Whether the operation is worth retrying, given the HTTP statuses the
    /// caller treats as transient
    fn is_retryable(&self, retryable_status_codes: &[u16]) -> bool;
}

impl Retryable for PlatformError {
    fn is_retryable(&self, retryable_status_codes: &[u16]) -> bool {
        match self.kind {
            PlatformErrorKind::Status(status) => retryable_status_codes.contains(&status),
            PlatformErrorKind::Timeout => true,
            _ => false,
        }
    }
}

/// A step of a rate-limited batch.
#[derive(Debug)]
pub enum BatchEvent<T, E> {
    /// Another task succeeded
    Progress {
        /// Tasks that have succeeded so far
        completed: usize,
        /// Tasks in the batch
        total: usize,
    },
    /// Every task succeeded; the results are in task order
    Finished(Vec<T>),
    /// A task failed for good and the batch stopped
    Failed(BatchFailure<T, E>),
}

/// A batch stopped by a task that failed after exhausting its retries.
///
/// The window containing the failure is always allowed to settle, so
/// `success_count` includes tasks in that window that succeeded alongside the
/// failing one. No task from a later window is ever started.
#[derive(Debug, thiserror::Error)]
#[error("task {failed_index} of {total_count} failed after {success_count} succeeded: {error}")]
pub struct BatchFailure<T, E> {
    /// Tasks that succeeded before the batch stopped
    pub success_count: usize,
    /// Tasks in the batch
    pub total_count: usize,
    /// The lowest index that failed in the final window
    pub failed_index: usize,
    /// The error of the task at `failed_index`
    #[source]
    pub error: E,
    /// The result of every task that succeeded, by task index
    pub completed: Vec<Option<T>>,
}

/// The delay before retry number `attempt` (counting from zero).
///
/// The delay doubles with every attempt and is scaled by a random factor in
/// `[0.5, 1.5)` so that concurrent retries spread out.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let jitter = 0.5 + rand::random::<f64>();
    base.mul_f64(2f64.powi(attempt.min(16) as i32) * jitter)
}

async fn attempt<T, E, F, Fut>(
    index: usize,
    task: F,
    options: &RateLimitOptions,
) -> (usize, Result<T, E>)
where
    E: Retryable + Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retries = 0;
    loop {
        match task().await {
            Ok(value) => return (index, Ok(value)),
            Err(error)
                if retries < options.max_retries
                    && error.is_retryable(&options.retryable_status_codes) =>
            {
                let delay = backoff_delay(options.retry_base_delay, retries);
                event!(
                    Level::WARN,
                    index,
                    attempt = retries + 1,
                    max_retries = options.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "task failed, retrying"
                );
                tokio::time::sleep(delay).await;
                retries += 1;
            }
            Err(error) => return (index, Err(error)),
        }
    }
}

struct Windows<'a, T, E, F> {
    pending: std::vec::IntoIter<F>,
    next_index: usize,
    total: usize,
    in_flight: FuturesUnordered<BoxFuture<'a, (usize, Result<T, E>)>>,
    results: Vec<Option<T>>,
    completed: usize,
    failure: Option<(usize, E)>,
    windows_started: usize,
    done: bool,
}

/// Run `tasks` in fixed windows of `options.concurrency`, as a stream of events.
///
/// A window only starts once every task of the previous window has settled,
/// and consecutive windows are separated by `options.delay_between_batches`.
/// Tasks that fail with an error retryable under
/// `options.retryable_status_codes` are re-invoked with exponential
/// backoff, up to `options.max_retries` times. The first task to fail for
/// good lets its window settle and then ends the batch.
///
/// The stream is lazy: nothing runs until it is polled, and dropping it
/// cancels whatever is in flight. It always ends with exactly one
/// [`BatchEvent::Finished`] or [`BatchEvent::Failed`].
pub fn rate_limited<'a, T, E, F, Fut>(
    tasks: Vec<F>,
    options: &'a RateLimitOptions,
) -> impl Stream<Item = BatchEvent<T, E>> + Send + 'a
where
    T: Send + 'a,
    E: Retryable + Display + Send + 'a,
    F: Fn() -> Fut + Send + 'a,
    Fut: Future<Output = Result<T, E>> + Send + 'a,
{
    let total = tasks.len();
    let concurrency = options.concurrency.max(1);
    let windows = Windows {
        pending: tasks.into_iter(),
        next_index: 0,
        total,
        in_flight: FuturesUnordered::new(),
        results: std::iter::repeat_with(|| None).take(total).collect(),
        completed: 0,
        failure: None,
        windows_started: 0,
        done: false,
    };

    stream::unfold(windows, move |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            if state.in_flight.is_empty() {
                if let Some((failed_index, error)) = state.failure.take() {
                    state.done = true;
                    let failure = BatchFailure {
                        success_count: state.completed,
                        total_count: state.total,
                        failed_index,
                        error,
                        completed: std::mem::take(&mut state.results),
                    };
                    return Some((BatchEvent::Failed(failure), state));
                }

                if state.next_index == state.total {
                    state.done = true;
                    let results = std::mem::take(&mut state.results)
                        .into_iter()
                        .flatten()
                        .collect();
                    return Some((BatchEvent::Finished(results), state));
                }

                if state.windows_started > 0 && !options.delay_between_batches.is_zero() {
                    tokio::time::sleep(options.delay_between_batches).await;
                }
                state.windows_started += 1;

                for task in state.pending.by_ref().take(concurrency) {
                    let index = state.next_index;
                    state.next_index += 1;
                    state.in_flight.push(attempt(index, task, options).boxed());
                }
            }

            match state.in_flight.next().await {
                Some((index, Ok(value))) => {
                    state.results[index] = Some(value);
                    state.completed += 1;
                    let progress = BatchEvent::Progress {
                        completed: state.completed,
                        total: state.total,
                    };
                    return Some((progress, state));
                }
                Some((index, Err(error))) => {
                    event!(Level::ERROR, index, error = %error, "task failed");
                    if state
                        .failure
                        .as_ref()
                        .is_none_or(|(failed_index, _)| index < *failed_index)
                    {
                        state.failure = Some((index, error));
                    }
                }
                None => {}
            }
        }
    })
}

/// Run `tasks` through [`rate_limited`] and collect the outcome.
///
/// `on_progress` is called with `(completed, total)` after every successful
/// task. On success the results are returned in task order, regardless of the
/// order in which tasks finished.
///
/// # Examples
///
/// ```
/// use sps_bulk::{RateLimitOptions, execute_with_rate_limit};
/// use sps_core::ports::{PlatformError, PlatformErrorKind};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let options = RateLimitOptions::paced(2, Duration::ZERO);
/// let tasks = (1..=5)
///     .map(|n| move || async move { Ok::<_, PlatformError>(n * n) })
///     .collect();
///
/// let squares = execute_with_rate_limit(tasks, &options, |_, _| {}).await.unwrap();
/// assert_eq!(squares, vec![1, 4, 9, 16, 25]);
/// # })
/// ```
pub async fn execute_with_rate_limit<'a, T, E, F, Fut>(
    tasks: Vec<F>,
    options: &'a RateLimitOptions,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<Vec<T>, BatchFailure<T, E>>
where
    T: Send + 'a,
    E: Retryable + Display + Send + 'a,
    F: Fn() -> Fut + Send + 'a,
    Fut: Future<Output = Result<T, E>> + Send + 'a,
{
    let mut events = std::pin::pin!(rate_limited(tasks, options));
    while let Some(event) = events.next().await {
        match event {
            BatchEvent::Progress { completed, total } => on_progress(completed, total),
            BatchEvent::Finished(results) => return Ok(results),
            BatchEvent::Failed(failure) => return Err(failure),
        }
    }
    // the stream always ends with a terminal event
    Ok(Vec::new())
}
