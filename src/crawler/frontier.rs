//! Crawl frontier
//!
//! The frontier owns two pieces of shared state:
//! - The visited set: every URL that has ever been scheduled. A URL is
//!   claimed exactly once, atomically, no matter how many pages link to it.
//! - The task queue: claimed URLs waiting for a worker, plus a count of
//!   tasks currently being processed.
//!
//! The crawl is over when the queue is empty and no task is in flight, or
//! when the frontier is stopped. Either way every waiting worker is woken.

use crate::crawler::fetcher::RequestContext;
use crate::url::ArticleId;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use url::Url;

/// What to do with a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Extract links and schedule them
    Navigate,
    /// Extract an article record
    Article(ArticleId),
}

/// A scheduled request and how its response is handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub request: RequestContext,
    pub kind: TaskKind,
}

impl CrawlTask {
    pub fn navigate(request: RequestContext) -> Self {
        Self {
            request,
            kind: TaskKind::Navigate,
        }
    }

    pub fn article(request: RequestContext, id: ArticleId) -> Self {
        Self {
            request,
            kind: TaskKind::Article(id),
        }
    }

    pub fn url(&self) -> &Url {
        &self.request.url
    }

    /// Same handling for a different request (used for retries)
    pub fn with_request(&self, request: RequestContext) -> Self {
        Self {
            request,
            kind: self.kind.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    tasks: VecDeque<CrawlTask>,
    in_flight: usize,
    stopped: bool,
}

/// Shared visited set and work queue
#[derive(Debug, Default)]
pub struct Frontier {
    visited: Mutex<HashSet<String>>,
    queue: Mutex<QueueState>,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a URL for scheduling
    ///
    /// Returns true for exactly one caller per URL over the whole run;
    /// every later call for the same URL returns false.
    pub fn try_claim(&self, url: &Url) -> bool {
        self.lock_visited().insert(url.as_str().to_string())
    }

    /// Returns true if the URL has been claimed
    pub fn is_claimed(&self, url: &Url) -> bool {
        self.lock_visited().contains(url.as_str())
    }

    /// Number of URLs claimed so far
    pub fn claimed_count(&self) -> usize {
        self.lock_visited().len()
    }

    /// Adds a task to the back of the queue
    ///
    /// Returns false (and drops the task) if the frontier has been stopped.
    pub fn enqueue(&self, task: CrawlTask) -> bool {
        {
            let mut queue = self.lock_queue();
            if queue.stopped {
                tracing::trace!("Frontier stopped, dropping {}", task.url());
                return false;
            }
            queue.tasks.push_back(task);
        }
        self.notify.notify_waiters();
        true
    }

    /// Waits for the next task
    ///
    /// Returns `None` once the frontier is stopped, or once the queue is
    /// empty with nothing in flight. The returned lease marks the task as in
    /// flight until it is dropped.
    pub async fn next(&self) -> Option<FrontierLease<'_>> {
        loop {
            // Registered before the state check so a wakeup in between is not lost
            let notified = self.notify.notified();

            {
                let mut queue = self.lock_queue();
                if queue.stopped {
                    return None;
                }

                if let Some(task) = queue.tasks.pop_front() {
                    queue.in_flight += 1;
                    return Some(FrontierLease {
                        frontier: self,
                        task,
                    });
                }

                if queue.in_flight == 0 {
                    // Nothing queued and nobody can add more
                    queue.stopped = true;
                    drop(queue);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Stops handing out tasks; queued tasks are discarded
    pub fn stop(&self) {
        {
            let mut queue = self.lock_queue();
            queue.stopped = true;
            let discarded = queue.tasks.len();
            queue.tasks.clear();
            if discarded > 0 {
                tracing::debug!("Frontier stopped with {} queued tasks", discarded);
            }
        }
        self.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.lock_queue().stopped
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.lock_queue().tasks.len()
    }

    /// Number of tasks handed out and not yet finished
    pub fn in_flight(&self) -> usize {
        self.lock_queue().in_flight
    }

    fn complete(&self) {
        let idle = {
            let mut queue = self.lock_queue();
            queue.in_flight = queue.in_flight.saturating_sub(1);
            queue.in_flight == 0 && queue.tasks.is_empty()
        };
        if idle {
            self.notify.notify_waiters();
        }
    }

    fn lock_visited(&self) -> MutexGuard<'_, HashSet<String>> {
        self.visited.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_queue(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A task checked out of the frontier
///
/// Dropping the lease marks the task finished, including when the worker
/// unwinds.
#[derive(Debug)]
pub struct FrontierLease<'a> {
    frontier: &'a Frontier,
    task: CrawlTask,
}

impl FrontierLease<'_> {
    pub fn task(&self) -> &CrawlTask {
        &self.task
    }
}

impl Drop for FrontierLease<'_> {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}
