//! Delayed tasks behind a small trait, plus the debounced draft autosave built on it.
//!
//! `ManualScheduler` moves time only when told to, so debounce behavior is tested without
//! wall-clock waits. `TokioScheduler` is the runtime implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::domain::QuizDraft;
use crate::storage::{save_draft, KeyValueStore};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Cancels a scheduled task. Cancelling after it ran is a no-op.
#[derive(Clone, Debug, Default)]
pub struct TaskHandle {
  cancelled: Arc<AtomicBool>,
  abort: Option<tokio::task::AbortHandle>,
}

impl TaskHandle {
  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::SeqCst);
    if let Some(abort) = &self.abort {
      abort.abort();
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::SeqCst)
  }
}

pub trait Scheduler: Send + Sync {
  fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;
}

// -------- Manual (test) clock --------

struct Pending {
  due: Duration,
  seq: u64,
  handle: TaskHandle,
  task: Task,
}

#[derive(Default)]
struct ManualInner {
  now: Duration,
  seq: u64,
  queue: Vec<Pending>,
}

/// Runs tasks only from [`ManualScheduler::advance`], in due-time order.
#[derive(Default)]
pub struct ManualScheduler {
  inner: Mutex<ManualInner>,
}

impl ManualScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn now(&self) -> Duration {
    self.inner.lock().map(|i| i.now).unwrap_or_default()
  }

  /// Tasks still waiting (cancelled ones included until their due time passes).
  pub fn pending(&self) -> usize {
    self.inner.lock().map(|i| i.queue.len()).unwrap_or_default()
  }

  /// Move the clock forward, running every task that comes due on the way.
  pub fn advance(&self, by: Duration) {
    let target = match self.inner.lock() {
      Ok(i) => i.now + by,
      Err(_) => return,
    };
    loop {
      let next = {
        let Ok(mut inner) = self.inner.lock() else { return };
        let idx = inner
          .queue
          .iter()
          .enumerate()
          .filter(|(_, p)| p.due <= target)
          .min_by_key(|(_, p)| (p.due, p.seq))
          .map(|(i, _)| i);
        match idx {
          Some(i) => {
            let p = inner.queue.remove(i);
            inner.now = p.due;
            Some(p)
          }
          None => {
            inner.now = target;
            None
          }
        }
      };
      // Lock released: a task may schedule follow-ups.
      match next {
        Some(p) if !p.handle.is_cancelled() => (p.task)(),
        Some(_) => {}
        None => break,
      }
    }
  }
}

impl Scheduler for ManualScheduler {
  fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
    let handle = TaskHandle::default();
    if let Ok(mut inner) = self.inner.lock() {
      inner.seq += 1;
      let pending = Pending { due: inner.now + delay, seq: inner.seq, handle: handle.clone(), task };
      inner.queue.push(pending);
    }
    handle
  }
}

// -------- Tokio --------

#[derive(Clone)]
pub struct TokioScheduler {
  runtime: tokio::runtime::Handle,
}

impl TokioScheduler {
  pub fn new(runtime: tokio::runtime::Handle) -> Self {
    Self { runtime }
  }

  /// The runtime we are running inside, if any.
  pub fn current() -> Option<Self> {
    tokio::runtime::Handle::try_current().ok().map(Self::new)
  }
}

impl Scheduler for TokioScheduler {
  fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    let join = self.runtime.spawn(async move {
      tokio::time::sleep(delay).await;
      if !flag.load(Ordering::SeqCst) {
        task();
      }
    });
    TaskHandle { cancelled, abort: Some(join.abort_handle()) }
  }
}

// -------- Debounced autosave --------

pub const AUTOSAVE_QUIET_PERIOD: Duration = Duration::from_secs(1);

/// Coalesces rapid edits into one draft write after a quiet period. Last writer wins.
pub struct DraftAutosaver {
  store: Arc<dyn KeyValueStore>,
  scheduler: Arc<dyn Scheduler>,
  quiet: Duration,
  pending: Mutex<Option<TaskHandle>>,
}

impl DraftAutosaver {
  pub fn new(store: Arc<dyn KeyValueStore>, scheduler: Arc<dyn Scheduler>) -> Self {
    Self::with_quiet_period(store, scheduler, AUTOSAVE_QUIET_PERIOD)
  }

  pub fn with_quiet_period(store: Arc<dyn KeyValueStore>, scheduler: Arc<dyn Scheduler>, quiet: Duration) -> Self {
    Self { store, scheduler, quiet, pending: Mutex::new(None) }
  }

  /// Record an edit. Any write still waiting is dropped in favor of this one.
  pub fn touch(&self, draft: QuizDraft) {
    let Ok(mut pending) = self.pending.lock() else { return };
    if let Some(prev) = pending.take() {
      prev.cancel();
    }
    let store = self.store.clone();
    let handle = self.scheduler.schedule(
      self.quiet,
      Box::new(move || {
        let now = chrono::Utc::now().to_rfc3339();
        let written = save_draft(store.as_ref(), &draft, &now);
        debug!(written, "Draft autosave fired");
      }),
    );
    *pending = Some(handle);
  }

  /// Drop a pending write, e.g. once the quiz has been shared.
  pub fn cancel(&self) {
    if let Ok(mut pending) = self.pending.lock() {
      if let Some(prev) = pending.take() {
        prev.cancel();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Card;
  use crate::storage::{load_draft, MemoryStore, DRAFT_KEY};
  use std::sync::atomic::AtomicUsize;

  fn draft(title: &str) -> QuizDraft {
    QuizDraft {
      title: title.into(),
      instructions: String::new(),
      cards: vec![Card { id: "1".into(), question: "q".into(), answer: "a".into() }],
    }
  }

  #[test]
  fn manual_scheduler_runs_due_tasks_in_order() {
    let sched = ManualScheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    for (name, ms) in [("late", 300u64), ("early", 100), ("mid", 200)] {
      let log = log.clone();
      sched.schedule(Duration::from_millis(ms), Box::new(move || log.lock().unwrap().push(name)));
    }
    sched.advance(Duration::from_millis(250));
    assert_eq!(*log.lock().unwrap(), vec!["early", "mid"]);
    assert_eq!(sched.now(), Duration::from_millis(250));
    sched.advance(Duration::from_millis(50));
    assert_eq!(*log.lock().unwrap(), vec!["early", "mid", "late"]);
    assert_eq!(sched.pending(), 0);
  }

  #[test]
  fn cancelled_task_never_runs() {
    let sched = ManualScheduler::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let handle = sched.schedule(Duration::from_millis(10), Box::new(move || { h.fetch_add(1, Ordering::SeqCst); }));
    handle.cancel();
    sched.advance(Duration::from_secs(1));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn autosave_coalesces_rapid_edits() {
    let store = Arc::new(MemoryStore::new());
    let sched = Arc::new(ManualScheduler::new());
    let saver = DraftAutosaver::new(store.clone(), sched.clone());

    saver.touch(draft("A"));
    sched.advance(Duration::from_millis(400));
    saver.touch(draft("AB"));
    sched.advance(Duration::from_millis(400));
    saver.touch(draft("ABC"));
    sched.advance(Duration::from_millis(999));
    assert_eq!(store.get(DRAFT_KEY), None, "nothing written before the quiet period ends");

    sched.advance(Duration::from_millis(1));
    assert_eq!(load_draft(store.as_ref()).map(|d| d.title), Some("ABC".to_string()));
  }

  #[test]
  fn autosave_cancel_drops_pending_write() {
    let store = Arc::new(MemoryStore::new());
    let sched = Arc::new(ManualScheduler::new());
    let saver = DraftAutosaver::new(store.clone(), sched.clone());
    saver.touch(draft("gone"));
    saver.cancel();
    sched.advance(Duration::from_secs(5));
    assert_eq!(store.get(DRAFT_KEY), None);
  }

  #[tokio::test]
  async fn tokio_scheduler_fires_after_delay() {
    let sched = TokioScheduler::current().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    sched.schedule(Duration::from_millis(50), Box::new(move || { h.fetch_add(1, Ordering::SeqCst); }));
    let h2 = hits.clone();
    let cancelled = sched.schedule(Duration::from_millis(50), Box::new(move || { h2.fetch_add(10, Ordering::SeqCst); }));
    cancelled.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
