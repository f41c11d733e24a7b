//! Awaitable, invalidate-able compile result.
//!
//! Each compile cycle is a `watch` channel that starts empty and is filled
//! exactly once. `get()` subscribes to the current cycle and waits until it
//! holds a result, so every caller of one generation receives the same `Arc`.
//!
//! ```text
//! invalidate() ──► gen N pending ──► resolve(N, result) ──► get() → Arc
//!                  gen N-1 pending ──┘ (superseded, resolved with N's result)
//! ```

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::{CompileError, CompileResult};

struct Cycle {
    generation: u64,
    tx: watch::Sender<Option<Arc<CompileResult>>>,
}

impl Cycle {
    fn pending(generation: u64) -> Arc<Self> {
        let (tx, _) = watch::channel(None);
        Arc::new(Self { generation, tx })
    }

    fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// First result wins; later calls are no-ops.
    fn fill(&self, result: &Arc<CompileResult>) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(Arc::clone(result));
            true
        })
    }
}

struct Inner {
    current: ArcSwap<Cycle>,
    /// Superseded cycles nobody has resolved yet.
    superseded: Mutex<Vec<Arc<Cycle>>>,
}

/// The single, shared compile result of the dev server.
///
/// Cheap to clone; clones share the same cycles.
#[derive(Clone)]
pub struct ServerCompileTask {
    inner: Arc<Inner>,
}

/// Resolves the cycle created by one `invalidate()` call.
pub struct CycleHandle {
    generation: u64,
    inner: Arc<Inner>,
}

impl CycleHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn resolve(self, result: CompileResult) -> Arc<CompileResult> {
        self.inner.resolve(self.generation, result)
    }
}

impl Default for ServerCompileTask {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerCompileTask {
    /// Pending at generation 0 until the first build resolves.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                current: ArcSwap::new(Cycle::pending(0)),
                superseded: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Compile-once task: resolved at generation 1 and never invalidated.
    pub fn resolved(result: CompileResult) -> Self {
        let task = Self::new();
        task.invalidate().resolve(result);
        task
    }

    pub fn generation(&self) -> u64 {
        self.inner.current.load().generation
    }

    /// Result of the current cycle if it has already resolved.
    pub fn peek(&self) -> Option<Arc<CompileResult>> {
        self.inner.current.load().tx.borrow().clone()
    }

    /// Wait for the current cycle's result.
    pub async fn get(&self) -> Arc<CompileResult> {
        let cycle = self.inner.current.load_full();
        let mut rx = cycle.tx.subscribe();
        let outcome = rx.wait_for(Option::is_some).await;
        match outcome.as_deref() {
            Ok(Some(result)) => Arc::clone(result),
            // `cycle` keeps the sender alive, so the channel cannot close.
            _ => Arc::new(CompileResult::failed(CompileError::NoCommand)),
        }
    }

    /// `get()` bounded by `timeout`. `Duration::ZERO` waits forever.
    pub async fn get_timeout(&self, timeout: Duration) -> Arc<CompileResult> {
        if timeout.is_zero() {
            return self.get().await;
        }
        match tokio::time::timeout(timeout, self.get()).await {
            Ok(result) => result,
            Err(_) => Arc::new(CompileResult::failed(CompileError::Timeout(timeout))),
        }
    }

    /// Start a new pending cycle. Older cycles are never mutated by this.
    pub fn invalidate(&self) -> CycleHandle {
        let mut superseded = self.inner.superseded.lock();
        let old = self.inner.current.load_full();
        let generation = old.generation + 1;
        if !old.is_resolved() {
            superseded.push(old);
        }
        self.inner.current.store(Cycle::pending(generation));

        CycleHandle {
            generation,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Resolve `generation` and every older cycle still pending.
    pub fn resolve(&self, generation: u64, result: CompileResult) -> Arc<CompileResult> {
        self.inner.resolve(generation, result)
    }
}

impl Inner {
    fn resolve(&self, generation: u64, result: CompileResult) -> Arc<CompileResult> {
        let result = Arc::new(result);
        let mut superseded = self.superseded.lock();

        let current = self.current.load_full();
        if current.generation == generation {
            current.fill(&result);
        }

        superseded.retain(|cycle| {
            if cycle.generation <= generation {
                cycle.fill(&result);
                false
            } else {
                true
            }
        });

        result
    }
}
