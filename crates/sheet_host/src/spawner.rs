//! Detached task spawning for fire-and-forget navigation calls and async lifecycle hooks.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use futures::{
    executor::LocalSpawner,
    future::LocalBoxFuture,
    stream::{FuturesUnordered, StreamExt},
    task::{self, ArcWake, LocalSpawnExt},
};

/// Host service running `'static` local futures without the caller awaiting them.
pub trait TaskSpawner {
    /// Detaches `task`. `label` names the work in diagnostics.
    fn spawn_detached(&self, label: &'static str, task: LocalBoxFuture<'static, ()>);

    /// Gives queued work a turn after the runtime released a resource it may be waiting on.
    ///
    /// Spawners backed by an executor ignore this.
    fn poll_pending(&self) {}
}

#[derive(Clone)]
/// Spawner backed by a `futures` local pool.
pub struct LocalPoolSpawner {
    spawner: LocalSpawner,
}

impl LocalPoolSpawner {
    /// Wraps the spawner handle of a `futures::executor::LocalPool`.
    pub fn new(spawner: LocalSpawner) -> Self {
        Self { spawner }
    }
}

impl TaskSpawner for LocalPoolSpawner {
    fn spawn_detached(&self, label: &'static str, task: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawner.spawn_local(task) {
            tracing::warn!(task = label, error = %err, "detached task rejected by local pool");
        }
    }
}

#[derive(Default)]
struct WakeFlag(AtomicBool);

impl ArcWake for WakeFlag {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.store(true, Ordering::Release);
    }
}

#[derive(Default)]
struct InlineQueue {
    running: RefCell<FuturesUnordered<LocalBoxFuture<'static, ()>>>,
    incoming: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
    draining: Cell<bool>,
    woken: Arc<WakeFlag>,
}

#[derive(Clone, Default)]
/// Spawner that polls detached work on the calling thread, without an executor.
///
/// Tasks run as soon as they are spawned. A task that pends stays queued and is polled again on
/// the next spawn or [`TaskSpawner::poll_pending`] call once its waker fired. Spawning from inside
/// a running task only queues the new task; the outer drain picks it up.
pub struct InlineSpawner {
    queue: Rc<InlineQueue>,
}

impl InlineSpawner {
    /// Creates an empty spawner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of detached tasks that have not finished.
    pub fn pending(&self) -> usize {
        self.queue.running.borrow().len() + self.queue.incoming.borrow().len()
    }

    /// Polls queued tasks until none of them can make progress.
    pub fn run_until_stalled(&self) {
        let queue = &self.queue;
        if queue.draining.replace(true) {
            return;
        }
        let waker = task::waker(queue.woken.clone());
        let mut cx = Context::from_waker(&waker);
        loop {
            queue.woken.0.store(false, Ordering::Release);
            let mut running = queue.running.borrow_mut();
            running.extend(queue.incoming.borrow_mut().drain(..));
            while let Poll::Ready(Some(())) = running.poll_next_unpin(&mut cx) {}
            drop(running);
            let woken = queue.woken.0.swap(false, Ordering::AcqRel);
            if !woken && queue.incoming.borrow().is_empty() {
                break;
            }
        }
        queue.draining.set(false);
    }
}

impl TaskSpawner for InlineSpawner {
    fn spawn_detached(&self, label: &'static str, task: LocalBoxFuture<'static, ()>) {
        tracing::trace!(task = label, "queued detached task");
        self.queue.incoming.borrow_mut().push(task);
        self.run_until_stalled();
    }

    fn poll_pending(&self) {
        self.run_until_stalled();
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Spawner that drops detached work unpolled.
///
/// Marks the floor of the at-most-once delivery guarantee for async lifecycle hooks.
pub struct DroppingSpawner;

impl TaskSpawner for DroppingSpawner {
    fn spawn_detached(&self, label: &'static str, task: LocalBoxFuture<'static, ()>) {
        tracing::debug!(task = label, "dropping detached task");
        drop(task);
    }
}
