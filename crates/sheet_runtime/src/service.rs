//! Navigation service: resolves sheets, drives the presenter, and runs the confirmation and
//! lifecycle protocols around every push and pop.
//!
//! # Episode discipline
//!
//! Every navigation episode (navigate, go back, clear, presenter notification) runs under one
//! async episode gate, so application calls and presenter notifications are applied strictly one
//! after another. Stack borrows are never held across an `.await` or across a call into sheet,
//! view-model, or presenter code.
//!
//! Awaiting a navigation call of the same service from inside a confirmation or lifecycle
//! callback waits on the gate held by the running episode and never completes. Callbacks use the
//! fire-and-forget forms ([`NavigationService::navigate_to`], [`NavigationService::go_back`])
//! instead, which queue behind the running episode. Releasing the gate gives the host spawner a
//! turn through [`TaskSpawner::poll_pending`], so inline spawners resume queued episodes.
//!
//! # Async lifecycle hooks
//!
//! [`NavigationAwareAsync`](sheet_contract::NavigationAwareAsync) futures are handed to the host
//! spawner and never awaited. Delivery is best-effort and at-most-once, and the next episode may
//! start before a previous notification finished.

use std::{
    cell::{Cell, RefCell},
    future::Future,
    rc::Rc,
};

use futures::{
    future::{self, Either},
    lock::{Mutex, MutexGuard},
    FutureExt,
};
use sheet_contract::{
    confirm_navigation, EntryId, NavigationCapabilities, NavigationError, NavigationParameters,
    NavigationResult, Sheet, SheetState, SheetStates,
};
use sheet_host::{SheetHost, TaskSpawner};

use crate::{
    config::NavigationConfig,
    model::{NavigationEntry, PresentationSnapshot, StackSnapshot},
    registry::{ResolvedSheet, SheetRegistry},
    stack::NavigationStack,
};

mod reconcile;

struct ServiceInner {
    registry: Rc<SheetRegistry>,
    host: SheetHost,
    config: NavigationConfig,
    stack: RefCell<NavigationStack>,
    episode: Mutex<()>,
    host_page: RefCell<Option<Rc<dyn NavigationCapabilities>>>,
    next_entry_id: Cell<u64>,
}

/// Holds the episode gate for one episode.
struct Episode<'a> {
    gate: Option<MutexGuard<'a, ()>>,
    spawner: &'a dyn TaskSpawner,
}

impl Drop for Episode<'_> {
    fn drop(&mut self) {
        drop(self.gate.take());
        self.spawner.poll_pending();
    }
}

/// How the presenter is told to take down an entry that is being popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dismissal {
    /// Service-initiated: regular close transition.
    Close,
    /// A user gesture already dismissed the surface.
    AlreadyDismissed,
}

/// Handle to one navigation stack and its presenter.
///
/// Cloning is cheap and every clone drives the same stack, so presenters keep a clone to report
/// notifications back. The service is single-threaded (`!Send`).
#[derive(Clone)]
pub struct NavigationService {
    inner: Rc<ServiceInner>,
}

impl NavigationService {
    /// Creates a service over `registry` driving the platform through `host`.
    pub fn new(registry: Rc<SheetRegistry>, host: SheetHost, config: NavigationConfig) -> Self {
        Self {
            inner: Rc::new(ServiceInner {
                registry,
                host,
                config,
                stack: RefCell::new(NavigationStack::new()),
                episode: Mutex::new(()),
                host_page: RefCell::new(None),
                next_entry_id: Cell::new(1),
            }),
        }
    }

    /// Sets the page beneath the sheet stack, notified when the stack unwinds to empty.
    pub fn set_host_page(&self, page: Rc<dyn NavigationCapabilities>) {
        *self.inner.host_page.borrow_mut() = Some(page);
    }

    /// Active configuration.
    pub fn config(&self) -> &NavigationConfig {
        &self.inner.config
    }

    /// Number of presented sheets.
    pub fn depth(&self) -> usize {
        self.inner.stack.borrow().len()
    }

    /// Returns whether no sheet is presented.
    pub fn is_empty(&self) -> bool {
        self.inner.stack.borrow().is_empty()
    }

    /// Id of the top entry.
    pub fn current_id(&self) -> Option<EntryId> {
        self.inner.stack.borrow().current().ok().map(NavigationEntry::id)
    }

    /// Registration name of the top entry.
    pub fn current_name(&self) -> Option<String> {
        self.with_current(|entry| entry.name().to_string())
    }

    /// Runs `inspect` against the top entry.
    ///
    /// `inspect` must not call navigation methods of this service.
    pub fn with_current<R>(&self, inspect: impl FnOnce(&NavigationEntry) -> R) -> Option<R> {
        let stack = self.inner.stack.borrow();
        stack.current().ok().map(inspect)
    }

    /// Logical presentation state of `entry_id`, for presenters reading back intent.
    pub fn presentation(&self, entry_id: EntryId) -> Option<PresentationSnapshot> {
        self.inner
            .stack
            .borrow()
            .get(entry_id)
            .map(NavigationEntry::presentation)
    }

    /// Serializable view of the stack, bottom first.
    pub fn snapshot(&self) -> StackSnapshot {
        self.inner.stack.borrow().snapshot()
    }

    /// Presents the sheet registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::SheetNotRegistered`] for unknown names,
    /// [`NavigationError::InvalidState`] for sheets without an allowed detent, and
    /// [`NavigationError::Presenter`] when the presenter fails to open. The stack is unchanged
    /// in every error case.
    pub async fn navigate_to_async(
        &self,
        name: &str,
        parameters: NavigationParameters,
    ) -> Result<NavigationResult, NavigationError> {
        let _episode = self.begin_episode().await;
        let resolved = self.inner.registry.resolve(name, &self.inner.config)?;
        self.present(resolved, parameters).await
    }

    /// Presents the sheet registered for type `S`.
    ///
    /// # Errors
    ///
    /// As [`Self::navigate_to_async`], with [`NavigationError::TypeNotRegistered`] for unknown
    /// types.
    pub async fn navigate_to_type_async<S: Sheet + 'static>(
        &self,
        parameters: NavigationParameters,
    ) -> Result<NavigationResult, NavigationError> {
        let _episode = self.begin_episode().await;
        let resolved = self.inner.registry.resolve_type::<S>(&self.inner.config)?;
        self.present(resolved, parameters).await
    }

    /// Leaves the top sheet if its confirmation protocol allows it.
    ///
    /// Returns [`NavigationResult::CANCELLED`] on a veto and [`NavigationResult::SKIPPED`] when
    /// nothing is presented.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::Presenter`] when the presenter fails to close; the entry then
    /// stays on the stack.
    pub async fn go_back_async(
        &self,
        parameters: NavigationParameters,
    ) -> Result<NavigationResult, NavigationError> {
        let _episode = self.begin_episode().await;
        self.go_back_locked(parameters).await
    }

    /// Goes back until the stack is empty or an entry vetoes.
    ///
    /// The unwind is not atomic: a veto halts it with [`NavigationResult::CANCELLED`] and the
    /// remaining entries stay presented.
    ///
    /// # Errors
    ///
    /// As [`Self::go_back_async`].
    pub async fn clear_stack_async(&self) -> Result<NavigationResult, NavigationError> {
        let _episode = self.begin_episode().await;
        if self.is_empty() {
            return Ok(NavigationResult::SKIPPED);
        }
        while !self.is_empty() {
            let result = self.go_back_locked(NavigationParameters::new()).await?;
            if result.is_cancelled() {
                tracing::info!(depth = self.depth(), "stack unwind halted by veto");
                return Ok(result);
            }
        }
        Ok(NavigationResult::COMPLETED)
    }

    /// Fire-and-forget form of [`Self::navigate_to_async`]; failures are logged.
    pub fn navigate_to(&self, name: impl Into<String>, parameters: NavigationParameters) {
        let service = self.clone();
        let name = name.into();
        self.spawn_episode("navigate_to", async move {
            service.navigate_to_async(&name, parameters).await
        });
    }

    /// Fire-and-forget form of [`Self::navigate_to_type_async`]; failures are logged.
    pub fn navigate_to_type<S: Sheet + 'static>(&self, parameters: NavigationParameters) {
        let service = self.clone();
        self.spawn_episode("navigate_to_type", async move {
            service.navigate_to_type_async::<S>(parameters).await
        });
    }

    /// Fire-and-forget form of [`Self::go_back_async`]; failures are logged.
    pub fn go_back(&self, parameters: NavigationParameters) {
        let service = self.clone();
        self.spawn_episode("go_back", async move { service.go_back_async(parameters).await });
    }

    /// Fire-and-forget form of [`Self::clear_stack_async`]; failures are logged.
    pub fn clear_stack(&self) {
        let service = self.clone();
        self.spawn_episode("clear_stack", async move { service.clear_stack_async().await });
    }

    /// Moves the top sheet to `state` and tells the presenter when the detent changed.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::EmptyStack`] when nothing is presented and
    /// [`NavigationError::InvalidState`] for a detent outside the allowed set.
    pub fn select_state(&self, state: SheetState) -> Result<bool, NavigationError> {
        let (entry_id, changed) = {
            let mut stack = self.inner.stack.borrow_mut();
            let entry = stack.current_mut()?;
            (entry.id(), entry.detents_mut().select(state)?)
        };
        if changed {
            self.inner.host.presenter.set_current_state(entry_id, state);
        }
        Ok(changed)
    }

    /// Replaces the top sheet's allowed detents, re-deriving its current one when it fell out.
    ///
    /// Returns whether the current detent changed; the presenter is told when it did.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::EmptyStack`] when nothing is presented and
    /// [`NavigationError::InvalidState`] for an empty set.
    pub fn set_allowed_states(&self, allowed: SheetStates) -> Result<bool, NavigationError> {
        let (entry_id, changed, current) = {
            let mut stack = self.inner.stack.borrow_mut();
            let entry = stack.current_mut()?;
            let changed = entry.detents_mut().set_allowed(allowed)?;
            (entry.id(), changed, entry.state())
        };
        if changed {
            tracing::debug!(
                entry = %entry_id,
                state = %current,
                "allowed states shrank; current state re-derived"
            );
            self.inner.host.presenter.set_current_state(entry_id, current);
        }
        Ok(changed)
    }

    async fn present(
        &self,
        resolved: ResolvedSheet,
        mut parameters: NavigationParameters,
    ) -> Result<NavigationResult, NavigationError> {
        let entry_id = self.allocate_entry_id();
        let entry = NavigationEntry::new(entry_id, resolved)?;
        if let Some(view_model) = entry.view_model() {
            entry.sheet().set_binding_context(view_model.clone());
        }
        let name = entry.name().to_string();
        let targets = entry.targets();
        let mut request = entry.present_request(false);
        self.inner.stack.borrow_mut().push(entry);

        let forced = !self.wait_for_attachment(entry_id).await;
        request.forced = forced;
        if let Err(err) = self.inner.host.presenter.open(request).await {
            let rolled_back = self.inner.stack.borrow_mut().pop_top(entry_id).is_some();
            tracing::warn!(
                entry = %entry_id,
                sheet = %name,
                rolled_back,
                error = %err,
                "presenter failed to open sheet"
            );
            return Err(err.into());
        }
        tracing::debug!(
            entry = %entry_id,
            sheet = %name,
            forced,
            depth = self.depth(),
            "sheet presented"
        );

        self.notify_navigated_to(&targets, &mut parameters);
        Ok(if forced {
            NavigationResult::completed_after_timeout()
        } else {
            NavigationResult::COMPLETED
        })
    }

    /// Returns `false` when the bounded wait elapsed before the presenter attached.
    async fn wait_for_attachment(&self, entry_id: EntryId) -> bool {
        let attached = self.inner.host.presenter.wait_attached(entry_id);
        let timeout = self.inner.host.timer.sleep(self.inner.config.attach_timeout());
        match future::select(attached, timeout).await {
            Either::Left(_) => true,
            Either::Right(_) => {
                tracing::warn!(
                    entry = %entry_id,
                    timeout_ms = self.inner.config.attach_timeout_ms,
                    "window attachment timed out; opening in forced mode"
                );
                false
            }
        }
    }

    async fn go_back_locked(
        &self,
        mut parameters: NavigationParameters,
    ) -> Result<NavigationResult, NavigationError> {
        let top = {
            let stack = self.inner.stack.borrow();
            stack.current().ok().map(|entry| {
                let dismissal = if entry.is_surface_dismissed() {
                    Dismissal::AlreadyDismissed
                } else {
                    Dismissal::Close
                };
                (entry.id(), entry.targets(), dismissal)
            })
        };
        let Some((entry_id, targets, dismissal)) = top else {
            tracing::debug!("go back on empty stack");
            return Ok(NavigationResult::SKIPPED);
        };

        if !self.confirm(&targets, &mut parameters).await {
            tracing::info!(entry = %entry_id, "back navigation vetoed");
            return Ok(NavigationResult::CANCELLED);
        }
        self.complete_back_navigation(entry_id, parameters, dismissal)
            .await
    }

    /// Takes down, pops, and notifies around the top entry after its confirmation passed.
    async fn complete_back_navigation(
        &self,
        entry_id: EntryId,
        mut parameters: NavigationParameters,
        dismissal: Dismissal,
    ) -> Result<NavigationResult, NavigationError> {
        // Late notifications from the closing surface must not pop a second time.
        self.set_subscribed(entry_id, false);
        let presenter = &self.inner.host.presenter;
        let outcome = match dismissal {
            Dismissal::Close => presenter.close(entry_id).await,
            Dismissal::AlreadyDismissed => presenter.cancel(entry_id).await,
        };
        if let Err(err) = outcome {
            self.set_subscribed(entry_id, true);
            tracing::warn!(entry = %entry_id, error = %err, "presenter failed to dismiss sheet");
            return Err(err.into());
        }

        let popped = self.inner.stack.borrow_mut().pop()?;
        tracing::debug!(
            entry = %entry_id,
            sheet = popped.name(),
            ?dismissal,
            depth = self.depth(),
            "sheet popped"
        );

        self.resurface_top().await;

        self.notify_navigated_from(&popped.targets(), &mut parameters);
        let next = self
            .inner
            .stack
            .borrow()
            .current()
            .ok()
            .map(NavigationEntry::targets);
        let destination = match next {
            Some(targets) => targets,
            None => self.inner.host_page.borrow().iter().cloned().collect(),
        };
        self.notify_navigated_to(&destination, &mut parameters);
        Ok(NavigationResult::COMPLETED)
    }

    /// Reopens the new top entry when its surface closed while it was buried.
    ///
    /// A failed reopen leaves the entry marked, so its own pop later skips the close transition.
    async fn resurface_top(&self) {
        let request = {
            let stack = self.inner.stack.borrow();
            match stack.current() {
                Ok(entry) if entry.is_surface_dismissed() => entry.present_request(false),
                _ => return,
            }
        };
        let entry_id = request.entry_id;
        match self.inner.host.presenter.open(request).await {
            Ok(()) => {
                if let Some(entry) = self.inner.stack.borrow_mut().get_mut(entry_id) {
                    entry.set_surface_dismissed(false);
                }
                tracing::debug!(entry = %entry_id, "reopened sheet closed while buried");
            }
            Err(err) => {
                tracing::warn!(
                    entry = %entry_id,
                    error = %err,
                    "failed to reopen sheet closed while buried"
                );
            }
        }
    }

    /// Asks each target in order; the first veto wins.
    async fn confirm(
        &self,
        targets: &[Rc<dyn NavigationCapabilities>],
        parameters: &mut NavigationParameters,
    ) -> bool {
        for target in targets {
            if !confirm_navigation(target.as_ref(), parameters).await {
                return false;
            }
        }
        true
    }

    fn notify_navigated_to(
        &self,
        targets: &[Rc<dyn NavigationCapabilities>],
        parameters: &mut NavigationParameters,
    ) {
        for target in targets {
            if let Some(aware) = target.as_navigation_aware() {
                aware.on_navigated_to(parameters);
            }
            if let Some(aware) = target.as_navigation_aware_async() {
                self.inner.host.spawner.spawn_detached(
                    "on_navigated_to",
                    aware.on_navigated_to_async(parameters.clone()),
                );
            }
        }
    }

    fn notify_navigated_from(
        &self,
        targets: &[Rc<dyn NavigationCapabilities>],
        parameters: &mut NavigationParameters,
    ) {
        for target in targets {
            if let Some(aware) = target.as_navigation_aware() {
                aware.on_navigated_from(parameters);
            }
            if let Some(aware) = target.as_navigation_aware_async() {
                self.inner.host.spawner.spawn_detached(
                    "on_navigated_from",
                    aware.on_navigated_from_async(parameters.clone()),
                );
            }
        }
    }

    fn set_subscribed(&self, entry_id: EntryId, subscribed: bool) {
        let mut stack = self.inner.stack.borrow_mut();
        if let Ok(entry) = stack.current_mut() {
            if entry.id() == entry_id {
                entry.set_subscribed(subscribed);
            }
        }
    }

    async fn begin_episode(&self) -> Episode<'_> {
        let gate = self.inner.episode.lock().await;
        Episode {
            gate: Some(gate),
            spawner: self.inner.host.spawner.as_ref(),
        }
    }

    fn allocate_entry_id(&self) -> EntryId {
        let id = self.inner.next_entry_id.get();
        self.inner.next_entry_id.set(id + 1);
        EntryId(id)
    }

    fn spawn_episode<F>(&self, label: &'static str, episode: F)
    where
        F: Future<Output = Result<NavigationResult, NavigationError>> + 'static,
    {
        self.inner.host.spawner.spawn_detached(
            label,
            async move {
                match episode.await {
                    Ok(result) => {
                        tracing::debug!(
                            task = label,
                            status = ?result.status,
                            "detached navigation finished"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(task = label, error = %err, "detached navigation failed");
                    }
                }
            }
            .boxed_local(),
        );
    }
}

impl std::fmt::Debug for NavigationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationService")
            .field("stack", &self.inner.stack)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
