//! Reconciliation of presenter notifications with the logical stack.

use sheet_contract::{EntryId, NavigationError, NavigationParameters, NavigationResult, SheetState};
use sheet_host::PresenterEvent;

use super::{Dismissal, NavigationService};

impl NavigationService {
    /// Presenter callback: the surface of `entry_id` closed on its own.
    ///
    /// The notification is queued as an episode on the host spawner.
    pub fn report_closed(&self, entry_id: EntryId) {
        self.dispatch_event(entry_id, PresenterEvent::Closed);
    }

    /// Presenter callback: the user dragged `entry_id` to `state`.
    pub fn report_state_changed(&self, entry_id: EntryId, state: SheetState) {
        self.dispatch_event(entry_id, PresenterEvent::StateChanged(state));
    }

    /// Presenter callback: a user gesture asked to dismiss `entry_id`.
    pub fn report_canceled_by_user(&self, entry_id: EntryId) {
        self.dispatch_event(entry_id, PresenterEvent::CanceledByUser);
    }

    /// Applies one presenter notification under the episode gate.
    ///
    /// Notifications for entries that are gone, no longer on top, or already being dismissed by
    /// the service yield [`NavigationResult::SKIPPED`]. A buried entry whose surface closed is
    /// marked and reopened once it is back on top. A dismissal of a cancelable entry runs
    /// the confirmation protocol and, when allowed, completes exactly like a back navigation. A
    /// vetoed dismissal, or any dismissal of a non-cancelable entry, puts the surface back at its
    /// prior state and yields [`NavigationResult::CANCELLED`].
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::Presenter`] when restoring or finalizing the surface fails.
    pub async fn handle_presenter_event(
        &self,
        entry_id: EntryId,
        event: PresenterEvent,
    ) -> Result<NavigationResult, NavigationError> {
        let _episode = self.begin_episode().await;
        if !self.accepts_event(entry_id, event) {
            return Ok(NavigationResult::SKIPPED);
        }
        match event {
            PresenterEvent::StateChanged(state) => self.apply_reported_state(entry_id, state),
            PresenterEvent::Closed | PresenterEvent::CanceledByUser => {
                self.reconcile_dismissal(entry_id, event).await
            }
        }
    }

    fn dispatch_event(&self, entry_id: EntryId, event: PresenterEvent) {
        let service = self.clone();
        self.spawn_episode(event.token(), async move {
            service.handle_presenter_event(entry_id, event).await
        });
    }

    fn accepts_event(&self, entry_id: EntryId, event: PresenterEvent) -> bool {
        let mut stack = self.inner.stack.borrow_mut();
        let on_top = stack.is_top(entry_id);
        let reason = match stack.get_mut(entry_id) {
            None => "unknown entry",
            Some(entry) if !entry.is_subscribed() => "entry unsubscribed",
            Some(entry) if !on_top && event == PresenterEvent::Closed => {
                entry.set_surface_dismissed(true);
                tracing::info!(
                    entry = %entry_id,
                    "buried sheet closed; reopening when it resurfaces"
                );
                return false;
            }
            Some(_) if !on_top => "entry not on top",
            Some(_) => return true,
        };
        tracing::debug!(
            entry = %entry_id,
            event = event.token(),
            reason,
            "presenter notification ignored"
        );
        false
    }

    fn apply_reported_state(
        &self,
        entry_id: EntryId,
        state: SheetState,
    ) -> Result<NavigationResult, NavigationError> {
        let outcome = {
            let mut stack = self.inner.stack.borrow_mut();
            let entry = stack.current_mut()?;
            entry
                .detents_mut()
                .select(state)
                .map_err(|_| entry.state())
        };
        match outcome {
            Ok(true) => {
                tracing::debug!(entry = %entry_id, %state, "adopted presenter state");
                Ok(NavigationResult::COMPLETED)
            }
            Ok(false) => Ok(NavigationResult::SKIPPED),
            Err(logical) => {
                tracing::warn!(
                    entry = %entry_id,
                    reported = %state,
                    restored = %logical,
                    "presenter reported a disallowed state"
                );
                self.inner.host.presenter.set_current_state(entry_id, logical);
                Ok(NavigationResult::SKIPPED)
            }
        }
    }

    async fn reconcile_dismissal(
        &self,
        entry_id: EntryId,
        event: PresenterEvent,
    ) -> Result<NavigationResult, NavigationError> {
        let (cancelable, prior, targets) = {
            let stack = self.inner.stack.borrow();
            let entry = stack.current()?;
            (entry.is_cancelable(), entry.state(), entry.targets())
        };
        let mut parameters = NavigationParameters::new();
        let allowed = cancelable && self.confirm(&targets, &mut parameters).await;
        if !allowed {
            tracing::info!(
                entry = %entry_id,
                event = event.token(),
                cancelable,
                "dismissal vetoed; restoring presentation"
            );
            self.restore_presentation(entry_id, event, prior).await?;
            return Ok(NavigationResult::CANCELLED);
        }
        tracing::info!(entry = %entry_id, event = event.token(), "accepted user dismissal");
        self.complete_back_navigation(entry_id, parameters, Dismissal::AlreadyDismissed)
            .await
    }

    /// Brings the surface back to `prior` after a refused dismissal.
    ///
    /// A cancel gesture leaves the surface in place, so moving it back to its detent is enough. A
    /// surface that already reported closed is opened again.
    async fn restore_presentation(
        &self,
        entry_id: EntryId,
        event: PresenterEvent,
        prior: SheetState,
    ) -> Result<(), NavigationError> {
        if event != PresenterEvent::Closed {
            self.inner.host.presenter.set_current_state(entry_id, prior);
            return Ok(());
        }
        let request = self.inner.stack.borrow().current()?.present_request(false);
        self.inner.host.presenter.open(request).await?;
        Ok(())
    }
}
