//! Optional navigation capabilities implemented by sheets, view-models, and host pages.

use std::{any::Any, future::Future, pin::Pin};

use futures::future::LocalBoxFuture;

use crate::parameters::NavigationParameters;

/// Object-safe boxed future used by async capability methods.
pub type CapabilityFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Synchronous veto over a pending back-navigation.
pub trait ConfirmNavigation {
    /// Returns whether navigation away from this target may proceed.
    ///
    /// The parameters are the ones attached to the pending navigation; keys added here are
    /// forwarded to the lifecycle notifications that follow.
    fn can_navigate(&self, parameters: &mut NavigationParameters) -> bool;
}

/// Asynchronous veto over a pending back-navigation.
///
/// When a target implements both this trait and [`ConfirmNavigation`], only this one is asked.
pub trait ConfirmNavigationAsync {
    /// Resolves to whether navigation away from this target may proceed.
    fn can_navigate_async<'a>(
        &'a self,
        parameters: &'a mut NavigationParameters,
    ) -> CapabilityFuture<'a, bool>;
}

/// Synchronous lifecycle notifications.
pub trait NavigationAware {
    /// Called on the entry that navigation arrived at.
    fn on_navigated_to(&self, parameters: &mut NavigationParameters);

    /// Called on the entry that navigation is leaving, before the destination is notified.
    fn on_navigated_from(&self, parameters: &mut NavigationParameters);
}

/// Asynchronous lifecycle notifications.
///
/// Returned futures are detached onto the host spawner and never awaited by the navigation
/// service: delivery is best-effort and at-most-once, and a later navigation may start before a
/// previous notification finished.
pub trait NavigationAwareAsync {
    /// Arrival notification with a snapshot of the parameters at delivery time.
    fn on_navigated_to_async(&self, parameters: NavigationParameters)
        -> LocalBoxFuture<'static, ()>;

    /// Departure notification with a snapshot of the parameters at delivery time.
    fn on_navigated_from_async(
        &self,
        parameters: NavigationParameters,
    ) -> LocalBoxFuture<'static, ()>;
}

/// Capability query surface shared by sheets, view-models, and host pages.
///
/// Every query defaults to `None`; implementors override the ones they support, typically by
/// returning `Some(self)`.
pub trait NavigationCapabilities: Any {
    /// Synchronous confirmation capability.
    fn as_confirm(&self) -> Option<&dyn ConfirmNavigation> {
        None
    }

    /// Asynchronous confirmation capability.
    fn as_confirm_async(&self) -> Option<&dyn ConfirmNavigationAsync> {
        None
    }

    /// Synchronous lifecycle capability.
    fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
        None
    }

    /// Asynchronous lifecycle capability.
    fn as_navigation_aware_async(&self) -> Option<&dyn NavigationAwareAsync> {
        None
    }
}

impl dyn NavigationCapabilities {
    /// Downcasts to the concrete implementor.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }
}

/// Runs the confirmation protocol on one target.
///
/// The async capability supersedes the sync one; a target with neither always allows.
pub async fn confirm_navigation(
    target: &dyn NavigationCapabilities,
    parameters: &mut NavigationParameters,
) -> bool {
    if let Some(confirm) = target.as_confirm_async() {
        return confirm.can_navigate_async(parameters).await;
    }
    if let Some(confirm) = target.as_confirm() {
        return confirm.can_navigate(parameters);
    }
    true
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct Plain;

    impl NavigationCapabilities for Plain {}

    struct Both {
        sync_calls: Cell<u32>,
        async_answer: bool,
    }

    impl ConfirmNavigation for Both {
        fn can_navigate(&self, _parameters: &mut NavigationParameters) -> bool {
            self.sync_calls.set(self.sync_calls.get() + 1);
            true
        }
    }

    impl ConfirmNavigationAsync for Both {
        fn can_navigate_async<'a>(
            &'a self,
            parameters: &'a mut NavigationParameters,
        ) -> CapabilityFuture<'a, bool> {
            Box::pin(async move {
                parameters.set("confirmed_by", "async");
                self.async_answer
            })
        }
    }

    impl NavigationCapabilities for Both {
        fn as_confirm(&self) -> Option<&dyn ConfirmNavigation> {
            Some(self)
        }

        fn as_confirm_async(&self) -> Option<&dyn ConfirmNavigationAsync> {
            Some(self)
        }
    }

    #[test]
    fn target_without_confirmation_always_allows() {
        let mut parameters = NavigationParameters::new();
        assert!(block_on(confirm_navigation(&Plain, &mut parameters)));
        assert!(parameters.is_empty());
    }

    #[test]
    fn async_confirmation_supersedes_sync() {
        let target = Both {
            sync_calls: Cell::new(0),
            async_answer: false,
        };
        let mut parameters = NavigationParameters::new();

        let allowed = block_on(confirm_navigation(&target, &mut parameters));

        assert!(!allowed);
        assert_eq!(target.sync_calls.get(), 0);
        assert_eq!(
            parameters.get::<String>("confirmed_by").as_deref(),
            Some("async")
        );
    }

    #[test]
    fn downcast_reaches_concrete_type() {
        let target: Box<dyn NavigationCapabilities> = Box::new(Plain);
        assert!(target.downcast_ref::<Plain>().is_some());
        assert!(target.downcast_ref::<Both>().is_none());
    }
}
