//! TestSheet sheets and a shared journal for service tests.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use futures::{channel::oneshot, future::LocalBoxFuture, FutureExt};
use sheet_contract::{
    CapabilityFuture, ConfirmNavigation, ConfirmNavigationAsync, NavigationAware,
    NavigationAwareAsync, NavigationCapabilities, NavigationParameters, Sheet, SheetOptions,
    ViewModel,
};

#[derive(Clone, Default)]
/// Ordered record of every callback test sheets received, shared across them.
pub(crate) struct Journal {
    inner: Rc<RefCell<JournalState>>,
}

#[derive(Default)]
struct JournalState {
    events: Vec<String>,
    deliveries: Vec<(String, NavigationParameters)>,
}

impl Journal {
    pub(crate) fn record(&self, event: impl Into<String>) {
        self.inner.borrow_mut().events.push(event.into());
    }

    fn deliver(&self, event: String, parameters: &NavigationParameters) {
        let mut inner = self.inner.borrow_mut();
        inner.events.push(event.clone());
        inner.deliveries.push((event, parameters.clone()));
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.inner.borrow().events.clone()
    }

    pub(crate) fn take_events(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.borrow_mut().events)
    }

    /// Parameters of the latest delivery recorded as `event`.
    pub(crate) fn delivered(&self, event: &str) -> Option<NavigationParameters> {
        self.inner
            .borrow()
            .deliveries
            .iter()
            .rev()
            .find(|(recorded, _)| recorded == event)
            .map(|(_, parameters)| parameters.clone())
    }
}

#[derive(Clone, Default)]
/// How a test sheet answers confirmation requests.
pub(crate) enum Confirm {
    #[default]
    Absent,
    Sync(Rc<Cell<bool>>),
    Async(Rc<Cell<bool>>),
    /// Resolves with whatever the test sends through the paired sender.
    Deferred(Rc<RefCell<Option<oneshot::Receiver<bool>>>>),
}

impl Confirm {
    pub(crate) fn sync(allow: bool) -> (Self, Rc<Cell<bool>>) {
        let flag = Rc::new(Cell::new(allow));
        (Self::Sync(flag.clone()), flag)
    }

    pub(crate) fn asynchronous(allow: bool) -> (Self, Rc<Cell<bool>>) {
        let flag = Rc::new(Cell::new(allow));
        (Self::Async(flag.clone()), flag)
    }

    pub(crate) fn deferred() -> (Self, oneshot::Sender<bool>) {
        let (sender, receiver) = oneshot::channel();
        (Self::Deferred(Rc::new(RefCell::new(Some(receiver)))), sender)
    }
}

#[derive(Clone)]
/// Sheet, view-model, or host page with switchable capabilities.
pub(crate) struct TestSheet {
    label: &'static str,
    journal: Journal,
    confirm: Confirm,
    aware: bool,
    aware_async: bool,
    options: SheetOptions,
    bound: Rc<RefCell<Option<&'static str>>>,
}

impl TestSheet {
    pub(crate) fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            journal: journal.clone(),
            confirm: Confirm::Absent,
            aware: true,
            aware_async: false,
            options: SheetOptions::default(),
            bound: Rc::new(RefCell::new(None)),
        }
    }

    pub(crate) fn confirm(mut self, confirm: Confirm) -> Self {
        self.confirm = confirm;
        self
    }

    pub(crate) fn unaware(mut self) -> Self {
        self.aware = false;
        self
    }

    pub(crate) fn aware_async(mut self) -> Self {
        self.aware_async = true;
        self
    }

    pub(crate) fn with_options(mut self, options: SheetOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn label(&self) -> &'static str {
        self.label
    }

    /// Label of the view-model bound through the binding context.
    pub(crate) fn bound_label(&self) -> Option<&'static str> {
        *self.bound.borrow()
    }
}

impl ConfirmNavigation for TestSheet {
    fn can_navigate(&self, parameters: &mut NavigationParameters) -> bool {
        self.journal.record(format!("{}.can_navigate", self.label));
        parameters.set(format!("{}_confirmed", self.label), true);
        match &self.confirm {
            Confirm::Sync(allow) => allow.get(),
            _ => true,
        }
    }
}

impl ConfirmNavigationAsync for TestSheet {
    fn can_navigate_async<'a>(
        &'a self,
        parameters: &'a mut NavigationParameters,
    ) -> CapabilityFuture<'a, bool> {
        Box::pin(async move {
            self.journal.record(format!("{}.can_navigate_async", self.label));
            parameters.set(format!("{}_confirmed", self.label), true);
            match &self.confirm {
                Confirm::Async(allow) => allow.get(),
                Confirm::Deferred(receiver) => {
                    let pending = receiver.borrow_mut().take();
                    match pending {
                        Some(receiver) => receiver.await.unwrap_or(false),
                        None => true,
                    }
                }
                _ => true,
            }
        })
    }
}

impl NavigationAware for TestSheet {
    fn on_navigated_to(&self, parameters: &mut NavigationParameters) {
        self.journal.deliver(format!("{}.to", self.label), parameters);
    }

    fn on_navigated_from(&self, parameters: &mut NavigationParameters) {
        parameters.set(format!("{}_left", self.label), true);
        self.journal.deliver(format!("{}.from", self.label), parameters);
    }
}

impl NavigationAwareAsync for TestSheet {
    fn on_navigated_to_async(
        &self,
        parameters: NavigationParameters,
    ) -> LocalBoxFuture<'static, ()> {
        let journal = self.journal.clone();
        let event = format!("{}.to_async", self.label);
        async move { journal.deliver(event, &parameters) }.boxed_local()
    }

    fn on_navigated_from_async(
        &self,
        parameters: NavigationParameters,
    ) -> LocalBoxFuture<'static, ()> {
        let journal = self.journal.clone();
        let event = format!("{}.from_async", self.label);
        async move { journal.deliver(event, &parameters) }.boxed_local()
    }
}

impl NavigationCapabilities for TestSheet {
    fn as_confirm(&self) -> Option<&dyn ConfirmNavigation> {
        matches!(self.confirm, Confirm::Sync(_)).then_some(self as &dyn ConfirmNavigation)
    }

    fn as_confirm_async(&self) -> Option<&dyn ConfirmNavigationAsync> {
        matches!(self.confirm, Confirm::Async(_) | Confirm::Deferred(_))
            .then_some(self as &dyn ConfirmNavigationAsync)
    }

    fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
        self.aware.then_some(self as &dyn NavigationAware)
    }

    fn as_navigation_aware_async(&self) -> Option<&dyn NavigationAwareAsync> {
        self.aware_async.then_some(self as &dyn NavigationAwareAsync)
    }
}

impl Sheet for TestSheet {
    fn options(&self) -> SheetOptions {
        self.options
    }

    fn set_binding_context(&self, view_model: Rc<dyn ViewModel>) {
        let capabilities: &dyn NavigationCapabilities = view_model.as_ref();
        let label = capabilities.downcast_ref::<TestSheet>().map(TestSheet::label);
        *self.bound.borrow_mut() = label;
    }
}

impl ViewModel for TestSheet {}
