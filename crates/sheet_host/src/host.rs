//! Host bundle injected into the navigation runtime.

use std::rc::Rc;

use crate::{
    presenter::{NoopSheetPresenter, SheetPresenter},
    spawner::{InlineSpawner, TaskSpawner},
    timer::{HostTimer, PendingTimer},
};

/// Platform service bundle handed to the navigation service.
///
/// Host selection happens before this bundle reaches the runtime, which keeps navigation logic
/// independent of the platform surface.
#[derive(Clone)]
pub struct SheetHost {
    /// Platform surface driver.
    pub presenter: Rc<dyn SheetPresenter>,
    /// Timer bounding the window-attachment wait.
    pub timer: Rc<dyn HostTimer>,
    /// Spawner for fire-and-forget navigation calls and async lifecycle hooks.
    pub spawner: Rc<dyn TaskSpawner>,
}

impl SheetHost {
    /// Bundles host services.
    pub fn new(
        presenter: Rc<dyn SheetPresenter>,
        timer: Rc<dyn HostTimer>,
        spawner: Rc<dyn TaskSpawner>,
    ) -> Self {
        Self {
            presenter,
            timer,
            spawner,
        }
    }

    /// Host without a surface: attachment is immediate and detached work runs inline.
    pub fn headless() -> Self {
        Self::new(
            Rc::new(NoopSheetPresenter),
            Rc::new(PendingTimer),
            Rc::new(InlineSpawner::new()),
        )
    }

    /// Replaces the presenter.
    pub fn with_presenter(mut self, presenter: Rc<dyn SheetPresenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Replaces the timer.
    pub fn with_timer(mut self, timer: Rc<dyn HostTimer>) -> Self {
        self.timer = timer;
        self
    }

    /// Replaces the spawner.
    pub fn with_spawner(mut self, spawner: Rc<dyn TaskSpawner>) -> Self {
        self.spawner = spawner;
        self
    }
}
