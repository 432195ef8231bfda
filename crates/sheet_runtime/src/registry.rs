//! Registration table mapping sheet names and types to factories.
//!
//! The table is written once through [`SheetRegistryBuilder`] at startup and read-only afterwards;
//! services share it behind an `Rc`.

use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    rc::Rc,
};

use sheet_contract::{NavigationError, Sheet, SheetOptions, ViewModel};

use crate::config::NavigationConfig;

type SheetFactory = Box<dyn Fn() -> Rc<dyn Sheet>>;
type ViewModelFactory = Box<dyn Fn() -> Rc<dyn ViewModel>>;
type ConfigureFn = Box<dyn Fn(&mut SheetOptions)>;

/// One registered sheet: factory, optional view-model factory, optional configure callback.
pub struct SheetRegistration {
    name: String,
    sheet_type: TypeId,
    sheet_type_name: &'static str,
    sheet_factory: SheetFactory,
    view_model_factory: Option<ViewModelFactory>,
    configure: Option<ConfigureFn>,
}

impl SheetRegistration {
    /// Registers sheet type `S` under `name`.
    pub fn new<S, F>(name: impl Into<String>, factory: F) -> Self
    where
        S: Sheet + 'static,
        F: Fn() -> S + 'static,
    {
        Self {
            name: name.into(),
            sheet_type: TypeId::of::<S>(),
            sheet_type_name: type_name::<S>(),
            sheet_factory: Box::new(move || -> Rc<dyn Sheet> { Rc::new(factory()) }),
            view_model_factory: None,
            configure: None,
        }
    }

    /// Registers sheet type `S` under its type name, for type-based navigation.
    pub fn typed<S, F>(factory: F) -> Self
    where
        S: Sheet + 'static,
        F: Fn() -> S + 'static,
    {
        Self::new(type_name::<S>(), factory)
    }

    /// Creates a fresh view-model of type `VM` for every navigation to this sheet.
    pub fn with_view_model<VM, F>(mut self, factory: F) -> Self
    where
        VM: ViewModel + 'static,
        F: Fn() -> VM + 'static,
    {
        self.view_model_factory = Some(Box::new(move || -> Rc<dyn ViewModel> {
            Rc::new(factory())
        }));
        self
    }

    /// Adjusts presentation options after the sheet's own options and its manifest applied.
    pub fn configure(mut self, configure: impl Fn(&mut SheetOptions) + 'static) -> Self {
        self.configure = Some(Box::new(configure));
        self
    }

    /// Registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self, config: &NavigationConfig) -> ResolvedSheet {
        let sheet = (self.sheet_factory)();
        let view_model = self.view_model_factory.as_ref().map(|factory| factory());
        let mut options = sheet.options();
        if let Some(manifest) = config.manifest(&self.name) {
            manifest.apply(&mut options);
        }
        if let Some(configure) = &self.configure {
            configure(&mut options);
        }
        ResolvedSheet {
            name: self.name.clone(),
            sheet,
            view_model,
            options,
        }
    }
}

impl std::fmt::Debug for SheetRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetRegistration")
            .field("name", &self.name)
            .field("sheet_type", &self.sheet_type_name)
            .field("has_view_model", &self.view_model_factory.is_some())
            .field("has_configure", &self.configure.is_some())
            .finish()
    }
}

/// Fresh sheet instance with its view-model and final presentation options.
pub struct ResolvedSheet {
    /// Registration name.
    pub name: String,
    /// New sheet instance.
    pub sheet: Rc<dyn Sheet>,
    /// New view-model instance, when one is registered.
    pub view_model: Option<Rc<dyn ViewModel>>,
    /// Options after sheet defaults, manifest, and configure callback.
    pub options: SheetOptions,
}

#[derive(Default)]
/// Single writer of a [`SheetRegistry`].
pub struct SheetRegistryBuilder {
    registrations: Vec<SheetRegistration>,
}

impl SheetRegistryBuilder {
    /// Adds a registration. A later registration under the same name replaces the earlier one.
    pub fn register(mut self, registration: SheetRegistration) -> Self {
        if let Some(index) = self
            .registrations
            .iter()
            .position(|existing| existing.name == registration.name)
        {
            tracing::warn!(sheet = %registration.name, "replacing existing sheet registration");
            self.registrations.remove(index);
        }
        self.registrations.push(registration);
        self
    }

    /// Freezes the table.
    pub fn build(self) -> SheetRegistry {
        let mut by_type = HashMap::new();
        let mut by_name = HashMap::new();
        for registration in self.registrations {
            by_type
                .entry(registration.sheet_type)
                .or_insert_with(|| registration.name.clone());
            by_name.insert(registration.name.clone(), registration);
        }
        SheetRegistry { by_name, by_type }
    }
}

/// Read-only registration table.
///
/// Type lookups resolve to the first registration made for that sheet type.
#[derive(Debug)]
pub struct SheetRegistry {
    by_name: HashMap<String, SheetRegistration>,
    by_type: HashMap<TypeId, String>,
}

impl SheetRegistry {
    /// Starts a new table.
    pub fn builder() -> SheetRegistryBuilder {
        SheetRegistryBuilder::default()
    }

    /// Returns whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates the sheet registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::SheetNotRegistered`] for unknown names.
    pub fn resolve(
        &self,
        name: &str,
        config: &NavigationConfig,
    ) -> Result<ResolvedSheet, NavigationError> {
        self.by_name
            .get(name)
            .map(|registration| registration.instantiate(config))
            .ok_or_else(|| NavigationError::SheetNotRegistered(name.to_string()))
    }

    /// Instantiates the sheet registered for type `S`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::TypeNotRegistered`] when no registration produces `S`.
    pub fn resolve_type<S: Sheet + 'static>(
        &self,
        config: &NavigationConfig,
    ) -> Result<ResolvedSheet, NavigationError> {
        self.by_type
            .get(&TypeId::of::<S>())
            .and_then(|name| self.by_name.get(name))
            .map(|registration| registration.instantiate(config))
            .ok_or(NavigationError::TypeNotRegistered(type_name::<S>()))
    }
}
