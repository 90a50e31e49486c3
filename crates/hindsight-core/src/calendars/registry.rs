//! Name-keyed calendar lookup.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::{Calendar, JointCalendar, TargetCalendar, UkCalendar, UsCalendar, WeekendCalendar};
use crate::error::{CoreError, CoreResult};

static BUILTIN_REGISTRY: OnceLock<CalendarRegistry> = OnceLock::new();

/// Resolves holiday calendar names (as accepted by pricing contexts) to calendars.
///
/// Names are case-insensitive. The built-in entries are:
///
/// | Names | Calendar |
/// |-------|----------|
/// | `NYC`, `USD` | [`UsCalendar`] |
/// | `LDN`, `GBP` | [`UkCalendar`] |
/// | `TARGET`, `EUR` | [`TargetCalendar`] |
/// | `WEEKEND` | [`WeekendCalendar`] |
#[derive(Clone, Default)]
pub struct CalendarRegistry {
    calendars: HashMap<String, Arc<dyn Calendar>>,
}

impl CalendarRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in calendars.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let us: Arc<dyn Calendar> = Arc::new(UsCalendar);
        let uk: Arc<dyn Calendar> = Arc::new(UkCalendar);
        let target: Arc<dyn Calendar> = Arc::new(TargetCalendar);

        registry.register_shared("NYC", Arc::clone(&us));
        registry.register_shared("USD", us);
        registry.register_shared("LDN", Arc::clone(&uk));
        registry.register_shared("GBP", uk);
        registry.register_shared("TARGET", Arc::clone(&target));
        registry.register_shared("EUR", target);
        registry.register("WEEKEND", WeekendCalendar);
        registry
    }

    /// The process-wide registry of built-in calendars.
    pub fn global() -> &'static CalendarRegistry {
        BUILTIN_REGISTRY.get_or_init(CalendarRegistry::with_builtins)
    }

    /// Registers a calendar under a name, replacing any previous entry.
    pub fn register(&mut self, name: &str, calendar: impl Calendar + 'static) {
        self.register_shared(name, Arc::new(calendar));
    }

    /// Registers an already shared calendar under a name.
    pub fn register_shared(&mut self, name: &str, calendar: Arc<dyn Calendar>) {
        self.calendars.insert(name.trim().to_uppercase(), calendar);
    }

    /// Looks up a single calendar.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Calendar>> {
        self.calendars.get(&name.trim().to_uppercase()).cloned()
    }

    /// Builds the joint calendar for a set of names.
    ///
    /// An empty set yields a weekend-only calendar.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownCalendar` for the first name not registered.
    pub fn joint<S: AsRef<str>>(&self, names: &[S]) -> CoreResult<JointCalendar> {
        let calendars = names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .ok_or_else(|| CoreError::unknown_calendar(name.as_ref()))
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(JointCalendar::new(calendars))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.calendars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for CalendarRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarRegistry")
            .field("names", &self.names())
            .finish()
    }
}
