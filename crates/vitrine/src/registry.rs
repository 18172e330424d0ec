//! Page-module registry.
//!
//! A page module knows how to recognise one kind of listing page. The host
//! registers every module it ships, then polls on a timer until one of them
//! recognises the page or the attempt budget runs out. Polling is driven by
//! the host's clock; nothing here sleeps.

use std::fmt;

use tracing::{debug, info, warn};
use vitrine_bridge::EngineConfig;

/// One kind of listing page.
pub trait PageModule {
    /// Stable name, used in logs and returned on detection.
    fn name(&self) -> &str;

    /// Whether the page this module handles is present and ready.
    fn detect(&self) -> bool;
}

/// Outcome of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The named module recognised the page.
    Found(String),
    /// Not yet; poll again at the given time.
    Pending { retry_at: u64 },
    /// Every attempt failed.
    GaveUp,
    /// A poll was asked for before `retry_at`.
    TooEarly,
}

/// Registered modules, checked in registration order.
pub struct Registry {
    modules: Vec<Box<dyn PageModule>>,
    interval_ms: u64,
    max_attempts: u32,
    attempts: u32,
    next_at: u64,
    found: Option<usize>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("attempts", &self.attempts)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new(&EngineConfig::default())
    }
}

impl Registry {
    pub fn new(config: &EngineConfig) -> Self {
        Registry {
            modules: Vec::new(),
            interval_ms: config.detect_interval_ms,
            max_attempts: config.detect_max_attempts,
            attempts: 0,
            next_at: 0,
            found: None,
        }
    }

    pub fn register<M: PageModule + 'static>(&mut self, module: M) -> &mut Self {
        debug!(module = module.name(), "page module registered");
        self.modules.push(Box::new(module));
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The module that recognised the page, once one has.
    pub fn active(&self) -> Option<&dyn PageModule> {
        self.found.map(|i| self.modules[i].as_ref())
    }

    /// Asks every module once; the first that recognises the page wins.
    pub fn poll(&mut self, now: u64) -> Detection {
        if let Some(i) = self.found {
            return Detection::Found(self.modules[i].name().to_string());
        }
        if self.attempts >= self.max_attempts {
            return Detection::GaveUp;
        }
        if now < self.next_at {
            return Detection::TooEarly;
        }

        self.attempts += 1;
        if let Some(i) = self.modules.iter().position(|m| m.detect()) {
            let name = self.modules[i].name().to_string();
            info!(module = %name, attempt = self.attempts, "page module detected");
            self.found = Some(i);
            return Detection::Found(name);
        }

        if self.attempts >= self.max_attempts {
            warn!(
                attempts = self.attempts,
                modules = self.modules.len(),
                "no page module recognised the page"
            );
            return Detection::GaveUp;
        }
        self.next_at = now.saturating_add(self.interval_ms);
        Detection::Pending {
            retry_at: self.next_at,
        }
    }

    /// Starts over, e.g. after the host navigated.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.next_at = 0;
        self.found = None;
    }
}

// === Mock implementations for testing ===

/// Module whose readiness is flipped by hand. Clones share the flag.
#[derive(Debug, Clone)]
pub struct MockPageModule {
    name: String,
    ready: std::rc::Rc<std::cell::Cell<bool>>,
}

impl MockPageModule {
    pub fn new(name: impl Into<String>) -> Self {
        MockPageModule {
            name: name.into(),
            ready: Default::default(),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.set(ready);
    }
}

impl PageModule for MockPageModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self) -> bool {
        self.ready.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(attempts: u32) -> EngineConfig {
        EngineConfig {
            detect_interval_ms: 200,
            detect_max_attempts: attempts,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn first_ready_module_wins() {
        let bazaar = MockPageModule::new("bazaar");
        let showcase = MockPageModule::new("showcase");
        bazaar.set_ready(true);
        showcase.set_ready(true);

        let mut registry = Registry::new(&config(5));
        registry.register(showcase.clone()).register(bazaar.clone());
        assert_eq!(registry.poll(0), Detection::Found("showcase".into()));
        assert_eq!(registry.active().map(|m| m.name()), Some("showcase"));
    }

    #[test]
    fn polls_respect_interval() {
        let module = MockPageModule::new("grid");
        let mut registry = Registry::new(&config(5));
        registry.register(module.clone());

        assert_eq!(registry.poll(0), Detection::Pending { retry_at: 200 });
        assert_eq!(registry.poll(100), Detection::TooEarly);
        assert_eq!(registry.attempts(), 1);

        module.set_ready(true);
        assert_eq!(registry.poll(200), Detection::Found("grid".into()));
        assert_eq!(registry.attempts(), 2);
    }

    #[test]
    fn gives_up_after_budget() {
        let mut registry = Registry::new(&config(2));
        registry.register(MockPageModule::new("never"));
        assert!(matches!(registry.poll(0), Detection::Pending { .. }));
        assert_eq!(registry.poll(200), Detection::GaveUp);
        assert_eq!(registry.poll(400), Detection::GaveUp);

        registry.reset();
        assert!(matches!(registry.poll(600), Detection::Pending { .. }));
    }

    #[test]
    fn empty_registry_gives_up() {
        let mut registry = Registry::new(&config(1));
        assert!(registry.is_empty());
        assert_eq!(registry.poll(0), Detection::GaveUp);
    }
}
