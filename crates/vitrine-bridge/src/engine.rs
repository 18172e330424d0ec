//! Engine activation and the handle the host drives.
//!
//! ```text
//! host event ─► EngineHandle ─┬─► PredicateStore (own dimensions)
//!                             └─► SyncBridge ─► native widget ─► pull
//!                                     │
//!               FacetCounter ◄────────┘
//!                     │
//!               Projector ─► render callback / node visibility
//! ```

use std::fmt;

use serde::Serialize;
use tracing::debug;
use vitrine_seeker::{
    ActiveTag, Dimension, DimensionSet, Extractor, FacetEngine, FacetSet, FacetValue, Facetable,
    PredicateStore, Range, TagKind,
};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::native::{Interceptor, NativeCall, NativeWidget};
use crate::project::{Projection, Projector};
use crate::sync::{MirrorState, SyncBridge};

/// Everything the host hands over at activation.
pub struct HostContext<T> {
    items: Vec<T>,
    dimensions: DimensionSet,
    projector: Projector<T>,
    native: Option<(Box<dyn NativeWidget>, Interceptor)>,
    clock: Box<dyn Clock>,
    config: EngineConfig,
}

impl<T: Facetable> HostContext<T> {
    pub fn new(items: Vec<T>, dimensions: DimensionSet, projector: Projector<T>) -> Self {
        HostContext {
            items,
            dimensions,
            projector,
            native: None,
            clock: Box::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    /// Validates raw dimension definitions first.
    pub fn from_dimensions(
        items: Vec<T>,
        dimensions: Vec<Dimension>,
        projector: Projector<T>,
    ) -> Result<Self> {
        Ok(Self::new(items, DimensionSet::new(dimensions)?, projector))
    }

    /// Overlays a native widget. Its dimensions are driven through it.
    pub fn native<W>(mut self, widget: W, interceptor: Interceptor) -> Self
    where
        W: NativeWidget + 'static,
    {
        self.native = Some((Box::new(widget), interceptor));
        self
    }

    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
}

/// Summary returned by every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Update {
    pub active: bool,
    pub matched: usize,
    pub total: usize,
    pub projection: Projection,
}

/// Starts an engine over the host's items.
///
/// Facets are extracted once here. If a native widget is supplied its current
/// state is pulled before the handle is returned.
pub fn activate<T: Facetable>(ctx: HostContext<T>) -> EngineHandle<T> {
    let HostContext {
        items,
        dimensions,
        projector,
        native,
        clock,
        config,
    } = ctx;

    let extractor = Extractor::new().min_distinct(config.min_distinct_values);
    let engine = FacetEngine::with_extractor(items, dimensions, extractor);
    let bridge = match native {
        Some((widget, interceptor)) => SyncBridge::new(widget, interceptor),
        None => SyncBridge::detached(),
    };
    debug!(
        items = engine.total(),
        facets = engine.facets().len(),
        native = bridge.is_attached(),
        "engine activated"
    );

    let mut handle = EngineHandle {
        engine,
        bridge,
        projector,
        clock,
        text_input: Debouncer::new(config.search_debounce_ms),
        range_input: Debouncer::new(config.range_debounce_ms),
        config,
    };
    if handle.bridge.is_attached() {
        let mut store = handle.engine.store().clone();
        if handle.bridge.pull(&mut store) {
            handle.engine.replace_store(store);
            handle.project();
        }
    }
    handle
}

/// A running engine. Dropping it without [`deactivate`](Self::deactivate)
/// leaves the host page as the last projection left it.
pub struct EngineHandle<T> {
    engine: FacetEngine<T>,
    bridge: SyncBridge,
    projector: Projector<T>,
    clock: Box<dyn Clock>,
    text_input: Debouncer<String, String>,
    range_input: Debouncer<String, Range>,
    config: EngineConfig,
}

impl<T: Facetable> EngineHandle<T> {
    // ========================================================================
    // Selections
    // ========================================================================

    /// Toggles an option, through the native widget when it owns the dimension.
    pub fn toggle(&mut self, dimension: &str, value: impl Into<FacetValue>) -> Update {
        let value = value.into();
        if self.bridge.owns(dimension) {
            self.with_native(|bridge, store| {
                bridge.toggle(dimension, &value, store);
            });
        } else {
            self.engine.toggle(dimension, value);
        }
        self.project()
    }

    /// Applies range bounds immediately, dropping any pending typed input.
    pub fn set_range(&mut self, dimension: &str, min: Option<f64>, max: Option<f64>) -> Update {
        self.range_input.cancel(&dimension.to_string());
        self.engine.set_range(dimension, min, max);
        self.project()
    }

    /// Queues typed range bounds; applied by [`tick`](Self::tick).
    pub fn input_range(&mut self, dimension: &str, min: Option<f64>, max: Option<f64>) {
        let now = self.clock.now_ms();
        self.range_input
            .push(dimension.to_string(), Range::new(min, max), now);
    }

    /// Queues a search query; applied by [`tick`](Self::tick).
    pub fn input_text(&mut self, dimension: &str, query: &str) {
        let now = self.clock.now_ms();
        self.text_input
            .push(dimension.to_string(), query.to_string(), now);
    }

    /// Applies every debounced input whose quiet period has elapsed.
    pub fn tick(&mut self) -> Option<Update> {
        let now = self.clock.now_ms();
        let texts = self.text_input.due(now);
        let ranges = self.range_input.due(now);
        if texts.is_empty() && ranges.is_empty() {
            return None;
        }
        for (dimension, query) in texts {
            self.engine.set_text(&dimension, &query);
        }
        for (dimension, range) in ranges {
            self.engine.set_range(&dimension, range.min, range.max);
        }
        Some(self.project())
    }

    /// Earliest time [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.text_input.next_deadline(), self.range_input.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn clear(&mut self, dimension: &str) -> Update {
        let key = dimension.to_string();
        self.text_input.cancel(&key);
        self.range_input.cancel(&key);
        if self.bridge.owns(dimension) {
            self.with_native(|bridge, store| bridge.push_clear(dimension, store));
        } else {
            self.engine.clear(dimension);
        }
        self.project()
    }

    /// Clears every predicate. Native dimensions are cleared through the
    /// widget and keep whatever state it reports back.
    pub fn clear_all(&mut self) -> Update {
        self.text_input.cancel_all();
        self.range_input.cancel_all();
        let mut store = self.engine.store().clone();
        self.bridge.clear_all(&mut store);
        let own: Vec<String> = store
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !self.bridge.owns(key))
            .map(str::to_string)
            .collect();
        for key in own {
            store.clear(&key);
        }
        self.engine.replace_store(store);
        self.project()
    }

    /// Removes one entry of the active-filter bar.
    pub fn remove_tag(&mut self, tag: &ActiveTag) -> Update {
        match &tag.kind {
            TagKind::Value(value) if self.bridge.owns(&tag.dimension) => {
                self.with_native(|bridge, store| {
                    bridge.push(&tag.dimension, value, false, store);
                });
            }
            _ => self.engine.remove_tag(tag),
        }
        self.project()
    }

    // ========================================================================
    // Native widget
    // ========================================================================

    /// Runs a native entry point on the host's behalf, wrapped in the hooks.
    pub fn native_call(&mut self, call: NativeCall) -> Update {
        self.with_native(|bridge, store| bridge.intercept(call, store));
        self.project()
    }

    /// Re-reads the widget after the host saw it change on its own.
    pub fn notify_external_change(&mut self) -> Update {
        self.with_native(|bridge, store| {
            bridge.notify_external_change(store);
        });
        self.project()
    }

    fn with_native<F>(&mut self, f: F)
    where
        F: FnOnce(&mut SyncBridge, &mut PredicateStore),
    {
        let mut store = self.engine.store().clone();
        f(&mut self.bridge, &mut store);
        if &store != self.engine.store() {
            self.engine.replace_store(store);
        }
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Recounts and re-projects the current result, e.g. once edition names
    /// have been looked up.
    pub fn refresh(&mut self) -> Update {
        self.engine.recount();
        self.project()
    }

    fn project(&mut self) -> Update {
        let filtered = self.engine.filtered();
        let projection =
            self.projector
                .apply(self.engine.items(), &filtered, self.engine.is_active());
        Update {
            active: self.engine.is_active(),
            matched: self.engine.matched(),
            total: self.engine.total(),
            projection,
        }
    }

    pub fn facets(&self) -> &FacetSet {
        self.engine.facets()
    }

    pub fn active_tags(&self) -> Vec<ActiveTag> {
        self.engine.active_tags()
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    pub fn matched(&self) -> usize {
        self.engine.matched()
    }

    pub fn matched_ids(&self) -> Vec<String> {
        self.engine.matched_ids()
    }

    pub fn store(&self) -> &PredicateStore {
        self.engine.store()
    }

    /// Mirrored native checkbox state.
    pub fn mirror(&self) -> &MirrorState {
        self.bridge.mirror()
    }

    /// Count the native widget prints for a value it owns.
    pub fn native_count(&self, dimension: &str, value: impl Into<FacetValue>) -> Option<usize> {
        self.bridge.native_count(dimension, &value.into())
    }

    pub fn bridge(&self) -> &SyncBridge {
        &self.bridge
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tears the engine down: restores host pagination, unhooks the native
    /// widget and drops all state.
    pub fn deactivate(mut self) {
        self.text_input.cancel_all();
        self.range_input.cancel_all();
        self.projector.release();
        self.bridge.detach();
        debug!("engine deactivated");
    }
}

impl<T> fmt::Debug for EngineHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &self.engine)
            .field("bridge", &self.bridge)
            .field("projector", &self.projector)
            .field("config", &self.config)
            .finish()
    }
}
