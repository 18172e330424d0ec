//! Two-way sync between the predicate store and a native widget.
//!
//! For dimensions the widget owns, the store is a read-through cache: every
//! change is pushed through the widget's entry points, and after each call
//! returns the bridge reads every control back and overwrites both its mirror
//! and the store's predicates for those dimensions.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};
use vitrine_seeker::{FacetValue, PredicateStore};

use crate::native::{Capabilities, Interceptor, NativeCall, NativeOption, NativeWidget};

/// The engine-side copy of the widget's checkbox state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorState {
    checked: BTreeMap<String, bool>,
}

impl MirrorState {
    /// Checked state of a control as last read back.
    pub fn is_checked(&self, option_id: &str) -> bool {
        self.checked.get(option_id).copied().unwrap_or(false)
    }

    pub fn checked_ids(&self) -> impl Iterator<Item = &str> {
        self.checked
            .iter()
            .filter(|(_, checked)| **checked)
            .map(|(id, _)| id.as_str())
    }
}

/// Adapter between a [`PredicateStore`] and a [`NativeWidget`].
pub struct SyncBridge {
    widget: Option<Box<dyn NativeWidget>>,
    interceptor: Interceptor,
    options: Vec<NativeOption>,
    dimensions: BTreeSet<String>,
    capabilities: Capabilities,
    mirror: MirrorState,
}

impl SyncBridge {
    /// Wraps a widget. A widget without an `apply` entry point leaves the
    /// bridge detached, and the engine then filters those dimensions itself.
    pub fn new(widget: Box<dyn NativeWidget>, interceptor: Interceptor) -> Self {
        let capabilities = widget.capabilities();
        if !capabilities.apply {
            warn!("native widget has no apply entry point; sync disabled");
            return SyncBridge::detached();
        }
        let options = widget.options();
        let dimensions = options.iter().map(|o| o.dimension.clone()).collect();
        debug!(options = options.len(), "native widget attached");
        SyncBridge {
            widget: Some(widget),
            interceptor,
            options,
            dimensions,
            capabilities,
            mirror: MirrorState::default(),
        }
    }

    /// A bridge with no widget; every operation is a no-op.
    pub fn detached() -> Self {
        SyncBridge {
            widget: None,
            interceptor: Interceptor::default(),
            options: Vec::new(),
            dimensions: BTreeSet::new(),
            capabilities: Capabilities {
                apply: false,
                clear_dimension: false,
            },
            mirror: MirrorState::default(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.widget.is_some()
    }

    /// Returns `true` if the widget is the source of truth for `dimension`.
    pub fn owns(&self, dimension: &str) -> bool {
        self.widget.is_some() && self.dimensions.contains(dimension)
    }

    pub fn options(&self) -> &[NativeOption] {
        &self.options
    }

    pub fn mirror(&self) -> &MirrorState {
        &self.mirror
    }

    /// Count the widget itself prints next to a value, as last read back.
    pub fn native_count(&self, dimension: &str, value: &FacetValue) -> Option<usize> {
        self.options
            .iter()
            .find(|o| o.dimension == dimension && &o.value == value)
            .and_then(|o| o.count)
    }

    /// Control id for a dimension value.
    pub fn option_id(&self, dimension: &str, value: &FacetValue) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.dimension == dimension && &o.value == value)
            .map(|o| o.id.as_str())
    }

    // ========================================================================
    // Push
    // ========================================================================

    /// Sets one control through the widget and reads state back.
    ///
    /// Returns `false` if the widget has no control for the value.
    pub fn push(
        &mut self,
        dimension: &str,
        value: &FacetValue,
        checked: bool,
        store: &mut PredicateStore,
    ) -> bool {
        let Some(option_id) = self.option_id(dimension, value).map(str::to_string) else {
            debug!(dimension, value = %value, "no native control for value");
            return false;
        };
        self.intercept(
            NativeCall::Apply {
                dimension: dimension.to_string(),
                option_id,
                checked,
            },
            store,
        );
        true
    }

    /// Flips one control relative to the mirrored state.
    pub fn toggle(&mut self, dimension: &str, value: &FacetValue, store: &mut PredicateStore) -> bool {
        let checked = match self.option_id(dimension, value) {
            Some(id) => !self.mirror.is_checked(id),
            None => return false,
        };
        self.push(dimension, value, checked, store)
    }

    /// Clears one dimension through the widget.
    pub fn push_clear(&mut self, dimension: &str, store: &mut PredicateStore) {
        if !self.owns(dimension) {
            return;
        }
        self.intercept(
            NativeCall::ClearDimension {
                dimension: dimension.to_string(),
            },
            store,
        );
    }

    /// Clears every native dimension that has a checked control.
    pub fn clear_all(&mut self, store: &mut PredicateStore) {
        let active: BTreeSet<String> = self
            .options
            .iter()
            .filter(|o| self.mirror.is_checked(&o.id))
            .map(|o| o.dimension.clone())
            .collect();
        for dimension in active {
            self.push_clear(&dimension, store);
        }
    }

    /// Runs a native call wrapped in the interceptor hooks, then pulls.
    ///
    /// The pull happens strictly after the widget call returns, whether it
    /// succeeded or not. A dimension clear on a widget without that entry
    /// point is replayed as one `apply(false)` per checked control.
    pub fn intercept(&mut self, call: NativeCall, store: &mut PredicateStore) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        self.interceptor.run_before(&call);
        match &call {
            NativeCall::Apply {
                dimension,
                option_id,
                checked,
            } => {
                if let Err(err) = widget.apply(dimension, option_id, *checked) {
                    warn!(%dimension, %option_id, error = %err, "native apply failed");
                }
            }
            NativeCall::ClearDimension { dimension } if self.capabilities.clear_dimension => {
                if let Err(err) = widget.clear_dimension(dimension) {
                    warn!(%dimension, error = %err, "native clear failed");
                }
            }
            NativeCall::ClearDimension { dimension } => {
                for option in self.options.iter().filter(|o| &o.dimension == dimension) {
                    if widget.is_checked(&option.id) {
                        if let Err(err) = widget.apply(dimension, &option.id, false) {
                            warn!(%dimension, option_id = %option.id, error = %err, "native apply failed");
                        }
                    }
                }
            }
        }
        self.pull(store);
        self.interceptor.run_after(&call);
    }

    // ========================================================================
    // Pull
    // ========================================================================

    /// Reads state back after the host saw the widget change on its own.
    pub fn notify_external_change(&mut self, store: &mut PredicateStore) -> bool {
        debug!("native widget changed outside the engine");
        self.pull(store)
    }

    /// Re-reads the widget's controls, then copies every control's state
    /// into the mirror and the store.
    ///
    /// The widget may re-render after a round trip, so options and their
    /// printed counts are replaced each time. Returns `true` if the store
    /// changed.
    pub fn pull(&mut self, store: &mut PredicateStore) -> bool {
        let Some(widget) = self.widget.as_ref() else {
            return false;
        };
        self.options = widget.options();
        self.dimensions
            .extend(self.options.iter().map(|o| o.dimension.clone()));
        self.mirror
            .checked
            .retain(|id, _| self.options.iter().any(|o| &o.id == id));
        let before = store.clone();
        let mut selected: BTreeMap<&str, Vec<FacetValue>> = self
            .dimensions
            .iter()
            .map(|d| (d.as_str(), Vec::new()))
            .collect();
        for option in &self.options {
            let checked = widget.is_checked(&option.id);
            self.mirror.checked.insert(option.id.clone(), checked);
            if checked {
                if let Some(values) = selected.get_mut(option.dimension.as_str()) {
                    values.push(option.value.clone());
                }
            }
        }
        for (dimension, values) in selected {
            store.set_values(dimension, values);
        }
        *store != before
    }

    /// Drops the widget and the hooks.
    pub fn detach(&mut self) -> Option<Box<dyn NativeWidget>> {
        self.interceptor = Interceptor::default();
        self.dimensions.clear();
        self.options.clear();
        self.widget.take()
    }
}

impl std::fmt::Debug for SyncBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBridge")
            .field("attached", &self.widget.is_some())
            .field("options", &self.options.len())
            .field("interceptor", &self.interceptor)
            .field("mirror", &self.mirror)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::MockNativeWidget;

    fn widget() -> MockNativeWidget {
        MockNativeWidget::new(vec![
            MockNativeWidget::option("cor", "W", "White"),
            MockNativeWidget::option("cor", "U", "Blue"),
            MockNativeWidget::option("qualid", "2", "NM"),
        ])
    }

    #[test]
    fn push_goes_through_widget_and_pulls() {
        let native = widget();
        let mut bridge = SyncBridge::new(Box::new(native.clone()), Interceptor::new());
        let mut store = PredicateStore::new();

        assert!(bridge.toggle("cor", &"W".into(), &mut store));
        assert!(native.is_checked("cor_W"));
        assert!(bridge.mirror().is_checked("cor_W"));
        assert!(store.contains("cor", &"W".into()));

        assert!(bridge.toggle("cor", &"W".into(), &mut store));
        assert!(!store.is_active());
        assert!(!bridge.toggle("cor", &"B".into(), &mut store));
    }

    #[test]
    fn external_change_is_pulled() {
        let native = widget();
        let mut bridge = SyncBridge::new(Box::new(native.clone()), Interceptor::new());
        let mut store = PredicateStore::new();
        store.toggle("own", "x");

        native.set_checked_externally("qualid_2", true);
        assert!(bridge.notify_external_change(&mut store));
        assert!(store.contains("qualid", &"2".into()));
        assert!(store.contains("own", &"x".into()));
        assert!(native.calls().is_empty());
        assert!(!bridge.pull(&mut store));
    }

    #[test]
    fn clear_falls_back_to_unchecking() {
        let native = widget().without_clear();
        let mut bridge = SyncBridge::new(Box::new(native.clone()), Interceptor::new());
        let mut store = PredicateStore::new();
        bridge.toggle("cor", &"W".into(), &mut store);
        bridge.toggle("cor", &"U".into(), &mut store);

        bridge.clear_all(&mut store);
        assert!(!store.is_active());
        let unchecks = native
            .calls()
            .iter()
            .filter(|c| matches!(c, NativeCall::Apply { checked: false, .. }))
            .count();
        assert_eq!(unchecks, 2);
    }

    #[test]
    fn failed_call_still_pulls() {
        let native = widget().failing();
        let mut bridge = SyncBridge::new(Box::new(native.clone()), Interceptor::new());
        let mut store = PredicateStore::new();
        bridge.toggle("qualid", &"2".into(), &mut store);
        assert!(store.contains("qualid", &"2".into()));
    }

    #[test]
    fn pull_picks_up_rerendered_counts() {
        let native = MockNativeWidget::new(vec![
            NativeOption {
                count: Some(4),
                ..MockNativeWidget::option("cor", "W", "White")
            },
            NativeOption {
                count: Some(2),
                ..MockNativeWidget::option("cor", "U", "Blue")
            },
        ]);
        native.respond_with_counts([("cor_U", 0), ("cor_W", 4)]);
        let mut bridge = SyncBridge::new(Box::new(native.clone()), Interceptor::new());
        let mut store = PredicateStore::new();
        assert_eq!(bridge.native_count("cor", &"U".into()), Some(2));

        bridge.toggle("cor", &"W".into(), &mut store);
        assert_eq!(bridge.native_count("cor", &"U".into()), Some(0));
        assert_eq!(bridge.native_count("cor", &"W".into()), Some(4));
    }

    #[test]
    fn without_apply_is_detached() {
        let mut bridge = SyncBridge::new(Box::new(widget().without_apply()), Interceptor::new());
        assert!(!bridge.is_attached());
        assert!(!bridge.owns("cor"));
        let mut store = PredicateStore::new();
        assert!(!bridge.toggle("cor", &"W".into(), &mut store));
    }

    #[test]
    fn hooks_see_state_after_pull() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let native = widget();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (before, after) = (seen.clone(), seen.clone());
        let seen_before = native.clone();
        let seen_after = native.clone();
        let interceptor = Interceptor::new()
            .before(move |_| before.borrow_mut().push(seen_before.is_checked("cor_U")))
            .after(move |_| after.borrow_mut().push(seen_after.is_checked("cor_U")));

        let mut bridge = SyncBridge::new(Box::new(native), interceptor);
        let mut store = PredicateStore::new();
        bridge.push("cor", &"U".into(), true, &mut store);
        assert_eq!(*seen.borrow(), vec![false, true]);

        assert!(bridge.detach().is_some());
        assert!(!bridge.is_attached());
    }
}
