//! Native widget port and call interception.
//!
//! Some host pages already carry a stateful filter widget with its own
//! checkboxes and its own update routine. The engine overlays it rather than
//! replacing it: every change goes through the widget's entry points, and the
//! widget stays the source of truth for the dimensions it owns.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use vitrine_seeker::FacetValue;

use crate::error::{BridgeError, Result};

/// One checkbox of the native widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeOption {
    /// Host identifier of the control, e.g. `filtro_qualid_3`.
    pub id: String,
    pub dimension: String,
    pub value: FacetValue,
    pub label: String,
    /// Count printed by the widget itself, if any.
    pub count: Option<usize>,
}

/// A call into one of the widget's entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum NativeCall {
    Apply {
        dimension: String,
        option_id: String,
        checked: bool,
    },
    ClearDimension {
        dimension: String,
    },
}

impl NativeCall {
    pub fn dimension(&self) -> &str {
        match self {
            NativeCall::Apply { dimension, .. } | NativeCall::ClearDimension { dimension } => {
                dimension
            }
        }
    }
}

/// Entry points a widget exposes. Missing ones are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub apply: bool,
    pub clear_dimension: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            apply: true,
            clear_dimension: true,
        }
    }
}

/// Port to the host's native filter widget.
pub trait NativeWidget {
    /// Every control the widget currently renders.
    fn options(&self) -> Vec<NativeOption>;

    /// Reads a control's checked state.
    fn is_checked(&self, option_id: &str) -> bool;

    /// Sets a control and runs the widget's own update routine.
    fn apply(&mut self, dimension: &str, option_id: &str, checked: bool) -> Result<()>;

    /// Unchecks every control of a dimension and runs the update routine.
    fn clear_dimension(&mut self, dimension: &str) -> Result<()>;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}

impl<W: NativeWidget + ?Sized> NativeWidget for Box<W> {
    fn options(&self) -> Vec<NativeOption> {
        (**self).options()
    }

    fn is_checked(&self, option_id: &str) -> bool {
        (**self).is_checked(option_id)
    }

    fn apply(&mut self, dimension: &str, option_id: &str, checked: bool) -> Result<()> {
        (**self).apply(dimension, option_id, checked)
    }

    fn clear_dimension(&mut self, dimension: &str) -> Result<()> {
        (**self).clear_dimension(dimension)
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }
}

/// Hook run around a native call.
pub type CallHookFn = Rc<dyn Fn(&NativeCall)>;

/// Callbacks around every native call.
///
/// `before` hooks run ahead of the call, `after` hooks once it has returned
/// and the engine has read the widget's state back.
#[derive(Clone, Default)]
pub struct Interceptor {
    before: Vec<CallHookFn>,
    after: Vec<CallHookFn>,
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&NativeCall) + 'static,
    {
        self.before.push(Rc::new(f));
        self
    }

    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&NativeCall) + 'static,
    {
        self.after.push(Rc::new(f));
        self
    }

    pub fn run_before(&self, call: &NativeCall) {
        for hook in &self.before {
            hook(call);
        }
    }

    pub fn run_after(&self, call: &NativeCall) {
        for hook in &self.after {
            hook(call);
        }
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("before_count", &self.before.len())
            .field("after_count", &self.after.len())
            .finish()
    }
}

// === Mock implementations for testing ===

#[derive(Debug, Default)]
struct MockState {
    options: Vec<NativeOption>,
    checked: BTreeSet<String>,
    calls: Vec<NativeCall>,
    failing: bool,
    /// Counts the next round trip re-renders with.
    pending_counts: Vec<(String, usize)>,
}

impl MockState {
    fn round_trip(&mut self) {
        for (id, count) in std::mem::take(&mut self.pending_counts) {
            if let Some(option) = self.options.iter_mut().find(|o| o.id == id) {
                option.count = Some(count);
            }
        }
    }
}

/// In-memory native widget. Clones share state, so a test can keep a handle
/// and act as the user clicking the widget's own controls.
#[derive(Debug, Clone)]
pub struct MockNativeWidget {
    state: Rc<RefCell<MockState>>,
    capabilities: Capabilities,
}

impl MockNativeWidget {
    pub fn new(options: Vec<NativeOption>) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                options,
                ..MockState::default()
            })),
            capabilities: Capabilities::default(),
        }
    }

    /// Builds an option with `id` = `"<dimension>_<value>"`.
    pub fn option(dimension: &str, value: &str, label: &str) -> NativeOption {
        NativeOption {
            id: format!("{dimension}_{value}"),
            dimension: dimension.to_string(),
            value: FacetValue::from(value),
            label: label.to_string(),
            count: None,
        }
    }

    /// Drops the clear-dimension entry point.
    pub fn without_clear(mut self) -> Self {
        self.capabilities.clear_dimension = false;
        self
    }

    /// Drops the apply entry point.
    pub fn without_apply(mut self) -> Self {
        self.capabilities.apply = false;
        self
    }

    /// Makes every following call fail after updating state.
    pub fn failing(self) -> Self {
        self.state.borrow_mut().failing = true;
        self
    }

    /// Changes a control without going through any entry point.
    pub fn set_checked_externally(&self, option_id: &str, checked: bool) {
        let mut state = self.state.borrow_mut();
        if checked {
            state.checked.insert(option_id.to_string());
        } else {
            state.checked.remove(option_id);
        }
    }

    /// Counts the widget prints after its next apply or clear, as a server
    /// round trip would.
    pub fn respond_with_counts<'a, I>(&self, counts: I)
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        self.state.borrow_mut().pending_counts = counts
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect();
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.borrow().calls.clone()
    }
}

impl NativeWidget for MockNativeWidget {
    fn options(&self) -> Vec<NativeOption> {
        self.state.borrow().options.clone()
    }

    fn is_checked(&self, option_id: &str) -> bool {
        self.state.borrow().checked.contains(option_id)
    }

    fn apply(&mut self, dimension: &str, option_id: &str, checked: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::Apply {
            dimension: dimension.to_string(),
            option_id: option_id.to_string(),
            checked,
        });
        if checked {
            state.checked.insert(option_id.to_string());
        } else {
            state.checked.remove(option_id);
        }
        state.round_trip();
        if state.failing {
            return Err(BridgeError::native("update request failed"));
        }
        Ok(())
    }

    fn clear_dimension(&mut self, dimension: &str) -> Result<()> {
        if !self.capabilities.clear_dimension {
            return Err(BridgeError::Unsupported("clear_dimension"));
        }
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::ClearDimension {
            dimension: dimension.to_string(),
        });
        let ids: Vec<String> = state
            .options
            .iter()
            .filter(|o| o.dimension == dimension)
            .map(|o| o.id.clone())
            .collect();
        for id in ids {
            state.checked.remove(&id);
        }
        state.round_trip();
        if state.failing {
            return Err(BridgeError::native("update request failed"));
        }
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}
