//! Bridge - Host ports for the vitrine facet engine.
//!
//! The seeker crate is pure: items in, counts and matches out. This crate
//! connects it to a live storefront page:
//!
//! - [`activate`] wires items, dimensions and a projector into an [`EngineHandle`]
//! - [`SyncBridge`] overlays a native filter widget and keeps it authoritative
//!   for the dimensions it owns
//! - [`Projector`] hands results to a render callback or toggles host nodes
//! - [`Debouncer`] holds back typed input until the user pauses
//! - [`TtlCache`] and [`LookupCache`] persist remote lookups in host storage
//!
//! Every host dependency is a trait with a `Mock*` companion, so the whole
//! engine can be driven without a page.
//!
//! # Quick Start
//!
//! ```rust
//! use vitrine_bridge::{activate, HostContext, MockVisibilityHost, Projector};
//! use vitrine_seeker::{Dimension, DimensionSet, Record, Source};
//!
//! let dims = DimensionSet::new(vec![
//!     Dimension::discrete("uf", "State", Source::field("uf")),
//! ]).unwrap();
//! let items = vec![
//!     Record::new("1").with("uf", "SP"),
//!     Record::new("2").with("uf", "RJ"),
//! ];
//!
//! let page = MockVisibilityHost::paginated(["1", "2"], 10);
//! let mut engine = activate(HostContext::new(items, dims, Projector::visibility(page.clone())));
//!
//! let update = engine.toggle("uf", "RJ");
//! assert_eq!(update.matched, 1);
//! assert_eq!(page.visible_ids(), vec!["2"]);
//!
//! engine.deactivate();
//! assert_eq!(page.visible_ids(), vec!["1", "2"]);
//! ```
//!
//! # Native Widgets
//!
//! When a widget owns a dimension, the engine never writes that dimension's
//! predicate directly. It calls the widget, waits for the call to return, and
//! reads every control back. Changes the widget makes on its own are picked up
//! by [`EngineHandle::notify_external_change`].

mod cache;
mod clock;
mod config;
mod debounce;
mod engine;
mod error;
mod lookup;
mod native;
mod project;
mod sync;

// Re-export public API
pub use cache::{KeyValueStore, MemoryStore, TtlCache};
pub use clock::{Clock, MockClock, SystemClock};
pub use config::EngineConfig;
pub use debounce::Debouncer;
pub use engine::{activate, EngineHandle, HostContext, Update};
pub use error::{BridgeError, Result};
pub use lookup::{LookupCache, LookupState, Ticket};
pub use native::{
    CallHookFn, Capabilities, Interceptor, MockNativeWidget, NativeCall, NativeOption,
    NativeWidget,
};
pub use project::{
    ListRenderer, MockVisibilityHost, Projection, Projector, VisibilityHost, VisibilityProjector,
};
pub use sync::{MirrorState, SyncBridge};
