//! Vitrine - Client-side faceted filtering for storefront listing pages.
//!
//! This crate bundles the engine ([`vitrine_seeker`]) and its host ports
//! ([`vitrine_bridge`]) with what a storefront page needs on top:
//!
//! - [`Marketplace`] and [`edition_grid`]: ready-made dimension sets for the
//!   store's listing pages
//! - [`LabelTables`]: display labels shipped as embedded YAML, overridable per host
//! - [`RecordSource`]: page JSON to engine records
//! - [`SidebarParser`]: native sidebar markup to options the sync bridge drives
//! - [`EditionDirectory`]: edition names, embedded or looked up and cached
//! - [`Registry`]: picks the page module that recognises the current page
//! - [`Settings`]: engine tuning and label overrides from YAML or JSON
//!
//! # Quick Start
//!
//! ```rust
//! use vitrine::{activate, HostContext, ListingKind, Marketplace, Projector, Record, RecordSource};
//!
//! let items = RecordSource::default().parse(r#"[
//!     {"id": 1, "qualid": 2, "idioma": 8, "precoFinal": 4.5},
//!     {"id": 2, "qualid": 3, "idioma": 2, "precoFinal": 12.0},
//!     {"id": 3, "qualid": 2, "idioma": 2, "precoFinal": 30.0}
//! ]"#).unwrap();
//!
//! let dims = Marketplace::new(ListingKind::Card).dimensions().unwrap();
//! let render = |shown: &[&Record]| println!("{} offers", shown.len());
//! let mut engine = activate(HostContext::new(items, dims, Projector::list(render)));
//!
//! let update = engine.toggle("qualid", 2);
//! assert_eq!(update.matched, 2);
//!
//! let tags = engine.active_tags();
//! assert_eq!(tags[0].label, "(NM) Praticamente Nova");
//! ```
//!
//! # Native Sidebars
//!
//! Pages that already render a filter sidebar keep it. The host scrapes each
//! checkbox's id, label and inline handler into [`RawGroup`]s; the parser
//! produces [`NativeOption`]s for the host's [`NativeWidget`] and matching
//! dimensions, so counts come from the engine while the widget stays the
//! source of truth for what is checked.

mod config;
mod editions;
mod error;
mod labels;
mod presets;
mod registry;
mod sidebar;
mod source;

// Re-export public API
pub use config::Settings;
pub use editions::{fallback_labels, EditionDirectory};
pub use error::{ConfigError, Result};
pub use labels::{stars, CountRange, LabelTables, RatingTier};
pub use presets::{edition_grid, ListingKind, Marketplace};
pub use registry::{Detection, MockPageModule, PageModule, Registry};
pub use sidebar::{RawControl, RawGroup, SidebarGroup, SidebarParser};
pub use source::{join_table, RecordSource};

pub use vitrine_bridge::{
    activate, EngineConfig, EngineHandle, HostContext, Interceptor, MockNativeWidget,
    MockVisibilityHost, NativeCall, NativeOption, NativeWidget, Projector, Update,
};
pub use vitrine_seeker::{
    ActiveTag, Dimension, DimensionSet, FacetSet, FacetValue, Record, Source,
};

pub use vitrine_bridge;
pub use vitrine_seeker;
