//! Storefront label tables.
//!
//! The built-in tables live in `assets/labels.yaml` and are parsed on first
//! use. Hosts that know better labels (the page often embeds its own quality
//! and language lists) layer them on top with [`LabelTables::merge`].

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;
use vitrine_seeker::Labels;

use crate::error::{ConfigError, Result};

const BUILTIN_YAML: &str = include_str!("assets/labels.yaml");

static BUILTIN: Lazy<LabelTables> = Lazy::new(|| {
    LabelTables::from_yaml(BUILTIN_YAML).unwrap_or_else(|err| {
        warn!(error = %err, "built-in label tables unreadable; using raw ids");
        LabelTables::default()
    })
});

/// Lower bound and label of one shipping-rating tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTier {
    pub min: f64,
    pub label: String,
}

/// A labelled count range, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountRange {
    pub id: String,
    pub label: String,
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

type Table = BTreeMap<String, String>;

/// Every label table the presets use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelTables {
    pub unspecified: String,
    pub no_extras: String,
    pub quality: Table,
    /// Product conditions (sealed, opened...); pages supply their own.
    pub product_quality: Table,
    pub language: Table,
    pub extras: Table,
    pub rarity: Table,
    pub color: Table,
    pub card_type: Table,
    pub states: Table,
    pub send_tiers: Table,
    pub send_ratings: Vec<RatingTier>,
    pub send_slowest: String,
    pub store_types: Table,
    pub review_counts: Vec<CountRange>,
}

impl LabelTables {
    /// The tables compiled into the crate.
    pub fn builtin() -> &'static LabelTables {
        &BUILTIN
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
            what: "label tables",
            source,
        })
    }

    /// Overlays `other` onto `self`. Table entries are merged key by key;
    /// lists and scalar labels are replaced when `other` sets them.
    pub fn merge(mut self, other: LabelTables) -> Self {
        if !other.unspecified.is_empty() {
            self.unspecified = other.unspecified;
        }
        if !other.no_extras.is_empty() {
            self.no_extras = other.no_extras;
        }
        if !other.send_slowest.is_empty() {
            self.send_slowest = other.send_slowest;
        }
        if !other.send_ratings.is_empty() {
            self.send_ratings = other.send_ratings;
        }
        if !other.review_counts.is_empty() {
            self.review_counts = other.review_counts;
        }
        self.quality.extend(other.quality);
        self.product_quality.extend(other.product_quality);
        self.language.extend(other.language);
        self.extras.extend(other.extras);
        self.rarity.extend(other.rarity);
        self.color.extend(other.color);
        self.card_type.extend(other.card_type);
        self.states.extend(other.states);
        self.send_tiers.extend(other.send_tiers);
        self.store_types.extend(other.store_types);
        self
    }

    // ========================================================================
    // Resolvers for the seeker
    // ========================================================================

    /// Table labels with a `"<prefix><id>"` fallback and `0` as unspecified.
    pub fn resolver(&self, table: &Table, prefix: &str) -> Labels {
        Labels::new()
            .table([("0".to_string(), self.unspecified.clone())])
            .table(table.clone())
            .prefix(prefix)
    }

    /// Extras labels; `0` means a plain copy.
    pub fn extras_labels(&self) -> Labels {
        Labels::new()
            .table(self.extras.clone())
            .table([("0".to_string(), self.no_extras.clone())])
            .prefix("Extras ")
    }

    /// State labels as `"São Paulo (SP)"`.
    pub fn state_labels(&self) -> Labels {
        Labels::new()
            .table(self.states.clone())
            .template("{label} ({value})")
    }

    /// Label for a store shipping rating such as `"4.5"`.
    pub fn send_rating_label(&self, rating: &str) -> String {
        let Ok(r) = rating.trim().parse::<f64>() else {
            return self.send_slowest.clone();
        };
        self.send_ratings
            .iter()
            .find(|tier| r >= tier.min)
            .map(|tier| tier.label.clone())
            .unwrap_or_else(|| self.send_slowest.clone())
    }

    /// Shipping labels for store ratings.
    pub fn send_rating_labels(&self) -> Labels {
        let tables = self.clone();
        Labels::new().formatter(move |v| tables.send_rating_label(v))
    }

    /// Shipping labels for product tracking tiers; unknown tiers are read
    /// as ratings.
    pub fn send_tier_labels(&self) -> Labels {
        let tables = self.clone();
        Labels::new().formatter(move |v| match tables.send_tiers.get(v) {
            Some(label) => label.clone(),
            None => tables.send_rating_label(v),
        })
    }
}

/// Five-star rendering of a rating: rounded, clamped to `0..=5`.
pub fn stars(rating: &str) -> String {
    let n = rating
        .trim()
        .parse::<f64>()
        .map(|r| r.round().clamp(0.0, 5.0) as usize)
        .unwrap_or(0);
    format!("{}{}", "★".repeat(n), "☆".repeat(5 - n))
}
