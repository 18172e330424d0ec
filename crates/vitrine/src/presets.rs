//! Dimension sets for the storefront's listing pages.
//!
//! # Marketplace listings
//!
//! | key | reads | kind |
//! |-----|-------|------|
//! | `qualid` | `qualid` (buylist: keys of `q`) | discrete / multi-valued |
//! | `idioma` | `idioma` (buylist: keys of `l`, `0` skipped) | discrete / multi-valued |
//! | `extras` | `extras`, missing as `0` | discrete |
//! | `edicao` | `idEdicao` | discrete |
//! | `num` | `num` | discrete |
//! | `lj_uf` | `lj_uf` | discrete |
//! | `lj_tipo` | store row via `lj_id` | buckets |
//! | `lj_refCount` | `lj_ref` review count (pages without stores) | buckets |
//! | `lj_ref` | store rating via `lj_id`, else the item's 1-5 `lj_ref` | discrete, star labels |
//! | `lj_ref_send` | store shipping rating (products: `lj_rastreio`) | discrete |
//! | `lj_quant` | `quantFilter` divisible by 4, 3, 2 | buckets |
//! | `price` | `precoFinal`, positive only | range |
//!
//! # Edition grid
//!
//! Rarity, color, type, mana value and artist, plus a name search over the
//! English name, Portuguese name and type line.

use std::rc::Rc;

use vitrine_seeker::{
    Bucket, BucketRule, Dimension, DimensionSet, Facetable, JoinTable, Labels, OptionOrder,
    Source, Value,
};

use crate::editions;
use crate::error::Result;
use crate::labels::{stars, LabelTables};

/// Which flavour of marketplace page the listing comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// Single card offers.
    Card,
    /// Buy offers; quality and language are sets of accepted values.
    Buylist,
    /// Sealed products and accessories.
    Product,
}

impl ListingKind {
    /// Buylist items carry a `q` map of accepted qualities.
    pub fn detect<T: Facetable>(items: &[T], product_page: bool) -> Self {
        if product_page {
            return ListingKind::Product;
        }
        match items.first().map(|item| item.facet_field("q")) {
            Some(Value::Many(_)) => ListingKind::Buylist,
            _ => ListingKind::Card,
        }
    }
}

/// Builder for marketplace listing dimensions.
#[derive(Debug, Clone)]
pub struct Marketplace {
    kind: ListingKind,
    labels: LabelTables,
    stores: Option<Rc<JoinTable>>,
    editions: Labels,
}

impl Marketplace {
    pub fn new(kind: ListingKind) -> Self {
        let labels = LabelTables::builtin().clone();
        Marketplace {
            kind,
            editions: editions::fallback_labels(&labels.unspecified),
            labels,
            stores: None,
        }
    }

    pub fn labels(mut self, labels: LabelTables) -> Self {
        self.labels = labels;
        self
    }

    /// Store rows keyed by `lj_id`. Without them the page is treated as a
    /// bazaar, where `lj_ref` on the item is a review count.
    pub fn stores(mut self, stores: JoinTable) -> Self {
        self.stores = (!stores.is_empty()).then(|| Rc::new(stores));
        self
    }

    /// Edition label resolver, usually [`EditionDirectory::labels`](crate::EditionDirectory::labels).
    pub fn editions(mut self, editions: Labels) -> Self {
        self.editions = editions;
        self
    }

    pub fn dimensions(&self) -> Result<DimensionSet> {
        let mut dims = vec![self.quality(), self.language()];
        if self.kind != ListingKind::Product {
            dims.push(
                Dimension::discrete("extras", "Extras", Source::field("extras"))
                    .missing_as(0)
                    .labels(self.labels.extras_labels())
                    .min_distinct(1),
            );
        }
        dims.push(
            Dimension::discrete("edicao", "Edição", Source::field("idEdicao"))
                .labels(self.editions.clone())
                .order(OptionOrder::Label),
        );
        dims.push(
            Dimension::discrete("num", "Numeração", Source::field("num"))
                .labels(Labels::new().prefix("#")),
        );
        dims.push(
            Dimension::discrete("lj_uf", "Estado", Source::field("lj_uf"))
                .labels(self.labels.state_labels())
                .order(OptionOrder::Value),
        );
        match &self.stores {
            Some(stores) => {
                dims.push(self.store_types(stores));
                dims.push(
                    Dimension::discrete("lj_ref", "Média de Avaliações", store_rating(stores))
                    .numeric_keys()
                    .labels(Labels::new().formatter(stars))
                    .order(OptionOrder::NumericDesc)
                    .min_distinct(1),
                );
            }
            None => dims.push(self.review_counts()),
        }
        if let Some(send) = self.send_time() {
            dims.push(send);
        }
        dims.push(quantity());
        dims.push(
            Dimension::numeric_range("price", "Preço", Source::field("precoFinal"))
                .positive_only()
                .min_distinct(1),
        );
        Ok(DimensionSet::new(dims)?)
    }

    fn quality(&self) -> Dimension {
        let dim = match self.kind {
            ListingKind::Card => Dimension::discrete("qualid", "Qualidade", Source::field("qualid"))
                .labels(self.labels.resolver(&self.labels.quality, "Q")),
            ListingKind::Buylist => Dimension::multi_valued("qualid", "Qualidade", Source::field("q"))
                .labels(self.labels.resolver(&self.labels.quality, "Q")),
            ListingKind::Product => Dimension::discrete("qualid", "Condição", Source::field("qualid"))
                .labels(self.labels.resolver(&self.labels.product_quality, "Q")),
        };
        dim.min_distinct(1)
    }

    fn language(&self) -> Dimension {
        let labels = self.labels.resolver(&self.labels.language, "L");
        let dim = match self.kind {
            ListingKind::Buylist => Dimension::multi_valued("idioma", "Idioma", Source::field("l"))
                .skip_value("0")
                .labels(labels),
            _ => Dimension::discrete("idioma", "Idioma", Source::field("idioma")).labels(labels),
        };
        dim.min_distinct(1)
    }

    fn store_types(&self, stores: &Rc<JoinTable>) -> Dimension {
        let store = |field: &str| Source::joined("lj_id", stores.clone(), field);
        let label = |id: &str| {
            self.labels
                .store_types
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_string())
        };
        let unverified = BucketRule::AnyOf(vec![
            BucketRule::Missing,
            BucketRule::custom(|v| v.to_number().is_some_and(|n| n.to_f64() < 2.0)),
        ]);
        Dimension::bucketed(
            "lj_tipo",
            "Tipo de Loja",
            vec![
                Bucket::new("fav", label("fav"), store("lj_fav"), BucketRule::Equals(1.into())),
                Bucket::new(
                    "fisica",
                    label("fisica"),
                    store("lj_fisica"),
                    BucketRule::Equals(1.into()),
                ),
                Bucket::new(
                    "verificada",
                    label("verificada"),
                    store("lj_selo"),
                    BucketRule::at_least(2.0),
                ),
                Bucket::new("nverificada", label("nverificada"), store("lj_selo"), unverified),
            ],
        )
        .min_distinct(1)
    }

    fn review_counts(&self) -> Dimension {
        let buckets = self
            .labels
            .review_counts
            .iter()
            .map(|range| {
                let between = BucketRule::Between {
                    min: Some(range.min),
                    max: range.max,
                };
                // An absent count is zero reviews.
                let rule = if range.min <= 0.0 {
                    BucketRule::AnyOf(vec![between, BucketRule::Missing])
                } else {
                    between
                };
                Bucket::new(range.id.as_str(), range.label.as_str(), Source::field("lj_ref"), rule)
            })
            .collect();
        Dimension::bucketed("lj_refCount", "Referências", buckets).min_distinct(1)
    }

    fn send_time(&self) -> Option<Dimension> {
        let label = "Tempo médio para envio";
        let dim = match (self.kind, &self.stores) {
            (ListingKind::Product, _) => {
                Dimension::discrete("lj_ref_send", label, Source::field("lj_rastreio"))
                    .labels(self.labels.send_tier_labels())
            }
            (_, Some(stores)) => Dimension::discrete(
                "lj_ref_send",
                label,
                Source::joined("lj_id", stores.clone(), "lj_ref_send"),
            )
            .numeric_keys()
            .labels(self.labels.send_rating_labels())
            .order(OptionOrder::NumericDesc),
            (_, None) => return None,
        };
        Some(dim.min_distinct(1))
    }
}

/// The store's rating, or the item's own `lj_ref` when the store row has
/// none and the item value reads as a 1 to 5 rating.
fn store_rating(stores: &Rc<JoinTable>) -> Source {
    Source::first_of([
        Source::joined("lj_id", stores.clone(), "lj_ref"),
        Source::field("lj_ref").accepting(BucketRule::Between {
            min: Some(1.0),
            max: Some(5.0),
        }),
    ])
}

fn quantity() -> Dimension {
    let buckets = [4u64, 3, 2]
        .into_iter()
        .map(|n| {
            Bucket::new(
                n,
                format!("{n} ou mais unidades"),
                Source::field("quantFilter"),
                BucketRule::DivisibleBy(n),
            )
        })
        .collect();
    Dimension::bucketed("lj_quant", "Quantidade", buckets)
        .hide_counts()
        .min_distinct(1)
}

/// Dimensions of an edition's card grid.
pub fn edition_grid(labels: &LabelTables) -> Result<DimensionSet> {
    let coded = |table: &std::collections::BTreeMap<String, String>, prefix: &str| {
        Labels::new().table(table.clone()).prefix(prefix)
    };
    Ok(DimensionSet::new(vec![
        Dimension::text(
            "search",
            "Busca",
            vec![Source::field("nEN"), Source::field("nPT"), Source::field("sT")],
        ),
        Dimension::discrete("iR", "Raridade", Source::field("iR"))
            .labels(coded(&labels.rarity, "R"))
            .min_distinct(1),
        Dimension::discrete("iC", "Cor", Source::field("iC"))
            .labels(coded(&labels.color, "C"))
            .min_distinct(1),
        Dimension::discrete("iT", "Tipo", Source::field("iT"))
            .labels(coded(&labels.card_type, "T"))
            .min_distinct(1),
        Dimension::discrete("iCMC", "Custo de Mana", Source::field("iCMC")).min_distinct(1),
        Dimension::discrete("sA", "Artista", Source::field("sA"))
            .order(OptionOrder::Value)
            .min_distinct(1),
    ])?)
}
