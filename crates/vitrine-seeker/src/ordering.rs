//! How a dimension's options are listed in the panel.

use std::cmp::Ordering;

use crate::facet::FacetOption;
use crate::value::FacetValue;

/// How the options of one dimension are ordered.
///
/// Numeric orders put non-numeric values last in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptionOrder {
    /// Keep declaration order (buckets) or first-seen order.
    Declared,
    /// Smallest number first.
    #[default]
    Numeric,
    /// Largest number first, e.g. ratings.
    NumericDesc,
    /// Case-insensitive display label order.
    Label,
    /// Plain string order of the raw values.
    Value,
}

impl OptionOrder {
    /// Sorts options in place. The sort is stable.
    pub fn sort(self, options: &mut [FacetOption]) {
        if self == OptionOrder::Declared {
            return;
        }
        options.sort_by(|a, b| compare_options(self, a, b));
    }
}

pub(crate) fn compare_options(order: OptionOrder, a: &FacetOption, b: &FacetOption) -> Ordering {
    match order {
        OptionOrder::Declared => Ordering::Equal,
        OptionOrder::Numeric => compare_numeric(&a.value, &b.value, false),
        OptionOrder::NumericDesc => compare_numeric(&a.value, &b.value, true),
        OptionOrder::Label => a
            .label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then_with(|| a.value.cmp(&b.value)),
        OptionOrder::Value => a.value.cmp(&b.value),
    }
}

fn compare_numeric(a: &FacetValue, b: &FacetValue, descending: bool) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => {
            let by_number = x.compare(y).unwrap_or(Ordering::Equal);
            let by_number = if descending { by_number.reverse() } else { by_number };
            by_number.then_with(|| a.cmp(b))
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
