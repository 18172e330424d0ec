//! Parsing the host's native filter sidebar.
//!
//! Listing pages that already ship a filter sidebar describe each checkbox
//! only through markup: a control id such as `filtro_qualid_3`, a label that
//! may start with a `(12)` count, and a clear action such as
//! `removeFilters('qualid')`. The host scrapes those strings; this module
//! turns them into [`NativeOption`]s the sync bridge can drive, and into
//! dimension specs so the engine can count them.

use regex::Regex;
use tracing::debug;
use vitrine_bridge::NativeOption;
use vitrine_seeker::{Dimension, FacetValue, Labels, Source};

use crate::error::{ConfigError, Result};
use crate::labels::LabelTables;

/// One checkbox as scraped from the page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawControl {
    pub id: String,
    pub label: String,
    /// Inline handler of the control, if the page wires one.
    pub action: Option<String>,
}

/// One sidebar section as scraped from the page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawGroup {
    pub title: String,
    /// Inline handler of the section's clear link.
    pub clear_action: Option<String>,
    pub controls: Vec<RawControl>,
}

/// A parsed sidebar section.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarGroup {
    pub key: String,
    pub title: String,
    pub options: Vec<NativeOption>,
}

impl SidebarGroup {
    /// Discrete dimension over `field`, labelled like the sidebar.
    pub fn dimension(&self, field: &str) -> Dimension {
        let labels = Labels::new().table(
            self.options
                .iter()
                .map(|o| (o.value.as_str().to_string(), o.label.clone())),
        );
        Dimension::discrete(self.key.as_str(), self.title.as_str(), Source::field(field))
            .labels(labels)
            .min_distinct(1)
    }
}

/// Where the option value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueFrom {
    Id,
    Action,
}

/// Parser for one sidebar flavour.
///
/// The option pattern must have a `value` capture group and may have a `kind`
/// group; the clear pattern must have a `key` group.
#[derive(Debug, Clone)]
pub struct SidebarParser {
    option: Regex,
    value_from: ValueFrom,
    clear: Regex,
    quality_kinds: Vec<String>,
    quality_guard: Option<Regex>,
    count_prefix: Regex,
    labels: LabelTables,
}

impl SidebarParser {
    /// Bazaar sidebar: `filtro_<kind>_<value>` ids, `removeFilters('<key>')`.
    pub fn bazaar() -> Result<Self> {
        Self::new(
            r"^filtro_(?P<kind>[a-z_]+?)_(?P<value>\d+)$",
            r"removeFilters\('(?P<key>[^']+)'\)",
        )
    }

    /// Showcase sidebar: values live in `showcase.search(this, g, o, '<kind>', '<value>')`,
    /// groups clear through `filtersClear(g, '<key>')`. Quality labels are only
    /// replaced when the page label carries a grade abbreviation.
    pub fn showcase() -> Result<Self> {
        let mut parser = Self::new(
            r"showcase\.search\(this\s*,\s*\d+\s*,\s*\d+\s*,\s*'(?P<kind>[^']+)'\s*,\s*'(?P<value>[^']+)'\s*\)",
            r"filtersClear\(\s*\d+\s*,\s*'(?P<key>[^']+)'\s*\)",
        )?;
        parser.value_from = ValueFrom::Action;
        parser.quality_kinds = vec!["quality".to_string()];
        parser.quality_guard = Some(compile(r"\([MNHSPD]+\)")?);
        Ok(parser)
    }

    /// Custom flavour; option values are read from control ids.
    pub fn new(option_pattern: &str, clear_pattern: &str) -> Result<Self> {
        let option = compile(option_pattern)?;
        require_group(&option, option_pattern, "value")?;
        let clear = compile(clear_pattern)?;
        require_group(&clear, clear_pattern, "key")?;
        Ok(SidebarParser {
            option,
            value_from: ValueFrom::Id,
            clear,
            quality_kinds: vec!["qualid".to_string()],
            quality_guard: None,
            count_prefix: compile(r"^\((?P<count>\d+)\)\s*")?,
            labels: LabelTables::builtin().clone(),
        })
    }

    pub fn labels(mut self, labels: LabelTables) -> Self {
        self.labels = labels;
        self
    }

    /// Parses every group that yields a key and at least one option.
    pub fn parse(&self, groups: &[RawGroup]) -> Vec<SidebarGroup> {
        groups.iter().filter_map(|g| self.parse_group(g)).collect()
    }

    fn parse_group(&self, group: &RawGroup) -> Option<SidebarGroup> {
        let clear_key = group
            .clear_action
            .as_deref()
            .and_then(|action| self.clear.captures(action))
            .and_then(|caps| caps.name("key"))
            .map(|m| m.as_str().to_string());

        let mut kind_key = None;
        let mut options = Vec::new();
        for control in &group.controls {
            let Some((kind, option)) = self.parse_control(control, clear_key.as_deref()) else {
                debug!(group = %group.title, id = %control.id, "sidebar control not recognised");
                continue;
            };
            if kind_key.is_none() {
                kind_key = kind;
            }
            options.push(option);
        }

        let key = clear_key.or(kind_key)?;
        if options.is_empty() {
            return None;
        }
        for option in &mut options {
            option.dimension = key.clone();
        }
        Some(SidebarGroup {
            key,
            title: group.title.trim().to_string(),
            options,
        })
    }

    fn parse_control(
        &self,
        control: &RawControl,
        group_key: Option<&str>,
    ) -> Option<(Option<String>, NativeOption)> {
        let haystack = match self.value_from {
            ValueFrom::Id => control.id.as_str(),
            ValueFrom::Action => control.action.as_deref()?,
        };
        let caps = self.option.captures(haystack)?;
        let value = caps.name("value")?.as_str().to_string();
        let kind = caps.name("kind").map(|m| m.as_str().to_string());

        let raw = control.label.trim();
        let (count, label) = match self.count_prefix.captures(raw) {
            Some(prefix) => {
                let count = prefix.name("count").and_then(|m| m.as_str().parse().ok());
                (count, raw[prefix.get(0).map_or(0, |m| m.end())..].to_string())
            }
            None => (None, raw.to_string()),
        };
        let label = self.quality_label(kind.as_deref(), &value, &label).unwrap_or(label);

        let option = NativeOption {
            id: control.id.clone(),
            dimension: group_key.or(kind.as_deref()).unwrap_or_default().to_string(),
            value: FacetValue::from(value),
            label,
            count,
        };
        Some((kind, option))
    }

    fn quality_label(&self, kind: Option<&str>, value: &str, raw: &str) -> Option<String> {
        let kind = kind?;
        if !self.quality_kinds.iter().any(|k| k == kind) {
            return None;
        }
        if let Some(guard) = &self.quality_guard {
            if !guard.is_match(raw) {
                return None;
            }
        }
        self.labels.quality.get(value).cloned()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ConfigError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn require_group(regex: &Regex, pattern: &str, group: &'static str) -> Result<()> {
    if regex.capture_names().flatten().any(|name| name == group) {
        Ok(())
    } else {
        Err(ConfigError::MissingGroup {
            pattern: pattern.to_string(),
            group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(id: &str, label: &str) -> RawControl {
        RawControl {
            id: id.into(),
            label: label.into(),
            action: None,
        }
    }

    #[test]
    fn bazaar_ids_and_counts() {
        let parser = SidebarParser::bazaar().unwrap();
        let groups = parser.parse(&[RawGroup {
            title: " Qualidade ".into(),
            clear_action: Some("removeFilters('qualid')".into()),
            controls: vec![
                control("filtro_qualid_2", "(12) NM"),
                control("filtro_qualid_9", "(3) Weird"),
                control("unrelated", "x"),
            ],
        }]);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.key, "qualid");
        assert_eq!(group.title, "Qualidade");
        assert_eq!(group.options.len(), 2);
        assert_eq!(group.options[0].label, "(NM) Praticamente Nova");
        assert_eq!(group.options[0].count, Some(12));
        assert_eq!(group.options[1].label, "Weird");
        assert_eq!(group.options[1].value, FacetValue::from("9"));
    }

    #[test]
    fn key_falls_back_to_id_kind() {
        let parser = SidebarParser::bazaar().unwrap();
        let groups = parser.parse(&[RawGroup {
            title: "Cor".into(),
            clear_action: None,
            controls: vec![control("filtro_cor_6", "Vermelho")],
        }]);
        assert_eq!(groups[0].key, "cor");
        assert_eq!(groups[0].options[0].dimension, "cor");
        assert_eq!(groups[0].options[0].count, None);
    }

    #[test]
    fn showcase_reads_actions_and_guards_quality() {
        let parser = SidebarParser::showcase().unwrap();
        let action = |kind: &str, value: &str| {
            Some(format!("showcase.search(this, 0, 1, '{kind}', '{value}')"))
        };
        let groups = parser.parse(&[RawGroup {
            title: "Qualidade".into(),
            clear_action: Some("filtersClear(0, 'quality')".into()),
            controls: vec![
                RawControl {
                    id: "cb-1".into(),
                    label: "(NM) Near Mint".into(),
                    action: action("quality", "2"),
                },
                RawControl {
                    id: "cb-2".into(),
                    label: "Lacrado".into(),
                    action: action("quality", "3"),
                },
            ],
        }]);
        let options = &groups[0].options;
        assert_eq!(options[0].label, "(NM) Praticamente Nova");
        assert_eq!(options[1].label, "Lacrado");
        assert_eq!(options[1].id, "cb-2");
    }

    #[test]
    fn empty_groups_are_dropped() {
        let parser = SidebarParser::bazaar().unwrap();
        let groups = parser.parse(&[RawGroup {
            title: "Nada".into(),
            clear_action: Some("removeFilters('x')".into()),
            controls: vec![],
        }]);
        assert!(groups.is_empty());
    }

    #[test]
    fn patterns_are_validated() {
        assert!(matches!(
            SidebarParser::new("(", "x"),
            Err(ConfigError::Pattern { .. })
        ));
        assert!(matches!(
            SidebarParser::new(r"^id_(\d+)$", r"(?P<key>.+)"),
            Err(ConfigError::MissingGroup { group: "value", .. })
        ));
    }

    #[test]
    fn group_dimension_uses_sidebar_labels() {
        let parser = SidebarParser::bazaar().unwrap();
        let groups = parser.parse(&[RawGroup {
            title: "Cor".into(),
            clear_action: Some("removeFilters('cor')".into()),
            controls: vec![control("filtro_cor_6", "(4) Vermelho")],
        }]);
        let dim = groups[0].dimension("cor");
        assert_eq!(dim.key(), "cor");
        assert_eq!(dim.label_for(&FacetValue::from("6")), "Vermelho");
    }
}
