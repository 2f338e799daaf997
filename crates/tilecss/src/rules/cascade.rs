//! Rule cascade: collects the rules of a layer from the block tree and
//! resolves overlapping rules into a specificity-ordered list.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::Rule;
use crate::logging::targets;
use crate::selector::{merge_filters, Filter, Selector, ZoomRange};
use crate::style::{combine_properties, Block, Properties, Stylesheet};

static EMPTY_PROPERTIES: Properties = Properties::empty();

impl Stylesheet {
    /// Every layer named in a selector, in order of first appearance.
    pub fn layer_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for block in self.root.walk() {
            for layer in block.selectors.iter().filter_map(|s| s.layer.as_deref()) {
                if seen.insert(layer) {
                    names.push(layer.to_string());
                }
            }
        }
        names
    }

    /// Resolved rules of `layer`, most specific first.
    ///
    /// Class selectors only match when the class is in `classes`.
    pub fn layer_rules(&self, layer: &str, classes: &[&str]) -> Vec<Rule> {
        self.layer_zoom_rules(layer, ZoomRange::ALL, classes)
    }

    /// Like [`layer_rules`](Self::layer_rules), restricted to `zoom`.
    pub fn layer_zoom_rules(&self, layer: &str, zoom: ZoomRange, classes: &[&str]) -> Vec<Rule> {
        if zoom.is_empty() {
            return Vec::new();
        }
        let mut collector = Collector {
            layer,
            classes,
            order: 1,
            attachments: HashMap::new(),
            rules: Vec::new(),
        };
        let parent = Rule {
            zoom,
            ..Rule::default()
        };
        collector.collect(&self.root, &parent);

        let collected = collector.rules.len();
        let mut rules = sorted_rules(collector.rules, &collector.attachments, classes);
        for rule in &mut rules {
            rule.layer.get_or_insert_with(|| layer.to_string());
        }
        debug!(
            target: targets::CASCADE,
            layer,
            %zoom,
            collected,
            resolved = rules.len(),
            "resolved layer rules"
        );
        rules
    }

    /// Properties of the `Map {}` block. Empty before evaluation.
    pub fn map_properties(&self) -> &Properties {
        self.map.properties.as_ref().unwrap_or(&EMPTY_PROPERTIES)
    }
}

/// Union of the zoom ranges of `rules`.
pub fn rules_zoom(rules: &[Rule]) -> ZoomRange {
    rules
        .iter()
        .fold(ZoomRange::INVALID, |zoom, rule| zoom.union(rule.zoom))
}

struct Collector<'a> {
    layer: &'a str,
    classes: &'a [&'a str],
    order: usize,
    /// Order at which each attachment was first seen.
    attachments: HashMap<String, usize>,
    rules: Vec<Rule>,
}

impl Collector<'_> {
    fn collect(&mut self, block: &Block, parent: &Rule) {
        if block.selectors.is_empty() {
            for child in &block.blocks {
                self.collect(child, parent);
            }
            return;
        }
        for selector in &block.selectors {
            let Some(current) = self.enter(selector, parent) else {
                continue;
            };
            if let Some(properties) = block.properties.as_ref().filter(|p| !p.is_empty()) {
                self.order += 1;
                let mut rule = Rule {
                    properties: properties.clone(),
                    order: self.order,
                    ..current.clone()
                };
                let specificity = rule.specificity();
                rule.properties.set_specificity(specificity);
                self.rules.push(rule);
            }
            for child in &block.blocks {
                self.collect(child, &current);
            }
        }
    }

    /// Narrow `parent` by `selector`, or `None` if the selector cannot match.
    fn enter(&mut self, selector: &Selector, parent: &Rule) -> Option<Rule> {
        let mut current = Rule {
            layer: parent.layer.clone(),
            class: parent.class.clone(),
            attachment: parent.attachment.clone(),
            filters: parent.filters.clone(),
            zoom: parent.zoom,
            ..Rule::default()
        };
        if let Some(layer) = &selector.layer {
            if layer != self.layer {
                return None;
            }
            current.layer = Some(layer.clone());
        }
        if let Some(class) = &selector.class {
            if !self.classes.contains(&class.as_str()) {
                return None;
            }
            current.class = Some(class.clone());
        }
        if let Some(attachment) = &selector.attachment {
            self.attachments
                .entry(attachment.clone())
                .or_insert(self.order);
            current.attachment = Some(attachment.clone());
        }
        if !selector.filters.is_empty() {
            current.filters = merge_filters(&current.filters, &selector.filters)?;
        }
        current.zoom = current.zoom.combine(selector.zoom);
        if current.zoom.is_empty() {
            return None;
        }
        Some(current)
    }
}

/// Ordering that puts the most specific rule first: rules with a layer,
/// then by attachment appearance (rules without attachment last), more
/// filters, fewer zoom levels, and later collection order.
fn most_specific_first(a: &Rule, b: &Rule, attachments: &HashMap<String, usize>) -> Ordering {
    let rank = |rule: &Rule| {
        rule.attachment
            .as_ref()
            .and_then(|attachment| attachments.get(attachment))
            .copied()
            .unwrap_or(usize::MAX)
    };
    b.layer
        .is_some()
        .cmp(&a.layer.is_some())
        .then_with(|| rank(a).cmp(&rank(b)))
        .then_with(|| b.filters.len().cmp(&a.filters.len()))
        .then_with(|| {
            if a.zoom == b.zoom {
                return Ordering::Equal;
            }
            a.zoom
                .levels()
                .cmp(&b.zoom.levels())
                .then_with(|| b.zoom.cmp(&a.zoom))
        })
        .then_with(|| b.order.cmp(&a.order))
}

pub(crate) fn sorted_rules(
    mut rules: Vec<Rule>,
    attachments: &HashMap<String, usize>,
    classes: &[&str],
) -> Vec<Rule> {
    if rules.is_empty() {
        return rules;
    }
    rules.sort_by(|a, b| most_specific_first(a, b, attachments));

    let mut pos = 0;
    while pos < rules.len() {
        // Combined rules are inserted before `pos`.
        pos += extend_at(&mut rules, pos);
        pos += 1;
    }

    if classes.is_empty() {
        dedup(rules)
    } else {
        dedup_merge_classes(rules, classes)
    }
}

/// Extend `rules[pos]` against the rules after it. Returns the number of
/// rules inserted in front of it.
fn extend_at(rules: &mut Vec<Rule>, pos: usize) -> usize {
    let (head, tail) = rules.split_at_mut(pos + 1);
    let combined = fill_properties(&mut head[pos], tail);
    insert_combined(rules, pos, combined)
}

fn extend_rule(rule: &mut Rule, rules: &mut Vec<Rule>, pos: usize) -> usize {
    let combined = fill_properties(rule, &mut rules[pos + 1..]);
    insert_combined(rules, pos, combined)
}

fn insert_combined(rules: &mut Vec<Rule>, pos: usize, mut combined: Vec<Rule>) -> usize {
    if combined.is_empty() {
        return 0;
    }
    let mut added = 0;
    for rule in &mut combined {
        added += extend_rule(rule, rules, pos);
    }
    let at = pos + added;
    let count = combined.len();
    rules.splice(at..at, combined);
    added + count
}

/// Inherit missing properties from the less specific `sub_rules` and
/// return the combinations of `rule` with overlapping rules that do not
/// exist yet.
fn fill_properties(rule: &mut Rule, sub_rules: &mut [Rule]) -> Vec<Rule> {
    let mut new_rules: Vec<Rule> = Vec::new();
    for i in 0..sub_rules.len() {
        let other = &sub_rules[i];
        if rule.same(other) || rule.child_of(other) {
            trace!(target: targets::CASCADE, %rule, %other, "inherit");
            rule.properties.merge_missing(&other.properties);
            continue;
        }
        if !rule.overlaps(other) {
            continue;
        }

        let combined = combine_rules(rule, other);
        trace!(target: targets::CASCADE, %rule, %other, %combined, "combine");
        if sub_rules[i].same(&combined) {
            sub_rules[i].properties.merge_missing(&combined.properties);
        } else if rule.same(&combined) {
            rule.properties.merge_missing(&combined.properties);
        } else if let Some(existing) = new_rules.iter_mut().find(|r| r.same(&combined)) {
            existing.properties.merge_missing(&combined.properties);
        } else if let Some(existing) = sub_rules.iter_mut().find(|r| r.same(&combined)) {
            existing.properties.merge_missing(&combined.properties);
        } else {
            new_rules.push(combined);
        }
    }
    new_rules
}

/// Selector of `a` narrowed by `b`, with the properties of both.
fn combine_rules(a: &Rule, b: &Rule) -> Rule {
    Rule {
        layer: a.layer.clone(),
        attachment: a.attachment.clone(),
        class: a.class.clone(),
        filters: combine_filters(&a.filters, &b.filters),
        zoom: a.zoom.combine(b.zoom),
        properties: combine_properties(&a.properties, &b.properties),
        order: a.order,
    }
}

/// Filters of `a`, plus filters of `b` on fields `a` does not constrain.
fn combine_filters(a: &[Filter], b: &[Filter]) -> Vec<Filter> {
    let mut combined = a.to_vec();
    for filter in b {
        if !a.iter().any(|f| f.field == filter.field) {
            combined.push(filter.clone());
        }
    }
    combined.sort_by(|x, y| x.field.cmp(&y.field));
    combined
}

/// Drop rules whose selector already appeared.
fn dedup(rules: Vec<Rule>) -> Vec<Rule> {
    let mut seen = HashSet::with_capacity(rules.len());
    rules
        .into_iter()
        .filter(|rule| seen.insert(rule.selector_hash()))
        .collect()
}

/// Merge rules that differ only in class. The rule whose class comes first
/// in `classes` wins and takes the other's properties as defaults.
fn dedup_merge_classes(rules: Vec<Rule>, classes: &[&str]) -> Vec<Rule> {
    let class_index = |class: &Option<String>| {
        class
            .as_deref()
            .and_then(|class| classes.iter().position(|c| *c == class))
            .unwrap_or(usize::MAX)
    };

    let mut result: Vec<Rule> = Vec::with_capacity(rules.len());
    for mut rule in rules {
        match result.iter_mut().find(|r| rule.same_except_class(r)) {
            Some(existing) => {
                let (new_index, existing_index) = (class_index(&rule.class), class_index(&existing.class));
                if new_index < existing_index {
                    rule.properties.merge_missing(&existing.properties);
                    *existing = rule;
                } else if existing_index < new_index {
                    existing.properties.merge_missing(&rule.properties);
                }
            }
            None => result.push(rule),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use crate::expr::Value;
    use crate::parser::Decoder;
    use crate::selector::{CompOp, FilterValue};
    use crate::style::{Position, PropertyKey};

    static INDEX: AtomicUsize = AtomicUsize::new(0);

    fn props(entries: &[(&str, &str, f64)]) -> Properties {
        let mut properties = Properties::new();
        for (instance, name, value) in entries {
            let position = Position {
                index: INDEX.fetch_add(1, AtomicOrdering::Relaxed),
                ..Position::default()
            };
            properties.set(
                PropertyKey::with_instance(*name, *instance),
                Value::Number(*value),
                position,
            );
        }
        properties
    }

    fn eq(field: &str, value: &str) -> Filter {
        Filter::new(field, CompOp::Eq, FilterValue::String(value.into()))
    }

    fn num(field: &str, op: CompOp, value: f64) -> Filter {
        Filter::new(field, op, FilterValue::Number(value))
    }

    fn rule(filters: Vec<Filter>, properties: Properties) -> Rule {
        Rule {
            filters,
            properties,
            ..Rule::default()
        }
    }

    fn sorted(rules: Vec<Rule>) -> Vec<Rule> {
        sorted_rules(rules, &HashMap::new(), &[])
    }

    fn filters_of(rule: &Rule) -> String {
        rule.filters.iter().map(ToString::to_string).collect()
    }

    fn keys_of(rule: &Rule) -> Vec<String> {
        rule.properties.keys().map(ToString::to_string).collect()
    }

    #[test]
    fn no_infinite_loop_on_nested_zoom_ranges() {
        let zoom = |level| Rule {
            zoom: ZoomRange::new(CompOp::Gte, level),
            properties: props(&[("", "width", 1.0)]),
            ..Rule::default()
        };
        let rules = vec![
            rule(vec![eq("bar", "foo")], props(&[("", "width", 1.0)])),
            zoom(12),
            zoom(13),
            zoom(14),
            zoom(15),
        ];
        assert_eq!(sorted(rules).len(), 9);
    }

    #[test]
    fn combinations_are_not_duplicated() {
        let single = || {
            vec![
                rule(vec![eq("a", "1")], props(&[("", "a", 1.0)])),
                rule(vec![eq("b", "1")], props(&[("", "b", 1.0)])),
                rule(vec![eq("c", "1")], props(&[("", "c", 1.0)])),
            ]
        };
        assert_eq!(sorted(single()).len(), 7);

        let mut rules = single();
        rules.push(rule(
            vec![eq("a", "1"), eq("b", "1")],
            props(&[("", "b", 2.0), ("", "a", 2.0)]),
        ));
        assert_eq!(sorted(rules).len(), 7);
    }

    #[test]
    fn disjoint_filters_combine() {
        let rules = vec![
            rule(vec![eq("type", "road")], props(&[("", "width", 1.0)])),
            rule(vec![eq("tunnel", "1")], props(&[("", "dash-array", 1.0)])),
            rule(vec![eq("access", "private")], props(&[("", "color", 1.0)])),
        ];
        let rules = sorted(rules);
        let summary: Vec<_> = rules.iter().map(|r| (filters_of(r), keys_of(r))).collect();
        let expected = [
            ("[access='private'][tunnel='1'][type='road']", vec!["color", "dash-array", "width"]),
            ("[tunnel='1'][type='road']", vec!["dash-array", "width"]),
            ("[access='private'][type='road']", vec!["color", "width"]),
            ("[type='road']", vec!["width"]),
            ("[access='private'][tunnel='1']", vec!["color", "dash-array"]),
            ("[tunnel='1']", vec!["dash-array"]),
            ("[access='private']", vec!["color"]),
        ];
        assert_eq!(summary.len(), expected.len());
        for ((filters, keys), (want_filters, want_keys)) in summary.iter().zip(expected) {
            assert_eq!(filters, want_filters);
            assert_eq!(keys, &want_keys);
        }
    }

    #[test]
    fn class_combinations() {
        // .A[a=1] { a: 1 } .B[b=1] { b: 1 }
        let rules = vec![
            Rule {
                class: Some("A".into()),
                ..rule(vec![eq("a", "1")], props(&[("", "a", 1.0)]))
            },
            Rule {
                class: Some("B".into()),
                ..rule(vec![eq("b", "1")], props(&[("", "b", 1.0)]))
            },
        ];
        let rules = sorted(rules);
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].class.as_deref(), Some("A"));
        assert_eq!(filters_of(&rules[0]), "[a='1'][b='1']");
        assert_eq!(keys_of(&rules[0]), ["a", "b"]);
        assert_eq!(filters_of(&rules[1]), "[a='1']");
        assert_eq!(keys_of(&rules[1]), ["a"]);
        assert_eq!(rules[2].class.as_deref(), Some("B"));
        assert_eq!(keys_of(&rules[2]), ["b"]);
    }

    #[test]
    fn class_combinations_with_instances() {
        // .A::X[a=1] { a: 1 } .B::X[a=1][b=2] { b/b: 1 }
        let rules = vec![
            Rule {
                class: Some("A".into()),
                attachment: Some("X".into()),
                ..rule(vec![eq("a", "1")], props(&[("", "a", 1.0)]))
            },
            Rule {
                class: Some("B".into()),
                attachment: Some("X".into()),
                ..rule(vec![eq("a", "1"), eq("b", "2")], props(&[("b", "b", 1.0)]))
            },
        ];
        let rules = sorted(rules);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].class.as_deref(), Some("B"));
        assert_eq!(keys_of(&rules[0]), ["a", "b/b"]);
        assert_eq!(rules[1].class.as_deref(), Some("A"));
        assert_eq!(keys_of(&rules[1]), ["a"]);
    }

    #[test]
    fn redundant_rule_is_kept() {
        // [size > 1000],
        // [zoom >= 17] {
        //   [size > 2000] { line-width: 2; }
        //   line-width: 1;
        // }
        let z17 = ZoomRange::new(CompOp::Gte, 17);
        let size = |limit| vec![num("size", CompOp::Gt, limit)];
        let rules = vec![
            Rule {
                order: 2,
                ..rule(size(1000.0), props(&[("", "width", 1.0)]))
            },
            Rule {
                zoom: z17,
                order: 4,
                ..rule(vec![], props(&[("", "width", 1.0)]))
            },
            Rule {
                order: 3,
                ..rule(size(2000.0), props(&[("", "width", 2.0)]))
            },
            Rule {
                zoom: z17,
                order: 5,
                ..rule(size(2000.0), props(&[("", "width", 2.0)]))
            },
        ];
        let rules = sorted(rules);
        let summary: Vec<_> = rules
            .iter()
            .map(|r| (filters_of(r), r.zoom, r.properties.get_float("width")))
            .collect();
        assert_eq!(
            summary,
            [
                ("[size>2000]".to_string(), z17, Some(2.0)),
                ("[size>2000]".to_string(), ZoomRange::ALL, Some(2.0)),
                ("[size>1000]".to_string(), z17, Some(1.0)),
                ("[size>1000]".to_string(), ZoomRange::ALL, Some(1.0)),
                (String::new(), z17, Some(1.0)),
            ]
        );
    }

    #[test]
    fn classes_merge_by_requested_order() {
        let a = Rule {
            class: Some("a".into()),
            ..rule(vec![], props(&[("", "width", 1.0), ("", "color", 1.0)]))
        };
        let b = Rule {
            class: Some("b".into()),
            ..rule(vec![], props(&[("", "width", 2.0)]))
        };
        let merged = dedup_merge_classes(vec![a.clone(), b.clone()], &["b", "a"]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].class.as_deref(), Some("b"));
        assert_eq!(merged[0].properties.get_float("width"), Some(2.0));
        assert_eq!(merged[0].properties.get_float("color"), Some(1.0));

        let merged = dedup_merge_classes(vec![a, b], &["a", "b"]);
        assert_eq!(merged[0].class.as_deref(), Some("a"));
    }

    #[test]
    fn combine_filters_keeps_first_side() {
        let a = vec![eq("highway", "path"), eq("oneway", "yes")];
        let b = vec![eq("bridge", "1"), eq("highway", "track")];
        let combined: String = combine_filters(&a, &b).iter().map(ToString::to_string).collect();
        assert_eq!(combined, "[bridge='1'][highway='path'][oneway='yes']");
    }

    fn evaluated(source: &str) -> Stylesheet {
        let mut decoder = Decoder::new();
        decoder.parse_str(source).unwrap();
        decoder.evaluate().unwrap();
        decoder.into_stylesheet()
    }

    #[test]
    fn layer_names_in_order() {
        let stylesheet = evaluated("#b { #c {} } #a, #b { } [x=1] { #d { } }");
        assert_eq!(stylesheet.layer_names(), ["b", "c", "a", "d"]);
    }

    #[test]
    fn collected_properties_carry_selector_specificity() {
        let stylesheet = evaluated(
            "#roads { line-width: 1; }
             [highway='path'] { line-width: 2; }",
        );
        let rules = stylesheet.layer_rules("roads", &[]);
        let summary: Vec<_> = rules
            .iter()
            .map(|r| (filters_of(r), r.properties.get_float("line-width")))
            .collect();
        // The layer selector beats the filter.
        assert_eq!(
            summary,
            [
                ("[highway='path']".to_string(), Some(1.0)),
                (String::new(), Some(1.0)),
                ("[highway='path']".to_string(), Some(2.0)),
            ]
        );
        assert!(rules.iter().all(|r| r.layer.as_deref() == Some("roads")));
    }

    #[test]
    fn classes_gate_selectors() {
        let stylesheet = evaluated(
            "#roads { line-width: 1; }
             .major { line-width: 3; }
             .minor { line-color: #888; }",
        );
        assert_eq!(stylesheet.layer_rules("roads", &[]).len(), 1);

        let rules = stylesheet.layer_rules("roads", &["minor", "major"]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].class.as_deref(), Some("minor"));
        assert_eq!(rules[0].properties.get_float("line-width"), Some(1.0));
        assert!(rules[0].properties.get_color("line-color").is_some());
    }

    #[test]
    fn zoom_query_and_rules_zoom() {
        let stylesheet = evaluated("#a[zoom>=10] { line-width: 1; } #a[zoom=5] { line-width: 2; }");
        let rules = stylesheet.layer_rules("a", &[]);
        assert_eq!(rules.len(), 2);
        let zoom = rules_zoom(&rules);
        assert!(zoom.valid_for(5) && zoom.valid_for(10) && zoom.valid_for(30));
        assert!(!zoom.valid_for(6));

        let rules = stylesheet.layer_zoom_rules("a", ZoomRange::new(CompOp::Eq, 5), &[]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].properties.get_float("line-width"), Some(2.0));
        assert!(stylesheet.layer_zoom_rules("a", ZoomRange::INVALID, &[]).is_empty());
        assert_eq!(rules_zoom(&[]), ZoomRange::INVALID);
    }

    #[test]
    fn map_properties_default_to_empty() {
        let stylesheet = Stylesheet::default();
        assert!(stylesheet.map_properties().is_empty());
    }
}
