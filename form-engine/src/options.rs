//! Options of select boxes, including the ones that depend on other fields.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    FieldKind, FieldValue, FormData, FormDefinition, OptionSource, SelectBoxConfig, SelectOption,
    UNSET,
};

/// Text of the placeholder entry shown while a dependency is unresolved.
pub const PLACEHOLDER_TEXT: &str = "Seleziona...";

/// The options a select box offers for the current form data.
///
/// While one of its dependencies is unresolved, a dependent select box
/// starts with an `"unset"` placeholder, hidden once real options exist.
pub fn resolve_options(config: &SelectBoxConfig, data: &FormData) -> Vec<SelectOption> {
    match &config.source {
        OptionSource::Fixed(options) => options.clone(),
        OptionSource::Dependent {
            dependencies,
            get_options,
        } => {
            let mut options = get_options(data);
            if dependencies.iter().any(|name| is_unresolved(data.value(name))) {
                options.insert(0, SelectOption::placeholder(PLACEHOLDER_TEXT, !options.is_empty()));
            }
            options
        }
    }
}

/// A dependency without a usable value. Zero and `false` count as resolved.
pub fn is_unresolved(value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => true,
        FieldValue::Text(text) => text.is_empty(),
        _ => false,
    }
}

/// The value a select box must switch to after its options changed, if any.
///
/// A single select whose value is no longer offered falls back to `"unset"`
/// when nothing real is offered or a dependency is unresolved, and to the
/// first real option otherwise. A multi-select keeps only offered values.
pub fn reconcile_selection(
    config: &SelectBoxConfig,
    options: &[SelectOption],
    current: &FieldValue,
    data: &FormData,
) -> Option<FieldValue> {
    let offered: Vec<&SelectOption> = options.iter().filter(|o| !o.is_placeholder()).collect();

    if config.multiple {
        let items = current.as_list()?;
        let kept: Vec<FieldValue> = items
            .iter()
            .filter(|item| offered.iter().any(|option| &option.value == *item))
            .cloned()
            .collect();
        return (kept.len() != items.len()).then_some(FieldValue::List(kept));
    }

    if offered.iter().any(|option| &option.value == current) {
        return None;
    }

    let unresolved = config
        .dependencies()
        .iter()
        .any(|name| is_unresolved(data.value(name)));
    let next = match offered.first() {
        Some(first) if !unresolved => first.value.clone(),
        _ => FieldValue::from(UNSET),
    };

    (&next != current).then_some(next)
}

/// Tracks dependency values of every dependent select box of a form, so
/// options are recomputed only when a dependency actually changed.
#[derive(Debug, Clone, Default)]
pub struct DependentOptions {
    snapshots: BTreeMap<String, Vec<FieldValue>>,
}

impl DependentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current dependency values without resetting anything.
    pub fn observe(&mut self, definition: &FormDefinition, data: &FormData) {
        self.snapshots = dependent_fields(definition)
            .map(|(name, config)| (name.to_string(), dependency_values(config, data)))
            .collect();
    }

    /// Recompute the select boxes whose dependencies changed since the last
    /// call and return the resets they need, in field order.
    pub fn refresh(
        &mut self,
        definition: &FormDefinition,
        data: &FormData,
    ) -> Vec<(String, FieldValue)> {
        let mut resets = Vec::new();

        for (name, config) in dependent_fields(definition) {
            let values = dependency_values(config, data);
            if self.snapshots.get(name) == Some(&values) {
                continue;
            }
            self.snapshots.insert(name.to_string(), values);

            let options = resolve_options(config, data);
            debug!(field = name, count = options.len(), "recomputed dependent options");

            if let Some(next) = reconcile_selection(config, &options, data.value(name), data) {
                debug!(field = name, value = ?next, "resetting dependent select box");
                resets.push((name.to_string(), next));
            }
        }

        resets
    }
}

fn dependent_fields(
    definition: &FormDefinition,
) -> impl Iterator<Item = (&str, &SelectBoxConfig)> {
    definition
        .fields()
        .iter()
        .filter_map(|field| match field.kind() {
            FieldKind::SelectBox(config) if config.is_dependent() => Some((field.name(), config)),
            _ => None,
        })
}

fn dependency_values(config: &SelectBoxConfig, data: &FormData) -> Vec<FieldValue> {
    config
        .dependencies()
        .iter()
        .map(|name| data.value(name).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldConfig;
    use pretty_assertions::assert_eq;

    fn products() -> SelectBoxConfig {
        SelectBoxConfig::dependent(["category"], |data| match data.get_str("category") {
            Some("equity") => vec![
                SelectOption::new("eq-eu", "Azionario Europa"),
                SelectOption::new("eq-us", "Azionario USA"),
            ],
            Some("bond") => vec![SelectOption::new("bd-gov", "Governativo")],
            _ => Vec::new(),
        })
    }

    fn definition() -> FormDefinition {
        FormDefinition::new(vec![
            FieldConfig::select(
                "category",
                SelectBoxConfig::fixed(vec![
                    SelectOption::new("equity", "Azionario"),
                    SelectOption::new("bond", "Obbligazionario"),
                ]),
            ),
            FieldConfig::select("product", products()),
        ])
    }

    #[test]
    fn placeholder_is_prepended_while_unresolved() {
        let options = resolve_options(&products(), &FormData::new());
        assert_eq!(options.len(), 1);
        assert!(options[0].is_placeholder());
        assert!(!options[0].hidden);

        let options = resolve_options(&products(), &FormData::new().with("category", "bond"));
        assert_eq!(options, vec![SelectOption::new("bd-gov", "Governativo")]);
    }

    #[test]
    fn zero_is_a_resolved_dependency() {
        assert!(is_unresolved(&FieldValue::Null));
        assert!(is_unresolved(&FieldValue::from("")));
        assert!(!is_unresolved(&FieldValue::from(0)));
        assert!(!is_unresolved(&FieldValue::from(false)));
    }

    #[test]
    fn value_no_longer_offered_resets_to_first_option() {
        let definition = definition();
        let mut tracker = DependentOptions::new();
        let data = FormData::new()
            .with("category", "equity")
            .with("product", "eq-us");
        tracker.observe(&definition, &data);

        let data = data.with("category", "bond");
        assert_eq!(
            tracker.refresh(&definition, &data),
            vec![("product".to_string(), FieldValue::from("bd-gov"))]
        );

        // Nothing changed since, nothing to do
        assert!(tracker.refresh(&definition, &data).is_empty());
    }

    #[test]
    fn empty_options_reset_to_unset() {
        let definition = definition();
        let mut tracker = DependentOptions::new();
        let data = FormData::new()
            .with("category", "equity")
            .with("product", "eq-eu");
        tracker.observe(&definition, &data);

        let data = data.with("category", "");
        assert_eq!(
            tracker.refresh(&definition, &data),
            vec![("product".to_string(), FieldValue::from(UNSET))]
        );
    }

    #[test]
    fn offered_value_is_kept() {
        let definition = definition();
        let mut tracker = DependentOptions::new();
        tracker.observe(&definition, &FormData::new());

        let data = FormData::new()
            .with("category", "equity")
            .with("product", "eq-us");
        assert!(tracker.refresh(&definition, &data).is_empty());
    }

    #[test]
    fn multi_select_keeps_offered_values() {
        let config = products().multiple();
        let data = FormData::new().with("category", "equity");
        let options = resolve_options(&config, &data);
        let current = FieldValue::List(vec!["eq-eu".into(), "bd-gov".into()]);

        assert_eq!(
            reconcile_selection(&config, &options, &current, &data),
            Some(FieldValue::List(vec!["eq-eu".into()]))
        );
    }
}
