use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::validation::{compute_all, compute_validation};
use crate::{FeedbackMap, FieldKind, FieldValue, FormData, FormDefinition, ValidationFeedback};

/// The state a mounted form owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowState {
    /// Current contents.
    pub form_data: FormData,

    /// Baseline for dirty tracking; `None` in create mode.
    pub initial_data: Option<FormData>,

    /// One entry per configured field.
    pub feedback: FeedbackMap,

    pub is_modified: bool,

    /// A collaborator call is in flight.
    pub is_saving: bool,

    /// A submit was attempted; all feedback is shown.
    pub validated: bool,

    /// Fields edited since the last reset; their feedback is shown.
    pub touched: BTreeSet<String>,

    /// Visibility of each field at the last evaluation.
    pub visibility: BTreeMap<String, bool>,

    /// Upsert only: no record exists yet, so submit creates one.
    pub is_create_mode: bool,
}

impl FlowState {
    /// An empty form with its declared defaults filled in.
    pub fn fresh(definition: &FormDefinition) -> Self {
        let mut state = Self {
            form_data: fresh_data(definition),
            ..Self::default()
        };
        state.settle(definition);
        state
    }

    /// Replace contents and baseline, forgetting edits and submit attempts.
    pub fn reset_to(
        &mut self,
        definition: &FormDefinition,
        data: FormData,
        baseline: Option<FormData>,
    ) {
        self.form_data = data;
        self.initial_data = baseline;
        self.touched.clear();
        self.validated = false;
        self.settle(definition);
    }

    /// Bring a freshly set record in line with the definition.
    ///
    /// Fields hidden by the record lose their values, in the contents and in
    /// the baseline alike, so a loaded record does not start out modified.
    fn settle(&mut self, definition: &FormDefinition) {
        // A cleared field can hide another one.
        for _ in 0..=definition.len() {
            let hidden: Vec<String> = definition
                .fields()
                .iter()
                .filter(|field| {
                    !field.is_visible(&self.form_data) && self.form_data.has_value(field.name())
                })
                .map(|field| field.name().to_string())
                .collect();
            if hidden.is_empty() {
                break;
            }
            for name in hidden {
                debug!(field = %name, "hidden field cleared");
                self.form_data.insert(name.as_str(), FieldValue::Null);
                if let Some(baseline) = self.initial_data.as_mut() {
                    baseline.insert(name, FieldValue::Null);
                }
            }
        }

        self.visibility = definition
            .fields()
            .iter()
            .map(|field| (field.name().to_string(), field.is_visible(&self.form_data)))
            .collect();
        self.recompute_feedback(definition);
        self.refresh_modified(definition);
    }

    pub fn recompute_feedback(&mut self, definition: &FormDefinition) {
        self.feedback = compute_all(definition.fields(), &self.form_data);
    }

    /// Mark the form as submitted and revalidate everything.
    ///
    /// Returns whether every field is valid.
    pub fn validate_all(&mut self, definition: &FormDefinition) -> bool {
        self.validated = true;
        self.recompute_feedback(definition);
        self.feedback.is_all_valid()
    }

    /// The change handler every edit goes through.
    ///
    /// Stores the value, takes the reported feedback (or computes it), and
    /// revalidates fields that must equal this one. Then visibility and the
    /// modified flag are brought up to date.
    pub fn handle_input_change(
        &mut self,
        definition: &FormDefinition,
        key: &str,
        value: FieldValue,
        reported: Option<ValidationFeedback>,
    ) {
        debug!(field = key, ?value, "field changed");
        self.touched.insert(key.to_string());
        self.apply_change(definition, key, value, reported);
        self.handle_visible_change(definition);
        self.refresh_modified(definition);
    }

    fn apply_change(
        &mut self,
        definition: &FormDefinition,
        key: &str,
        value: FieldValue,
        reported: Option<ValidationFeedback>,
    ) {
        self.form_data.insert(key, value);

        if let Some(field) = definition.field(key) {
            let feedback = match reported {
                Some(reported) if field.equal_to_field().is_none() => reported,
                _ => compute_validation(field, self.form_data.value(key), &self.form_data),
            };
            self.feedback.set(key, feedback);
        }

        for field in definition.fields_equal_to(key) {
            let feedback =
                compute_validation(field, self.form_data.value(field.name()), &self.form_data);
            self.feedback.set(field.name(), feedback);
        }
    }

    /// Re-evaluate visibility until it is stable.
    ///
    /// A field that becomes invisible loses its value (through the change
    /// handler) or, when it had none, gets a valid verdict. Any toggle
    /// recomputes the whole feedback map. Returns whether anything toggled.
    pub fn handle_visible_change(&mut self, definition: &FormDefinition) -> bool {
        let mut any_toggled = false;

        // Each round clears at least one field, so this terminates.
        for _ in 0..=definition.len() {
            let mut toggled = false;

            for field in definition.fields() {
                let name = field.name();
                let visible = field.is_visible(&self.form_data);
                let previous = self.visibility.insert(name.to_string(), visible);
                if previous.is_none_or(|previous| previous == visible) {
                    continue;
                }

                toggled = true;
                debug!(field = name, visible, "visibility changed");

                if !visible {
                    if self.form_data.value(name).is_blank() {
                        self.feedback.set(name, ValidationFeedback::valid());
                    } else {
                        self.apply_change(definition, name, FieldValue::Null, None);
                    }
                }
            }

            if !toggled {
                break;
            }
            any_toggled = true;
            self.recompute_feedback(definition);
        }

        any_toggled
    }

    /// Compare every configured field with the baseline.
    ///
    /// Without a baseline (create mode) any non-blank value counts as a
    /// modification, declared defaults included.
    pub fn refresh_modified(&mut self, definition: &FormDefinition) {
        let data = &self.form_data;
        self.is_modified = match &self.initial_data {
            Some(baseline) => definition.fields().iter().any(|field| {
                !same_value(data.value(field.name()), baseline.value(field.name()))
            }),
            None => definition.names().any(|name| data.has_value(name)),
        };
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.visibility.get(name).copied().unwrap_or(true)
    }

    /// Feedback of `name` if the page should show it: after a submit
    /// attempt, or once the field was edited.
    pub fn shown_feedback(&self, name: &str) -> Option<&ValidationFeedback> {
        if self.validated || self.touched.contains(name) {
            self.feedback.get(name)
        } else {
            None
        }
    }
}

/// The contents of a fresh form: declared defaults only.
pub fn fresh_data(definition: &FormDefinition) -> FormData {
    definition
        .fields()
        .iter()
        .filter_map(|field| Some((field.name().to_string(), field.default_value()?)))
        .collect()
}

/// Prepare a loaded record: checkboxes without a value become `false`.
pub fn normalise_loaded(definition: &FormDefinition, mut data: FormData) -> FormData {
    for field in definition.fields() {
        if matches!(field.kind(), FieldKind::Checkbox(_)) && data.value(field.name()).is_null() {
            data.insert(field.name(), false);
        }
    }
    data
}

/// Equal values, treating all blank values as the same.
fn same_value(a: &FieldValue, b: &FieldValue) -> bool {
    a == b || (a.is_blank() && b.is_blank())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckboxOptions, FieldConfig, NumberOptions, SelectBoxConfig};
    use pretty_assertions::assert_eq;

    fn registration() -> FormDefinition {
        FormDefinition::new(vec![
            FieldConfig::password("password").required(),
            FieldConfig::password("repassword")
                .label("Conferma password")
                .equal_to("password")
                .required(),
        ])
    }

    #[test]
    fn confirmation_follows_the_password() {
        let definition = registration();
        let mut state = FlowState::fresh(&definition);

        state.handle_input_change(&definition, "password", "abcdefgh".into(), None);
        state.handle_input_change(&definition, "repassword", "abcdefgh".into(), None);
        assert!(state.feedback.is_valid("repassword"));

        // Editing the password invalidates the confirmation
        state.handle_input_change(&definition, "password", "abcdefgX".into(), None);
        assert!(!state.feedback.is_valid("repassword"));
        assert_eq!(
            state.feedback.get("repassword").and_then(|f| f.text()),
            Some("Conferma password non corrisponde a password")
        );

        state.handle_input_change(&definition, "repassword", "abcdefgX".into(), None);
        assert!(state.feedback.is_all_valid());
    }

    #[test]
    fn reported_feedback_is_replaced_by_the_equality_check() {
        let definition = registration();
        let mut state = FlowState::fresh(&definition);
        state.handle_input_change(&definition, "password", "abcdefgh".into(), None);

        state.handle_input_change(
            &definition,
            "repassword",
            "other-value".into(),
            Some(ValidationFeedback::valid()),
        );
        assert!(!state.feedback.is_valid("repassword"));
    }

    #[test]
    fn hiding_a_field_clears_its_value() {
        let definition = FormDefinition::new(vec![
            FieldConfig::checkbox("is_company"),
            FieldConfig::text("vat_number")
                .required()
                .visible_when(|data| data.get_bool("is_company") == Some(true)),
        ]);
        let mut state = FlowState::fresh(&definition);
        assert!(!state.is_visible("vat_number"));

        state.handle_input_change(&definition, "is_company", true.into(), None);
        assert!(state.is_visible("vat_number"));
        assert!(!state.feedback.is_valid("vat_number"));

        state.handle_input_change(&definition, "vat_number", "IT01234567890".into(), None);
        state.handle_input_change(&definition, "is_company", false.into(), None);

        assert_eq!(state.form_data.value("vat_number"), &FieldValue::Null);
        assert!(state.feedback.is_valid("vat_number"));
    }

    #[test]
    fn clearing_cascades_through_dependent_visibility() {
        let definition = FormDefinition::new(vec![
            FieldConfig::checkbox("has_spouse"),
            FieldConfig::text("spouse_name")
                .visible_when(|data| data.get_bool("has_spouse") == Some(true)),
            FieldConfig::text("spouse_employer").visible_when(|data| data.has_value("spouse_name")),
        ]);
        let mut state = FlowState::fresh(&definition);
        state.handle_input_change(&definition, "has_spouse", true.into(), None);
        state.handle_input_change(&definition, "spouse_name", "Anna".into(), None);
        state.handle_input_change(&definition, "spouse_employer", "ACME".into(), None);

        state.handle_input_change(&definition, "has_spouse", false.into(), None);

        assert_eq!(state.form_data.value("spouse_name"), &FieldValue::Null);
        assert_eq!(state.form_data.value("spouse_employer"), &FieldValue::Null);
        assert!(!state.is_visible("spouse_employer"));
    }

    #[test]
    fn create_form_is_modified_by_any_value() {
        let definition = FormDefinition::new(vec![
            FieldConfig::text("notes"),
            FieldConfig::select("tags", SelectBoxConfig::fixed(Vec::new()).multiple()),
        ]);
        let mut state = FlowState::fresh(&definition);
        assert!(!state.is_modified);

        state.handle_input_change(&definition, "notes", "prima visita".into(), None);
        assert!(state.is_modified);
        state.handle_input_change(&definition, "notes", "".into(), None);
        assert!(!state.is_modified);
        state.handle_input_change(&definition, "tags", FieldValue::List(Vec::new()), None);
        assert!(!state.is_modified);
    }

    #[test]
    fn declared_defaults_count_as_values() {
        let definition = FormDefinition::new(vec![
            FieldConfig::number("amount", NumberOptions::new().with_default(1000.0)),
            FieldConfig::new(
                "privacy",
                FieldKind::Checkbox(CheckboxOptions {
                    default: Some(false),
                }),
            ),
        ]);
        let state = FlowState::fresh(&definition);

        assert_eq!(state.form_data.get_number("amount"), Some(1000.0));
        assert_eq!(state.form_data.get_bool("privacy"), Some(false));
        assert!(state.is_modified);
    }

    #[test]
    fn loaded_record_drops_hidden_values() {
        let definition = FormDefinition::new(vec![
            FieldConfig::checkbox("has_spouse"),
            FieldConfig::text("spouse_name")
                .visible_when(|data| data.get_bool("has_spouse") == Some(true)),
            FieldConfig::text("spouse_employer").visible_when(|data| data.has_value("spouse_name")),
            FieldConfig::text("note"),
        ]);
        let record = FormData::new()
            .with("has_spouse", false)
            .with("spouse_name", "Anna")
            .with("spouse_employer", "Banca")
            .with("note", "ok");

        let mut state = FlowState::default();
        state.reset_to(&definition, record.clone(), Some(record));

        assert_eq!(state.form_data.get("spouse_name"), Some(&FieldValue::Null));
        assert_eq!(state.form_data.get("spouse_employer"), Some(&FieldValue::Null));
        assert_eq!(state.form_data.get_str("note"), Some("ok"));
        assert!(!state.is_visible("spouse_name"));
        assert!(!state.is_visible("spouse_employer"));
        assert!(!state.is_modified);
        assert!(state.feedback.is_all_valid());
    }

    #[test]
    fn feedback_is_shown_once_touched_or_validated() {
        let definition = registration();
        let mut state = FlowState::fresh(&definition);
        assert_eq!(state.shown_feedback("password"), None);

        state.handle_input_change(&definition, "password", "abc".into(), None);
        assert!(state.shown_feedback("password").is_some());
        assert_eq!(state.shown_feedback("repassword"), None);

        assert!(!state.validate_all(&definition));
        assert!(state.shown_feedback("repassword").is_some());
    }

    #[test]
    fn loaded_checkboxes_default_to_false() {
        let definition = FormDefinition::new(vec![FieldConfig::checkbox("newsletter")]);
        let data = normalise_loaded(&definition, FormData::new().with("newsletter", FieldValue::Null));
        assert_eq!(data.get_bool("newsletter"), Some(false));
    }
}
