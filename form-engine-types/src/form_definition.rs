use std::collections::HashSet;

use crate::{DefinitionError, FieldConfig, FieldKind};

/// The top-level structure of a form: its fields plus presentation metadata.
///
/// A definition is presentation-agnostic; the dispatch layer turns it into
/// views and the flows use it to validate and submit.
#[derive(Debug, Clone, Default)]
pub struct FormDefinition {
    /// Optional heading.
    pub title: Option<String>,

    /// All fields, in render order.
    pub fields: Vec<FieldConfig>,

    /// Text of the submit control.
    pub submit_label: Option<String>,
}

impl FormDefinition {
    /// Create a new definition with the given fields.
    pub fn new(fields: Vec<FieldConfig>) -> Self {
        Self {
            title: None,
            fields,
            submit_label: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the submit control's text.
    pub fn with_submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = Some(label.into());
        self
    }

    /// Get the fields.
    pub fn fields(&self) -> &[FieldConfig] {
        &self.fields
    }

    /// Find a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Field names in render order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldConfig::name)
    }

    /// Fields whose `equal_to` points at `name`.
    pub fn fields_equal_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldConfig> {
        self.fields
            .iter()
            .filter(move |field| field.equal_to_field() == Some(name))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check structural consistency: unique names and references that
    /// resolve to fields of the same level. Repeater sub-fields are checked
    /// against their own level.
    pub fn check(&self) -> Result<(), DefinitionError> {
        check_level(&self.fields, None)
    }
}

fn check_level(fields: &[FieldConfig], parent: Option<&str>) -> Result<(), DefinitionError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name()) {
            return Err(DefinitionError::DuplicateField {
                name: qualified(parent, field.name()),
            });
        }
    }

    for field in fields {
        if let Some(other) = field.equal_to_field()
            && !seen.contains(other)
        {
            return Err(DefinitionError::UnknownEqualTo {
                field: qualified(parent, field.name()),
                target: other.to_string(),
            });
        }

        match field.kind() {
            FieldKind::SelectBox(config) => {
                if let Some(missing) = config
                    .dependencies()
                    .iter()
                    .find(|dependency| !seen.contains(dependency.as_str()))
                {
                    return Err(DefinitionError::UnknownDependency {
                        field: qualified(parent, field.name()),
                        dependency: missing.clone(),
                    });
                }
            }
            FieldKind::Repeater(config) => {
                check_level(&config.sub_fields, Some(field.name()))?;
            }
            _ => {}
        }
    }

    Ok(())
}

fn qualified(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RepeaterConfig, SelectBoxConfig};

    #[test]
    fn duplicate_names_are_rejected() {
        let definition =
            FormDefinition::new(vec![FieldConfig::text("name"), FieldConfig::email("name")]);
        assert!(matches!(
            definition.check(),
            Err(DefinitionError::DuplicateField { name }) if name == "name"
        ));
    }

    #[test]
    fn dangling_references_are_rejected() {
        let definition =
            FormDefinition::new(vec![FieldConfig::password("repassword").equal_to("password")]);
        assert!(matches!(
            definition.check(),
            Err(DefinitionError::UnknownEqualTo { .. })
        ));

        let definition = FormDefinition::new(vec![FieldConfig::select(
            "product",
            SelectBoxConfig::dependent(["category"], |_| Vec::new()),
        )]);
        assert!(matches!(
            definition.check(),
            Err(DefinitionError::UnknownDependency { dependency, .. }) if dependency == "category"
        ));
    }

    #[test]
    fn repeater_levels_are_checked_separately() {
        let definition = FormDefinition::new(vec![
            FieldConfig::text("name"),
            FieldConfig::repeater(
                "holdings",
                RepeaterConfig::new(vec![FieldConfig::text("name"), FieldConfig::text("name")]),
            ),
        ]);
        assert!(matches!(
            definition.check(),
            Err(DefinitionError::DuplicateField { name }) if name == "holdings.name"
        ));
    }

    #[test]
    fn consistent_definition_passes() {
        let definition = FormDefinition::new(vec![
            FieldConfig::password("password").required(),
            FieldConfig::password("repassword").equal_to("password").required(),
        ])
        .with_title("Registrazione");

        assert!(definition.check().is_ok());
        assert_eq!(
            definition.fields_equal_to("password").map(FieldConfig::name).collect::<Vec<_>>(),
            vec!["repassword"]
        );
    }
}
