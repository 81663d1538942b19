//! Editing repeater fields: lists of sub-forms sharing one field set.
//!
//! Every edit produces the whole new list and hands it to the form's change
//! handler, so the repeater's feedback and the modified flag stay current.

use tracing::debug;

use crate::flow::FlowState;
use crate::{FieldKind, FieldValue, FormData, FormDefinition, FormError, RepeaterConfig};

/// Append the configured default item.
pub fn add_item(
    state: &mut FlowState,
    definition: &FormDefinition,
    name: &str,
) -> Result<usize, FormError> {
    let config = repeater_config(definition, name)?;
    let mut items = current_items(state, name);
    items.push(FieldValue::Record((config.default_item)()));
    let index = items.len() - 1;

    debug!(field = name, index, "repeater item added");
    state.handle_input_change(definition, name, FieldValue::List(items), None);
    Ok(index)
}

/// Remove the item at `index`. Out-of-range indices are ignored.
pub fn remove_item(
    state: &mut FlowState,
    definition: &FormDefinition,
    name: &str,
    index: usize,
) -> Result<(), FormError> {
    repeater_config(definition, name)?;
    let mut items = current_items(state, name);
    if index >= items.len() {
        return Ok(());
    }
    items.remove(index);

    debug!(field = name, index, "repeater item removed");
    state.handle_input_change(definition, name, FieldValue::List(items), None);
    Ok(())
}

/// Set one sub-field of the item at `index`.
pub fn set_item_value(
    state: &mut FlowState,
    definition: &FormDefinition,
    name: &str,
    index: usize,
    sub_field: &str,
    value: FieldValue,
) -> Result<(), FormError> {
    let config = repeater_config(definition, name)?;
    if !config.sub_fields.iter().any(|field| field.name() == sub_field) {
        return Err(FormError::UnknownField(format!("{name}.{sub_field}")));
    }

    let mut items = current_items(state, name);
    let Some(item) = items.get_mut(index) else {
        return Err(FormError::UnknownField(format!("{name}.{index}")));
    };

    let mut record = item.as_record().cloned().unwrap_or_default();
    record.insert(sub_field, value);
    *item = FieldValue::Record(record);

    state.handle_input_change(definition, name, FieldValue::List(items), None);
    Ok(())
}

/// The items of a repeater as records; anything else reads as an empty item.
pub fn items(data: &FormData, name: &str) -> Vec<FormData> {
    data.value(name)
        .as_list()
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_record().cloned().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

fn repeater_config<'a>(
    definition: &'a FormDefinition,
    name: &str,
) -> Result<&'a RepeaterConfig, FormError> {
    match definition.field(name).map(|field| field.kind()) {
        Some(FieldKind::Repeater(config)) => Ok(config),
        Some(_) => Err(FormError::NotARepeater(name.to_string())),
        None => Err(FormError::UnknownField(name.to_string())),
    }
}

fn current_items(state: &FlowState, name: &str) -> Vec<FieldValue> {
    state
        .form_data
        .value(name)
        .as_list()
        .map(<[FieldValue]>::to_vec)
        .unwrap_or_default()
}
