//! The rendering dispatch layer: turns a definition plus flow state into a
//! presentation-agnostic view, choosing one control per visible field.

use crate::flow::FlowState;
use crate::options::resolve_options;
use crate::validation::item_feedback;
use crate::{
    FieldConfig, FieldKind, FieldPath, FieldType, FieldValue, FormData, FormDefinition,
    GridLayout, RepeaterConfig, SelectBoxConfig, SelectElement, SelectOption, ValidationFeedback,
};

/// Options of the dispatch layer.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Text of the submit control.
    pub submit_label: String,

    /// Also surface feedback of valid fields ("Nome è valido.").
    pub show_valid_feedback: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            submit_label: "Salva".to_string(),
            show_valid_feedback: false,
        }
    }
}

impl DispatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = label.into();
        self
    }

    pub fn show_valid_feedback(mut self, show: bool) -> Self {
        self.show_valid_feedback = show;
        self
    }
}

/// Everything a renderer needs to draw a form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub title: Option<String>,
    pub fields: Vec<FieldView>,
    pub submit: SubmitView,
    pub is_modified: bool,
}

impl FormView {
    /// Find a rendered field by its path, descending into repeater items.
    pub fn field(&self, path: &str) -> Option<&FieldView> {
        find_field(&self.fields, path)
    }
}

fn find_field<'a>(fields: &'a [FieldView], path: &str) -> Option<&'a FieldView> {
    fields.iter().find_map(|field| {
        if field.path.as_str() == path {
            return Some(field);
        }
        match &field.control {
            Control::Repeater { items, .. } => items.iter().find_map(|item| find_field(item, path)),
            _ => None,
        }
    })
}

/// The submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitView {
    pub label: String,
    /// Disabled while a save is in flight. A view taken through
    /// `GeneralForm::view` never sees this set, since `submit` borrows the
    /// form mutably; `FormListener::on_saving` reports that window instead.
    pub disabled: bool,
}

/// One rendered field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub path: FieldPath,
    pub label: String,
    pub field_type: FieldType,
    pub control: Control,
    pub value: FieldValue,
    /// Present once the page should show it.
    pub feedback: Option<ValidationFeedback>,
    pub required: bool,
    pub grid: GridLayout,
    pub placeholder: Option<String>,
}

impl FieldView {
    pub fn is_invalid(&self) -> bool {
        self.feedback.as_ref().is_some_and(|feedback| !feedback.is_valid)
    }
}

/// The control chosen for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Single-line input; `input_type` is the HTML input type.
    Input { input_type: &'static str },
    Number {
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    TextArea { rows: u16 },
    Checkbox,
    Select {
        options: Vec<SelectOption>,
        multiple: bool,
        search: bool,
        large_data_search: bool,
    },
    Cards {
        options: Vec<SelectOption>,
        multiple: bool,
    },
    DualSwitch {
        off: SelectOption,
        on: SelectOption,
    },
    File {
        multiple: bool,
        accept: Vec<String>,
        /// Uploaded immediately instead of submitted with the form.
        upload: bool,
    },
    RichText,
    Repeater {
        items: Vec<Vec<FieldView>>,
        add_label: String,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
}

/// Build the view of a form.
pub fn form_view(
    definition: &FormDefinition,
    state: &FlowState,
    options: &DispatchOptions,
) -> FormView {
    let fields = definition
        .fields()
        .iter()
        .filter(|field| state.is_visible(field.name()))
        .map(|field| {
            let feedback = state.shown_feedback(field.name()).cloned();
            field_view(
                field,
                &FieldPath::root(),
                &state.form_data,
                feedback,
                state.validated || state.touched.contains(field.name()),
                options,
            )
        })
        .collect();

    FormView {
        title: definition.title.clone(),
        fields,
        submit: SubmitView {
            label: definition
                .submit_label
                .clone()
                .unwrap_or_else(|| options.submit_label.clone()),
            disabled: state.is_saving,
        },
        is_modified: state.is_modified,
    }
}

fn field_view(
    field: &FieldConfig,
    parent: &FieldPath,
    data: &FormData,
    feedback: Option<ValidationFeedback>,
    show_feedback: bool,
    options: &DispatchOptions,
) -> FieldView {
    let path = parent.child(field.name());
    let value = data.value(field.name()).clone();
    let control = control_for(field, &path, &value, data, show_feedback, options);

    FieldView {
        label: field.label_text().to_string(),
        field_type: field.field_type(),
        control,
        value,
        feedback: feedback.filter(|feedback| options.show_valid_feedback || !feedback.is_valid),
        required: field.is_required(),
        grid: field.grid_layout(),
        placeholder: field.placeholder_text().map(str::to_string),
        path,
    }
}

fn control_for(
    field: &FieldConfig,
    path: &FieldPath,
    value: &FieldValue,
    data: &FormData,
    show_feedback: bool,
    options: &DispatchOptions,
) -> Control {
    match field.kind() {
        FieldKind::Text => Control::Input { input_type: "text" },
        FieldKind::Email => Control::Input { input_type: "email" },
        FieldKind::Tel => Control::Input { input_type: "tel" },
        FieldKind::Password => Control::Input {
            input_type: "password",
        },
        FieldKind::Date => Control::Input { input_type: "date" },
        FieldKind::DateTime => Control::Input {
            input_type: "datetime-local",
        },
        FieldKind::Number(number) => Control::Number {
            min: number.min,
            max: number.max,
            step: number.step,
        },
        FieldKind::TextArea(text_area) => Control::TextArea {
            rows: text_area.rows,
        },
        FieldKind::Checkbox(_) => Control::Checkbox,
        FieldKind::SelectBox(config) => select_control(config, data),
        FieldKind::FileInput(file) => Control::File {
            multiple: file.multiple,
            accept: file.accept.clone(),
            upload: false,
        },
        FieldKind::FileUpload(file) => Control::File {
            multiple: file.multiple,
            accept: file.accept.clone(),
            upload: true,
        },
        FieldKind::RichText => Control::RichText,
        FieldKind::Repeater(config) => repeater_control(config, path, value, show_feedback, options),
    }
}

fn select_control(config: &SelectBoxConfig, data: &FormData) -> Control {
    let options = resolve_options(config, data);

    match config.element {
        SelectElement::Cards => Control::Cards {
            options,
            multiple: config.multiple,
        },
        SelectElement::DualSwitch if !config.multiple => {
            let mut offered: Vec<_> = options
                .into_iter()
                .filter(|option| !option.is_placeholder())
                .collect();
            if offered.len() == 2 {
                let on = offered.remove(1);
                let off = offered.remove(0);
                Control::DualSwitch { off, on }
            } else {
                Control::Select {
                    options: offered,
                    multiple: false,
                    search: config.search,
                    large_data_search: config.large_data_search,
                }
            }
        }
        SelectElement::Custom => Control::Select {
            options,
            multiple: config.multiple,
            search: true,
            large_data_search: config.large_data_search,
        },
        SelectElement::Default | SelectElement::DualSwitch => Control::Select {
            options,
            multiple: config.multiple,
            search: config.search,
            large_data_search: config.large_data_search,
        },
    }
}

fn repeater_control(
    config: &RepeaterConfig,
    path: &FieldPath,
    value: &FieldValue,
    show_feedback: bool,
    options: &DispatchOptions,
) -> Control {
    let items = value
        .as_list()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let record = item.as_record().cloned().unwrap_or_default();
            let feedback = item_feedback(config, &record);
            let item_path = path.item(index);

            config
                .sub_fields
                .iter()
                .filter(|sub_field| sub_field.is_visible(&record))
                .map(|sub_field| {
                    let shown = show_feedback
                        .then(|| feedback.get(sub_field.name()).cloned())
                        .flatten();
                    field_view(sub_field, &item_path, &record, shown, show_feedback, options)
                })
                .collect()
        })
        .collect();

    Control::Repeater {
        items,
        add_label: config.add_label.clone(),
        min_items: config.min_items,
        max_items: config.max_items,
    }
}
