use std::fmt;
use std::sync::Arc;

use crate::{BoolOp, FieldValue, FormData, SelectBoxConfig, ValidationFeedback};

/// Decides from the whole form whether a field is shown.
pub type VisibilityFn = Arc<dyn Fn(&FormData) -> bool + Send + Sync>;

/// A custom validator: receives the field's value and the whole form.
pub type ValidatorFn = Arc<dyn Fn(&FieldValue, &FormData) -> ValidationFeedback + Send + Sync>;

/// Produces the record appended when a repeater item is added.
pub type DefaultItemFn = Arc<dyn Fn() -> FormData + Send + Sync>;

/// A single field of a form.
#[derive(Clone)]
pub struct FieldConfig {
    /// Key into the form data; unique per form.
    name: String,

    /// Human-readable name used in feedback messages.
    label: String,

    /// The kind of field (determines control and validation rule).
    kind: FieldKind,

    required: bool,

    /// Name of a field this one must equal (password confirmation).
    equal_to: Option<String>,

    visible: Option<VisibilityFn>,

    validation: Option<ValidatorFn>,

    /// How the custom verdict is combined with the standard one.
    bool_op: BoolOp,

    grid: GridLayout,

    placeholder: Option<String>,
}

impl FieldConfig {
    /// Create a new field. The label defaults to the name in Title Case.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: title_case(&name),
            name,
            kind,
            required: false,
            equal_to: None,
            visible: None,
            validation: None,
            bool_op: BoolOp::default(),
            grid: GridLayout::default(),
            placeholder: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn tel(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Tel)
    }

    pub fn number(name: impl Into<String>, options: NumberOptions) -> Self {
        Self::new(name, FieldKind::Number(options))
    }

    pub fn password(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Password)
    }

    pub fn text_area(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::TextArea(TextAreaOptions::default()))
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Checkbox(CheckboxOptions::default()))
    }

    pub fn select(name: impl Into<String>, config: SelectBoxConfig) -> Self {
        Self::new(name, FieldKind::SelectBox(config))
    }

    pub fn file_input(name: impl Into<String>, options: FileOptions) -> Self {
        Self::new(name, FieldKind::FileInput(options))
    }

    pub fn file_upload(name: impl Into<String>, options: FileOptions) -> Self {
        Self::new(name, FieldKind::FileUpload(options))
    }

    pub fn rich_text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::RichText)
    }

    pub fn repeater(name: impl Into<String>, config: RepeaterConfig) -> Self {
        Self::new(name, FieldKind::Repeater(config))
    }

    // === Builder setters ===

    /// Set the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Require this field to equal another field's value.
    pub fn equal_to(mut self, other: impl Into<String>) -> Self {
        self.equal_to = Some(other.into());
        self
    }

    /// Show the field only when `predicate` holds.
    pub fn visible_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&FormData) -> bool + Send + Sync + 'static,
    {
        self.visible = Some(Arc::new(predicate));
        self
    }

    /// Attach a custom validator, combined with the standard verdict by `op`.
    pub fn validate_with<F>(mut self, op: BoolOp, validator: F) -> Self
    where
        F: Fn(&FieldValue, &FormData) -> ValidationFeedback + Send + Sync + 'static,
    {
        self.validation = Some(Arc::new(validator));
        self.bool_op = op;
        self
    }

    /// Set the grid column spans.
    pub fn grid(mut self, grid: GridLayout) -> Self {
        self.grid = grid;
        self
    }

    /// Set the placeholder text.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    // === Accessors ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_text(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn equal_to_field(&self) -> Option<&str> {
        self.equal_to.as_deref()
    }

    pub fn validator(&self) -> Option<&ValidatorFn> {
        self.validation.as_ref()
    }

    pub fn bool_op(&self) -> BoolOp {
        self.bool_op
    }

    pub fn grid_layout(&self) -> GridLayout {
        self.grid
    }

    pub fn placeholder_text(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Check if the field has a visibility predicate at all.
    pub fn has_visibility_rule(&self) -> bool {
        self.visible.is_some()
    }

    /// Evaluate the visibility predicate; fields without one are always visible.
    pub fn is_visible(&self, data: &FormData) -> bool {
        self.visible.as_ref().is_none_or(|visible| visible(data))
    }

    /// The value a fresh form starts with for this field, if the kind declares one.
    pub fn default_value(&self) -> Option<FieldValue> {
        match &self.kind {
            FieldKind::Number(options) => options.default.map(FieldValue::Number),
            FieldKind::Checkbox(options) => options.default.map(FieldValue::Bool),
            FieldKind::SelectBox(config) => config.default.clone(),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("equal_to", &self.equal_to)
            .field("visible", &self.visible.is_some())
            .field("validation", &self.validation.is_some())
            .field("bool_op", &self.bool_op)
            .finish_non_exhaustive()
    }
}

/// The kind of field, carrying the options only that kind understands.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Number(NumberOptions),
    Password,
    TextArea(TextAreaOptions),
    Date,
    DateTime,
    Checkbox(CheckboxOptions),
    SelectBox(SelectBoxConfig),
    FileInput(FileOptions),
    FileUpload(FileOptions),
    RichText,
    /// A dynamic list of nested sub-forms.
    Repeater(RepeaterConfig),
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text => FieldType::Text,
            Self::Email => FieldType::Email,
            Self::Tel => FieldType::Tel,
            Self::Number(_) => FieldType::Number,
            Self::Password => FieldType::Password,
            Self::TextArea(_) => FieldType::TextArea,
            Self::Date => FieldType::Date,
            Self::DateTime => FieldType::DateTime,
            Self::Checkbox(_) => FieldType::Checkbox,
            Self::SelectBox(_) => FieldType::SelectBox,
            Self::FileInput(_) => FieldType::FileInput,
            Self::FileUpload(_) => FieldType::FileUpload,
            Self::RichText => FieldType::RichText,
            Self::Repeater(_) => FieldType::Repeater,
        }
    }
}

/// Fieldless discriminant of `FieldKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Email,
    Tel,
    Number,
    Password,
    TextArea,
    Date,
    DateTime,
    Checkbox,
    SelectBox,
    FileInput,
    FileUpload,
    RichText,
    Repeater,
}

impl FieldType {
    /// Every field type, in declaration order.
    pub const ALL: [FieldType; 14] = [
        Self::Text,
        Self::Email,
        Self::Tel,
        Self::Number,
        Self::Password,
        Self::TextArea,
        Self::Date,
        Self::DateTime,
        Self::Checkbox,
        Self::SelectBox,
        Self::FileInput,
        Self::FileUpload,
        Self::RichText,
        Self::Repeater,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Number => "number",
            Self::Password => "password",
            Self::TextArea => "text_area",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Checkbox => "checkbox",
            Self::SelectBox => "selectbox",
            Self::FileInput => "file_input",
            Self::FileUpload => "file_upload",
            Self::RichText => "richtext",
            Self::Repeater => "repeater",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options of a numeric field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Values must be `min + k * step` (or `k * step` without a minimum).
    pub step: Option<f64>,
    pub default: Option<f64>,
}

impl NumberOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }
}

/// Options of a multi-line text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAreaOptions {
    pub rows: u16,
}

impl Default for TextAreaOptions {
    fn default() -> Self {
        Self { rows: 4 }
    }
}

/// Options of a checkbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckboxOptions {
    pub default: Option<bool>,
}

/// Options of file inputs and uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    pub multiple: bool,
    /// Accepted MIME types or extensions, e.g. `".pdf"`.
    pub accept: Vec<String>,
}

impl FileOptions {
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn accept(mut self, kind: impl Into<String>) -> Self {
        self.accept.push(kind.into());
        self
    }
}

/// Configuration of a repeater: a list of sub-forms sharing one field set.
#[derive(Clone)]
pub struct RepeaterConfig {
    /// Fields of each item.
    pub sub_fields: Vec<FieldConfig>,

    /// Declared item bounds; available to custom validators and renderers.
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,

    /// Builds the record appended by "add".
    pub default_item: DefaultItemFn,

    /// Text of the add button.
    pub add_label: String,
}

impl RepeaterConfig {
    /// Create a repeater whose new items start empty.
    pub fn new(sub_fields: Vec<FieldConfig>) -> Self {
        Self {
            sub_fields,
            min_items: None,
            max_items: None,
            default_item: Arc::new(FormData::new),
            add_label: "Aggiungi".to_string(),
        }
    }

    /// Set the item factory.
    pub fn with_default_item<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> FormData + Send + Sync + 'static,
    {
        self.default_item = Arc::new(factory);
        self
    }

    /// Declare item count bounds.
    pub fn with_item_bounds(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }

    /// Set the add button text.
    pub fn with_add_label(mut self, label: impl Into<String>) -> Self {
        self.add_label = label.into();
        self
    }
}

impl fmt::Debug for RepeaterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeaterConfig")
            .field("sub_fields", &self.sub_fields)
            .field("min_items", &self.min_items)
            .field("max_items", &self.max_items)
            .field("add_label", &self.add_label)
            .finish_non_exhaustive()
    }
}

/// Column spans on a 12-column grid per breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub xs: u8,
    pub md: u8,
    pub lg: u8,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            xs: 12,
            md: 12,
            lg: 12,
        }
    }
}

impl GridLayout {
    /// Same span on medium and large screens, full width on small ones.
    pub fn span(columns: u8) -> Self {
        let columns = columns.clamp(1, 12);
        Self {
            xs: 12,
            md: columns,
            lg: columns,
        }
    }
}

/// Convert snake_case to Title Case.
fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
