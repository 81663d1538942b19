//! HTML form generator implementation.

use form_engine::{Control, FieldValue, FieldView, FormView, GridLayout, SelectOption};

/// Options for HTML generation.
#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Title for the HTML document.
    pub title: Option<String>,
    /// Whether to include default CSS styling.
    pub include_styles: bool,
    /// Whether to generate a complete HTML document (with html/head/body tags).
    pub full_document: bool,
    /// Custom CSS class prefix for all generated elements.
    pub class_prefix: String,
}

impl HtmlOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self {
            title: None,
            include_styles: true,
            full_document: true,
            class_prefix: "form".to_string(),
        }
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Enable or disable default CSS styling.
    pub fn with_styles(mut self, include: bool) -> Self {
        self.include_styles = include;
        self
    }

    /// Generate a complete HTML document or just the form fragment.
    pub fn full_document(mut self, full: bool) -> Self {
        self.full_document = full;
        self
    }

    /// Set a custom CSS class prefix.
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }
}

/// Render a form view as HTML.
///
/// The document title falls back to the form's own title.
pub fn to_html(view: &FormView, options: &HtmlOptions) -> String {
    let mut html = String::new();
    let prefix = &options.class_prefix;
    let title = options.title.as_ref().or(view.title.as_ref());

    if options.full_document {
        html.push_str("<!DOCTYPE html>\n<html lang=\"it\">\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );

        if let Some(title) = title {
            html.push_str(&format!("  <title>{}</title>\n", escape_html(title)));
        }

        if options.include_styles {
            html.push_str(&generate_styles(prefix));
        }

        html.push_str("</head>\n<body>\n");
    }

    let modified = if view.is_modified {
        " data-modified=\"true\""
    } else {
        ""
    };
    html.push_str(&format!("<form class=\"{prefix}-form\" novalidate{modified}>\n"));

    if let Some(title) = title {
        html.push_str(&format!(
            "  <h1 class=\"{prefix}-title\">{}</h1>\n",
            escape_html(title)
        ));
    }

    html.push_str(&format!("  <div class=\"{prefix}-fields row\">\n"));
    for field in &view.fields {
        html.push_str(&generate_field(field, prefix, 2));
    }
    html.push_str("  </div>\n");

    let disabled = if view.submit.disabled { " disabled" } else { "" };
    html.push_str(&format!(
        "  <button type=\"submit\" class=\"{prefix}-submit\"{disabled}>{}</button>\n",
        escape_html(&view.submit.label)
    ));

    html.push_str("</form>\n");

    if options.full_document {
        html.push_str("</body>\n</html>\n");
    }

    html
}

/// Generate HTML for a single field, feedback included.
fn generate_field(field: &FieldView, prefix: &str, indent: usize) -> String {
    let ind = "  ".repeat(indent);
    let path = field.path.as_str();
    let field_id = field.path.to_id();
    let label = escape_html(&field.label);
    let required = if field.required { " required" } else { "" };
    let invalid = if field.is_invalid() {
        format!(" {prefix}-is-invalid")
    } else {
        String::new()
    };
    let placeholder = field
        .placeholder
        .as_deref()
        .map(|p| format!(" placeholder=\"{}\"", escape_html(p)))
        .unwrap_or_default();

    let mut html = String::new();
    let grid = grid_classes(field.grid);

    match &field.control {
        Control::Input { input_type } => {
            // Don't pre-fill password fields
            let value_attr = match *input_type {
                "password" => String::new(),
                _ => value_attr(&field.value),
            };

            html.push_str(&format!("{ind}<div class=\"{prefix}-field {grid}\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{field_id}\">{label}</label>\n"));
            html.push_str(&format!(
                "{ind}  <input type=\"{input_type}\" id=\"{field_id}\" name=\"{path}\" class=\"{prefix}-input{invalid}\"{value_attr}{placeholder}{required}>\n"
            ));
        }

        Control::Number { min, max, step } => {
            let mut attrs = format!(
                "type=\"number\" id=\"{field_id}\" name=\"{path}\" class=\"{prefix}-input{invalid}\""
            );
            if let Some(min) = min {
                attrs.push_str(&format!(" min=\"{min}\""));
            }
            if let Some(max) = max {
                attrs.push_str(&format!(" max=\"{max}\""));
            }
            match step {
                Some(step) => attrs.push_str(&format!(" step=\"{step}\"")),
                None => attrs.push_str(" step=\"any\""),
            }

            html.push_str(&format!("{ind}<div class=\"{prefix}-field {grid}\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{field_id}\">{label}</label>\n"));
            html.push_str(&format!(
                "{ind}  <input {attrs}{}{placeholder}{required}>\n",
                value_attr(&field.value)
            ));
        }

        Control::TextArea { rows } => {
            html.push_str(&format!("{ind}<div class=\"{prefix}-field {grid}\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{field_id}\">{label}</label>\n"));
            html.push_str(&format!(
                "{ind}  <textarea id=\"{field_id}\" name=\"{path}\" rows=\"{rows}\" class=\"{prefix}-textarea{invalid}\"{placeholder}{required}>{}</textarea>\n",
                escape_html(&value_text(&field.value))
            ));
        }

        Control::RichText => {
            html.push_str(&format!("{ind}<div class=\"{prefix}-field {grid}\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{field_id}\">{label}</label>\n"));
            html.push_str(&format!(
                "{ind}  <textarea id=\"{field_id}\" name=\"{path}\" rows=\"8\" class=\"{prefix}-textarea {prefix}-rich-text{invalid}\" data-rich-text{required}>{}</textarea>\n",
                escape_html(&value_text(&field.value))
            ));
        }

        Control::Checkbox => {
            let checked = if field.value.is_truthy() { " checked" } else { "" };
            let class = if field.is_invalid() {
                format!(" class=\"{prefix}-is-invalid\"")
            } else {
                String::new()
            };

            html.push_str(&format!(
                "{ind}<div class=\"{prefix}-field {prefix}-checkbox {grid}\">\n"
            ));
            html.push_str(&format!(
                "{ind}  <input type=\"checkbox\" id=\"{field_id}\" name=\"{path}\"{class}{checked}{required}>\n"
            ));
            html.push_str(&format!("{ind}  <label for=\"{field_id}\">{label}</label>\n"));
        }

        Control::Select {
            options,
            multiple,
            search,
            large_data_search,
        } => {
            let mut attrs = format!("id=\"{field_id}\" name=\"{path}\" class=\"{prefix}-select{invalid}\"");
            if *multiple {
                attrs.push_str(" multiple");
            }
            if *search {
                attrs.push_str(" data-search");
            }
            if *large_data_search {
                attrs.push_str(" data-remote-search");
            }

            html.push_str(&format!("{ind}<div class=\"{prefix}-field {grid}\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{field_id}\">{label}</label>\n"));
            html.push_str(&format!("{ind}  <select {attrs}{required}>\n"));
            for option in options {
                let mut option_attrs = value_attr(&option.value);
                if is_selected(option, &field.value) {
                    option_attrs.push_str(" selected");
                }
                if option.hidden {
                    option_attrs.push_str(" hidden");
                }
                if option.disabled {
                    option_attrs.push_str(" disabled");
                }
                html.push_str(&format!(
                    "{ind}    <option{option_attrs}>{}</option>\n",
                    escape_html(&option.text)
                ));
            }
            html.push_str(&format!("{ind}  </select>\n"));
        }

        Control::Cards { options, multiple } => {
            let input_type = if *multiple { "checkbox" } else { "radio" };
            let name = if *multiple {
                format!("{path}[]")
            } else {
                path.to_string()
            };

            html.push_str(&format!(
                "{ind}<fieldset class=\"{prefix}-fieldset {prefix}-cards {grid}{invalid}\">\n"
            ));
            html.push_str(&format!("{ind}  <legend>{label}</legend>\n"));
            for (idx, option) in options.iter().enumerate() {
                if option.hidden || option.is_placeholder() {
                    continue;
                }
                let option_id = format!("{field_id}-{idx}");
                let mut option_attrs = value_attr(&option.value);
                if is_selected(option, &field.value) {
                    option_attrs.push_str(" checked");
                }
                if option.disabled {
                    option_attrs.push_str(" disabled");
                }

                html.push_str(&format!("{ind}  <label class=\"{prefix}-card\" for=\"{option_id}\">\n"));
                html.push_str(&format!(
                    "{ind}    <input type=\"{input_type}\" id=\"{option_id}\" name=\"{name}\"{option_attrs}>\n"
                ));
                html.push_str(&format!(
                    "{ind}    <span class=\"{prefix}-card-text\">{}</span>\n",
                    escape_html(&option.text)
                ));
                if let Some(secondary) = &option.secondary_text {
                    html.push_str(&format!(
                        "{ind}    <span class=\"{prefix}-card-secondary\">{}</span>\n",
                        escape_html(secondary)
                    ));
                }
                html.push_str(&format!("{ind}  </label>\n"));
            }
        }

        Control::DualSwitch { off, on } => {
            let checked = if is_selected(on, &field.value) {
                " checked"
            } else {
                ""
            };

            html.push_str(&format!(
                "{ind}<div class=\"{prefix}-field {prefix}-switch {grid}\">\n"
            ));
            html.push_str(&format!("{ind}  <span class=\"{prefix}-switch-label\">{label}</span>\n"));
            html.push_str(&format!(
                "{ind}  <span class=\"{prefix}-switch-off\">{}</span>\n",
                escape_html(&off.text)
            ));
            html.push_str(&format!(
                "{ind}  <input type=\"checkbox\" role=\"switch\" id=\"{field_id}\" name=\"{path}\" data-off=\"{}\" data-on=\"{}\"{checked}>\n",
                escape_html(&value_text(&off.value)),
                escape_html(&value_text(&on.value))
            ));
            html.push_str(&format!(
                "{ind}  <span class=\"{prefix}-switch-on\">{}</span>\n",
                escape_html(&on.text)
            ));
        }

        Control::File {
            multiple,
            accept,
            upload,
        } => {
            let mut attrs = format!(
                "type=\"file\" id=\"{field_id}\" name=\"{path}\" class=\"{prefix}-file{invalid}\""
            );
            if *multiple {
                attrs.push_str(" multiple");
            }
            if !accept.is_empty() {
                attrs.push_str(&format!(" accept=\"{}\"", escape_html(&accept.join(","))));
            }
            if *upload {
                attrs.push_str(" data-upload");
            }

            html.push_str(&format!("{ind}<div class=\"{prefix}-field {grid}\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{field_id}\">{label}</label>\n"));
            html.push_str(&format!("{ind}  <input {attrs}{required}>\n"));
        }

        Control::Repeater {
            items,
            add_label,
            min_items,
            max_items,
        } => {
            let mut bounds = String::new();
            if let Some(min) = min_items {
                bounds.push_str(&format!(" data-min-items=\"{min}\""));
            }
            if let Some(max) = max_items {
                bounds.push_str(&format!(" data-max-items=\"{max}\""));
            }

            html.push_str(&format!(
                "{ind}<fieldset class=\"{prefix}-fieldset {prefix}-repeater {grid}{invalid}\" id=\"{field_id}\"{bounds}>\n"
            ));
            html.push_str(&format!("{ind}  <legend>{label}</legend>\n"));

            for (idx, item) in items.iter().enumerate() {
                html.push_str(&format!(
                    "{ind}  <div class=\"{prefix}-repeater-item row\" data-index=\"{idx}\">\n"
                ));
                for nested in item {
                    html.push_str(&generate_field(nested, prefix, indent + 2));
                }
                html.push_str(&format!(
                    "{ind}    <button type=\"button\" class=\"{prefix}-remove\" data-repeater=\"{path}\" data-index=\"{idx}\">Rimuovi</button>\n"
                ));
                html.push_str(&format!("{ind}  </div>\n"));
            }

            html.push_str(&format!(
                "{ind}  <button type=\"button\" class=\"{prefix}-add\" data-repeater=\"{path}\">{}</button>\n",
                escape_html(add_label)
            ));
            html.push_str(&generate_feedback(field, prefix, &ind));
            html.push_str(&format!("{ind}</fieldset>\n"));
            return html;
        }
    }

    html.push_str(&generate_feedback(field, prefix, &ind));
    match &field.control {
        Control::Cards { .. } => html.push_str(&format!("{ind}</fieldset>\n")),
        _ => html.push_str(&format!("{ind}</div>\n")),
    }

    html
}

/// Generate the feedback line of a field, if it has one.
fn generate_feedback(field: &FieldView, prefix: &str, ind: &str) -> String {
    let Some(feedback) = &field.feedback else {
        return String::new();
    };
    let Some(text) = feedback.text() else {
        return String::new();
    };

    let kind = if feedback.is_valid { "valid" } else { "invalid" };
    format!(
        "{ind}  <div class=\"{prefix}-feedback {prefix}-{kind}-feedback\">{}</div>\n",
        escape_html(text)
    )
}

/// Bootstrap-style column classes.
fn grid_classes(grid: GridLayout) -> String {
    format!("col-{} col-md-{} col-lg-{}", grid.xs, grid.md, grid.lg)
}

fn is_selected(option: &SelectOption, value: &FieldValue) -> bool {
    match value {
        FieldValue::List(items) => items.contains(&option.value),
        value => *value == option.value,
    }
}

fn value_attr(value: &FieldValue) -> String {
    match value {
        FieldValue::Null | FieldValue::List(_) | FieldValue::Record(_) => String::new(),
        value => format!(" value=\"{}\"", escape_html(&value_text(value))),
    }
}

/// The text form of a scalar value; integral numbers lose their fraction.
fn value_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Null | FieldValue::List(_) | FieldValue::Record(_) => String::new(),
    }
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Generate default CSS styles.
fn generate_styles(prefix: &str) -> String {
    format!(
        r#"  <style>
    .{prefix}-form {{
      max-width: 960px;
      margin: 2rem auto;
      padding: 1rem;
      font-family: sans-serif;
    }}
    .row {{
      display: flex;
      flex-wrap: wrap;
      gap: 0 1rem;
    }}
    .col-12 {{ flex: 0 0 100%; }}
    @media (min-width: 768px) {{
      .col-md-6 {{ flex: 0 0 calc(50% - 1rem); }}
      .col-md-4 {{ flex: 0 0 calc(33.333% - 1rem); }}
      .col-md-3 {{ flex: 0 0 calc(25% - 1rem); }}
    }}
    .{prefix}-field {{
      margin: 0.5rem 0;
    }}
    .{prefix}-field label {{
      display: block;
      margin-bottom: 0.25rem;
    }}
    .{prefix}-input, .{prefix}-textarea, .{prefix}-select {{
      width: 100%;
      padding: 0.5rem;
      box-sizing: border-box;
    }}
    .{prefix}-is-invalid {{
      border-color: #dc3545;
    }}
    .{prefix}-feedback {{
      font-size: 0.875rem;
      margin-top: 0.25rem;
    }}
    .{prefix}-invalid-feedback {{
      color: #dc3545;
    }}
    .{prefix}-valid-feedback {{
      color: #198754;
    }}
    .{prefix}-checkbox, .{prefix}-switch {{
      display: flex;
      align-items: center;
      gap: 0.5rem;
    }}
    .{prefix}-checkbox label {{
      display: inline;
    }}
    .{prefix}-fieldset {{
      margin: 1rem 0;
      padding: 1rem;
    }}
    .{prefix}-card {{
      display: inline-flex;
      flex-direction: column;
      margin: 0.25rem;
      padding: 0.75rem;
      border: 1px solid #ccc;
      border-radius: 0.25rem;
    }}
    .{prefix}-card-secondary {{
      font-size: 0.8rem;
      color: #666;
    }}
    .{prefix}-repeater-item {{
      margin-left: 1.5rem;
      padding-left: 0.5rem;
      border-left: 2px solid #ccc;
    }}
    .{prefix}-submit {{
      margin-top: 1rem;
      padding: 0.5rem 1rem;
    }}
  </style>
"#
    )
}
