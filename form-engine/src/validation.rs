//! Per-field validation.
//!
//! Every field gets a standard verdict from its kind, an equality check when
//! it must match another field, and optionally a custom verdict merged in
//! through its `BoolOp`.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    BoolOp, FeedbackMap, FieldConfig, FieldKind, FieldValue, FormData, NumberOptions,
    RepeaterConfig, SelectBoxConfig, UNSET, ValidationFeedback,
};

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Tolerance when checking that a number sits on its step grid.
const STEP_EPSILON: f64 = 1e-8;

const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 8..=20;

/// Compute the feedback of `field` holding `value`, given the whole form.
pub fn compute_validation(
    field: &FieldConfig,
    value: &FieldValue,
    data: &FormData,
) -> ValidationFeedback {
    if !field.is_visible(data) {
        return ValidationFeedback::valid();
    }

    let mut standard = standard_feedback(field, value);

    if standard.is_valid
        && let Some(other) = field.equal_to_field()
        && value != data.value(other)
    {
        standard = ValidationFeedback::invalid(format!(
            "{} non corrisponde a {}",
            field.label_text(),
            other
        ));
    }

    match field.validator() {
        Some(validator) => merge_feedback(&standard, &validator(value, data), field.bool_op()),
        None => standard,
    }
}

/// Feedback for every top-level field of `fields` against `data`.
pub fn compute_all(fields: &[FieldConfig], data: &FormData) -> FeedbackMap {
    fields
        .iter()
        .map(|field| {
            let feedback = compute_validation(field, data.value(field.name()), data);
            (field.name().to_string(), feedback)
        })
        .collect()
}

/// Feedback for the sub-fields of one repeater item.
pub fn item_feedback(config: &RepeaterConfig, item: &FormData) -> FeedbackMap {
    compute_all(&config.sub_fields, item)
}

/// Combine the standard verdict (`A`) with a custom one (`B`).
///
/// A valid result carries no text. An invalid one picks the text that
/// explains the failure best for the operator at hand.
pub fn merge_feedback(
    standard: &ValidationFeedback,
    custom: &ValidationFeedback,
    op: BoolOp,
) -> ValidationFeedback {
    if op.apply(standard.is_valid, custom.is_valid) {
        return ValidationFeedback::valid();
    }

    let text = match op {
        BoolOp::And if standard.is_valid && !custom.is_valid => {
            custom.text().or(standard.text()).map(str::to_string)
        }
        BoolOp::And => standard.text().map(str::to_string),
        BoolOp::Or => match (standard.text(), custom.text()) {
            (Some(a), Some(b)) => Some(format!("{a}; {b}")),
            (a, b) => a.or(b).map(str::to_string),
        },
        BoolOp::Implies if custom.is_valid => standard.text().map(str::to_string),
        BoolOp::Implies => custom.text().or(standard.text()).map(str::to_string),
        BoolOp::Xor => standard.text().or(custom.text()).map(str::to_string),
        _ => custom.text().or(standard.text()).map(str::to_string),
    };

    ValidationFeedback {
        is_valid: false,
        feedback_text: text,
    }
}

/// The message shown for a verdict when no more specific one applies.
///
/// Valid optional fields get no text at all.
pub fn default_validation_feedback(
    field: &FieldConfig,
    is_valid: bool,
    custom_text: Option<&str>,
) -> ValidationFeedback {
    if is_valid && !field.is_required() {
        return ValidationFeedback::valid();
    }

    let label = field.label_text();
    let text = match (custom_text, field.kind(), is_valid) {
        (Some(text), _, _) => text.to_string(),
        (None, FieldKind::Email, false) => format!("{label} non è un'email valida."),
        (None, FieldKind::Email | FieldKind::Password, true) => format!("{label} è valida."),
        (None, FieldKind::Password, false) => "Richiesti 8-20 caratteri.".to_string(),
        (None, FieldKind::SelectBox(_), false) => format!("{label} richiede selezione."),
        (None, _, false) => format!("{label} è obbligatorio."),
        (None, _, true) => format!("{label} è valido."),
    };

    ValidationFeedback::verdict(is_valid).with_text(text)
}

fn standard_feedback(field: &FieldConfig, value: &FieldValue) -> ValidationFeedback {
    let required = field.is_required();
    let verdict = |is_valid| default_validation_feedback(field, is_valid, None);

    match field.kind() {
        FieldKind::Text | FieldKind::TextArea(_) => verdict(!required || !is_blank_text(value)),
        FieldKind::Email => {
            if is_blank_text(value) {
                verdict(!required)
            } else {
                verdict(value.as_str().is_some_and(is_email))
            }
        }
        FieldKind::Password => {
            if is_blank_text(value) {
                verdict(!required)
            } else {
                let length = value.as_str().map_or(0, |text| text.chars().count());
                verdict(PASSWORD_LENGTH.contains(&length))
            }
        }
        FieldKind::Number(options) => number_feedback(field, options, value),
        FieldKind::SelectBox(config) => verdict(!required || has_selection(config, value)),
        FieldKind::Checkbox(_) => verdict(!required || value.is_truthy()),
        FieldKind::FileUpload(_) => {
            verdict(!required || value.as_list().is_some_and(|files| !files.is_empty()))
        }
        FieldKind::RichText => ValidationFeedback::valid(),
        FieldKind::Repeater(config) => {
            if required && !value.is_truthy() {
                verdict(false)
            } else if items_valid(config, value) {
                verdict(true)
            } else {
                ValidationFeedback::invalid(format!(
                    "{} contiene elementi non validi.",
                    field.label_text()
                ))
            }
        }
        FieldKind::Tel | FieldKind::Date | FieldKind::DateTime | FieldKind::FileInput(_) => {
            verdict(!required || value.is_truthy())
        }
    }
}

fn number_feedback(
    field: &FieldConfig,
    options: &NumberOptions,
    value: &FieldValue,
) -> ValidationFeedback {
    if is_blank_text(value) {
        return default_validation_feedback(field, !field.is_required(), None);
    }

    let Some(number) = value.as_number().filter(|n| n.is_finite()) else {
        return ValidationFeedback::invalid(format!(
            "{} deve essere un numero.",
            field.label_text()
        ));
    };

    if let Some(min) = options.min
        && number < min
    {
        return ValidationFeedback::invalid(format!("Minimo {min}"));
    }

    if let Some(max) = options.max
        && number > max
    {
        return ValidationFeedback::invalid(format!("Massimo {max}"));
    }

    if let Some(step) = options.step.filter(|step| *step > 0.0) {
        let base = options.min.unwrap_or(0.0);
        let steps = (number - base) / step;
        if (steps - steps.round()).abs() > STEP_EPSILON {
            return ValidationFeedback::invalid(format!(
                "Il valore deve essere un multiplo di {step} a partire da {base}."
            ));
        }
    }

    default_validation_feedback(field, true, None)
}

fn has_selection(config: &SelectBoxConfig, value: &FieldValue) -> bool {
    if config.multiple {
        value.as_list().is_some_and(|items| !items.is_empty())
    } else {
        value.is_truthy() && value.as_str() != Some(UNSET)
    }
}

fn items_valid(config: &RepeaterConfig, value: &FieldValue) -> bool {
    let Some(items) = value.as_list() else {
        return true;
    };
    items.iter().all(|item| match item.as_record() {
        Some(record) => item_feedback(config, record).is_all_valid(),
        None => false,
    })
}

fn is_email(text: &str) -> bool {
    EMAIL.as_ref().is_some_and(|pattern| pattern.is_match(text.trim()))
}

/// Blank, or text consisting only of whitespace.
fn is_blank_text(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(text) => text.trim().is_empty(),
        other => other.is_blank(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileOptions, SelectOption};
    use pretty_assertions::assert_eq;

    fn check(field: &FieldConfig, value: impl Into<FieldValue>) -> ValidationFeedback {
        let value = value.into();
        let data = FormData::new().with(field.name(), value.clone());
        compute_validation(field, &value, &data)
    }

    #[test]
    fn required_fields_reject_empty_values() {
        let cases = [
            FieldConfig::text("name").required(),
            FieldConfig::email("email").required(),
            FieldConfig::password("password").required(),
            FieldConfig::number("amount", NumberOptions::new()).required(),
            FieldConfig::tel("phone").required(),
            FieldConfig::date("birth_date").required(),
            FieldConfig::checkbox("privacy").required(),
            FieldConfig::select(
                "risk",
                SelectBoxConfig::fixed(vec![SelectOption::new("low", "Basso")]),
            )
            .required(),
            FieldConfig::file_upload("documents", FileOptions::default()).required(),
        ];

        for field in &cases {
            assert!(!check(field, FieldValue::Null).is_valid, "{}", field.name());
            assert!(!check(field, "").is_valid, "{}", field.name());
        }
    }

    #[test]
    fn optional_fields_accept_empty_values_without_text() {
        let field = FieldConfig::email("email");
        assert_eq!(check(&field, ""), ValidationFeedback::valid());

        let field = FieldConfig::number("amount", NumberOptions::with_bounds(Some(10.0), None));
        assert_eq!(check(&field, FieldValue::Null), ValidationFeedback::valid());
    }

    #[test]
    fn whitespace_only_text_is_empty() {
        let field = FieldConfig::text("name").label("Nome").required();
        let feedback = check(&field, "   ");
        assert_eq!(feedback, ValidationFeedback::invalid("Nome è obbligatorio."));
        assert_eq!(check(&field, "Mario").text(), Some("Nome è valido."));
    }

    #[test]
    fn unset_sentinel_counts_as_no_selection() {
        let field = FieldConfig::select(
            "risk",
            SelectBoxConfig::fixed(vec![SelectOption::new("low", "Basso")]),
        )
        .label("Rischio")
        .required();

        assert_eq!(
            check(&field, UNSET),
            ValidationFeedback::invalid("Rischio richiede selezione.")
        );
        assert!(check(&field, "low").is_valid);
    }

    #[test]
    fn multiple_select_requires_a_non_empty_list() {
        let field = FieldConfig::select(
            "goals",
            SelectBoxConfig::fixed(vec![SelectOption::new("growth", "Crescita")]).multiple(),
        )
        .required();

        assert!(!check(&field, Vec::<FieldValue>::new()).is_valid);
        assert!(check(&field, vec![FieldValue::from("growth")]).is_valid);
    }

    #[test]
    fn email_and_password_formats() {
        let email = FieldConfig::email("email").label("Email");
        assert_eq!(
            check(&email, "mario.rossi"),
            ValidationFeedback::invalid("Email non è un'email valida.")
        );
        assert!(check(&email, "mario@example.com").is_valid);

        let password = FieldConfig::password("password");
        assert_eq!(
            check(&password, "short"),
            ValidationFeedback::invalid("Richiesti 8-20 caratteri.")
        );
        assert!(check(&password, "abbastanza").is_valid);
        assert!(!check(&password, "x".repeat(21)).is_valid);
    }

    #[test]
    fn number_bounds_and_step() {
        let field = FieldConfig::number(
            "amount",
            NumberOptions::with_bounds(Some(0.0), Some(100.0)).with_step(5.0),
        );

        for valid in [0.0, 5.0, 10.0] {
            assert!(check(&field, valid).is_valid, "{valid} should be valid");
        }
        for invalid in [3.0, 7.0, -5.0] {
            assert!(!check(&field, invalid).is_valid, "{invalid} should be invalid");
        }
        assert!(check(&field, "15").is_valid);
        assert_eq!(check(&field, -5.0), ValidationFeedback::invalid("Minimo 0"));
        assert_eq!(check(&field, 105.0), ValidationFeedback::invalid("Massimo 100"));

        let feedback = check(&field, 7.0);
        assert!(!feedback.is_valid);
        assert!(feedback.text().is_some_and(|text| text.contains('5')));

        assert!(!check(&field, "abc").is_valid);
    }

    #[test]
    fn step_is_measured_from_the_minimum() {
        let field = FieldConfig::number(
            "quantity",
            NumberOptions::with_bounds(Some(1.0), None).with_step(0.5),
        );
        assert!(check(&field, 2.5).is_valid);
        assert!(!check(&field, 2.25).is_valid);
        assert!(check(&field, 1.0 + 0.1 * 5.0).is_valid);
    }

    #[test]
    fn equal_to_compares_with_the_other_field() {
        let field = FieldConfig::password("repassword")
            .label("Conferma password")
            .equal_to("password");
        let data = FormData::new()
            .with("password", "segreta123")
            .with("repassword", "segreta124");

        let feedback = compute_validation(&field, data.value("repassword"), &data);
        assert_eq!(
            feedback,
            ValidationFeedback::invalid("Conferma password non corrisponde a password")
        );

        let data = data.with("repassword", "segreta123");
        assert!(compute_validation(&field, data.value("repassword"), &data).is_valid);
    }

    #[test]
    fn invisible_fields_are_valid() {
        let field = FieldConfig::text("company")
            .required()
            .visible_when(|data| data.get_bool("is_company") == Some(true));
        let data = FormData::new().with("is_company", false);
        assert_eq!(
            compute_validation(&field, &FieldValue::Null, &data),
            ValidationFeedback::valid()
        );
    }

    #[test]
    fn custom_validator_is_merged() {
        let field = FieldConfig::text("code").required().validate_with(BoolOp::And, |value, _| {
            if value.as_str().is_some_and(|code| code.starts_with("IT")) {
                ValidationFeedback::valid()
            } else {
                ValidationFeedback::invalid("Il codice deve iniziare con IT")
            }
        });

        assert_eq!(
            check(&field, "FR123"),
            ValidationFeedback::invalid("Il codice deve iniziare con IT")
        );
        assert_eq!(check(&field, "IT123"), ValidationFeedback::valid());
        assert_eq!(check(&field, ""), ValidationFeedback::invalid("Code è obbligatorio."));
    }

    #[test]
    fn merge_follows_the_truth_table_of_every_operator() {
        // (standard, custom) in the order FF, FT, TF, TT
        let expected = [
            (BoolOp::False, [false, false, false, false]),
            (BoolOp::True, [true, true, true, true]),
            (BoolOp::A, [false, false, true, true]),
            (BoolOp::B, [false, true, false, true]),
            (BoolOp::NotA, [true, true, false, false]),
            (BoolOp::NotB, [true, false, true, false]),
            (BoolOp::And, [false, false, false, true]),
            (BoolOp::Or, [false, true, true, true]),
            (BoolOp::Xor, [false, true, true, false]),
            (BoolOp::Nand, [true, true, true, false]),
            (BoolOp::Nor, [true, false, false, false]),
            (BoolOp::Xnor, [true, false, false, true]),
            (BoolOp::Implies, [true, true, false, true]),
            (BoolOp::ReverseImplies, [true, false, true, true]),
            (BoolOp::NotAAndB, [false, true, false, false]),
            (BoolOp::AAndNotB, [false, false, true, false]),
        ];
        let inputs = [(false, false), (false, true), (true, false), (true, true)];

        for (op, table) in expected {
            for ((a, b), is_valid) in inputs.into_iter().zip(table) {
                let standard = ValidationFeedback::verdict(a).with_text("standard");
                let custom = ValidationFeedback::verdict(b).with_text("custom");
                let merged = merge_feedback(&standard, &custom, op);

                assert_eq!(merged.is_valid, is_valid, "{op:?} ({a}, {b})");
                if merged.is_valid {
                    assert_eq!(merged.feedback_text, None);
                } else {
                    assert!(merged.text().is_some(), "{op:?} ({a}, {b}) lost its text");
                }
            }
        }
    }

    #[test]
    fn merge_text_selection() {
        let ok = ValidationFeedback::valid().with_text("ok");
        let std_err = ValidationFeedback::invalid("standard");
        let custom_err = ValidationFeedback::invalid("custom");

        assert_eq!(
            merge_feedback(&std_err, &custom_err, BoolOp::And).text(),
            Some("standard")
        );
        assert_eq!(merge_feedback(&ok, &custom_err, BoolOp::And).text(), Some("custom"));
        assert_eq!(
            merge_feedback(&std_err, &custom_err, BoolOp::Or).text(),
            Some("standard; custom")
        );
        assert_eq!(
            merge_feedback(&ok, &custom_err, BoolOp::Implies).text(),
            Some("custom")
        );
        assert_eq!(
            merge_feedback(&std_err, &custom_err, BoolOp::Xor).text(),
            Some("standard")
        );
        assert_eq!(merge_feedback(&ok, &ok, BoolOp::Nand).text(), Some("ok"));
    }

    #[test]
    fn repeater_items_are_validated_against_sub_fields() {
        let field = FieldConfig::repeater(
            "holdings",
            RepeaterConfig::new(vec![FieldConfig::text("isin").required()]),
        )
        .label("Titoli");

        let good = FieldValue::List(vec![FormData::new().with("isin", "IT0001").into()]);
        let bad = FieldValue::List(vec![
            FormData::new().with("isin", "IT0001").into(),
            FormData::new().with("isin", "").into(),
        ]);

        assert!(check(&field, good).is_valid);
        assert_eq!(
            check(&field, bad),
            ValidationFeedback::invalid("Titoli contiene elementi non validi.")
        );
    }

    #[test]
    fn default_feedback_texts() {
        let select = FieldConfig::select("risk", SelectBoxConfig::fixed(Vec::new()))
            .label("Rischio")
            .required();
        assert_eq!(
            default_validation_feedback(&select, false, None).text(),
            Some("Rischio richiede selezione.")
        );
        assert_eq!(
            default_validation_feedback(&select, false, Some("Scegli un profilo")).text(),
            Some("Scegli un profilo")
        );

        let optional = FieldConfig::text("notes");
        assert_eq!(default_validation_feedback(&optional, true, None).text(), None);
        assert_eq!(
            default_validation_feedback(&optional, false, None).text(),
            Some("Notes è obbligatorio.")
        );
    }
}
