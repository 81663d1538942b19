use form_engine::{
    BoolOp, CheckboxOptions, FieldConfig, FieldKind, FieldValue, FormData, FormDefinition,
    FormRecord, NumberOptions, SelectBoxConfig, SelectElement, SelectOption, TextAreaOptions,
    ValidationFeedback,
};

/// Customers without experience cannot declare the highest risk levels.
pub const MAX_RISK_WITHOUT_EXPERIENCE: f64 = 4.0;

pub fn validate_risk_level(value: &FieldValue, data: &FormData) -> ValidationFeedback {
    let Some(level) = value.as_number() else {
        return ValidationFeedback::valid();
    };
    if data.get_str("experience") == Some("none") && level > MAX_RISK_WITHOUT_EXPERIENCE {
        return ValidationFeedback::invalid(format!(
            "Senza esperienza il livello massimo è {MAX_RISK_WITHOUT_EXPERIENCE}."
        ));
    }
    ValidationFeedback::valid()
}

pub fn wants_esg(data: &FormData) -> bool {
    data.get_bool("esg") == Some(true)
}

/// The MiFID questionnaire of a customer. One per customer: filled in the
/// first time, edited afterwards.
#[derive(Debug, Clone, PartialEq, FormRecord)]
pub struct AdvisoryProfile {
    pub customer_id: i64,
    pub experience: String,
    pub horizon: String,
    pub risk_level: u8,
    pub esg: bool,
    pub esg_preferences: Vec<String>,
    pub notes: Option<String>,
}

pub fn advisory_profile() -> FormDefinition {
    use AdvisoryProfileField as F;

    FormDefinition::new(vec![
        FieldConfig::select(
            F::Experience,
            SelectBoxConfig::fixed(vec![
                SelectOption::new("none", "Nessuna"),
                SelectOption::new("basic", "Base"),
                SelectOption::new("advanced", "Avanzata"),
            ])
            .with_default("none"),
        )
        .label("Esperienza finanziaria")
        .required(),
        FieldConfig::select(
            F::Horizon,
            SelectBoxConfig::fixed(vec![
                SelectOption::new("short", "Breve").with_secondary_text("Fino a 3 anni"),
                SelectOption::new("medium", "Medio").with_secondary_text("3-7 anni"),
                SelectOption::new("long", "Lungo").with_secondary_text("Oltre 7 anni"),
            ])
            .element(SelectElement::Cards),
        )
        .label("Orizzonte temporale")
        .required(),
        FieldConfig::number(
            F::RiskLevel,
            NumberOptions::with_bounds(Some(1.0), Some(7.0)).with_step(1.0),
        )
        .label("Livello di rischio")
        .required()
        .validate_with(BoolOp::And, validate_risk_level),
        FieldConfig::new(
            F::Esg,
            FieldKind::Checkbox(CheckboxOptions {
                default: Some(false),
            }),
        )
        .label("Preferenze di sostenibilità"),
        FieldConfig::select(
            F::EsgPreferences,
            SelectBoxConfig::fixed(vec![
                SelectOption::new("environment", "Ambiente"),
                SelectOption::new("social", "Sociale"),
                SelectOption::new("governance", "Governance"),
            ])
            .multiple()
            .element(SelectElement::Custom),
        )
        .label("Ambiti ESG")
        .required()
        .visible_when(wants_esg),
        FieldConfig::new(F::Notes, FieldKind::TextArea(TextAreaOptions { rows: 6 }))
            .label("Note del consulente"),
    ])
    .with_title("Profilo di consulenza")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_consistent() {
        advisory_profile().check().unwrap();
    }

    #[test]
    fn risk_is_capped_without_experience() {
        let novice = FormData::new().with("experience", "none");
        let expert = FormData::new().with("experience", "advanced");

        assert!(!validate_risk_level(&6.into(), &novice).is_valid);
        assert!(validate_risk_level(&4.into(), &novice).is_valid);
        assert!(validate_risk_level(&6.into(), &expert).is_valid);
    }
}
