use form_engine::{
    BoolOp, FieldConfig, FieldValue, FormData, FormDefinition, FormRecord, GridLayout,
    SelectBoxConfig, SelectElement, SelectOption, ValidationFeedback,
};

/// Italian fiscal codes are 16 alphanumeric characters.
pub const FISCAL_CODE_LENGTH: usize = 16;

pub fn validate_fiscal_code(value: &FieldValue, _: &FormData) -> ValidationFeedback {
    let Some(code) = value.as_str() else {
        return ValidationFeedback::valid();
    };
    let well_formed =
        code.len() == FISCAL_CODE_LENGTH && code.chars().all(|c| c.is_ascii_alphanumeric());
    if well_formed {
        ValidationFeedback::valid()
    } else {
        ValidationFeedback::invalid("Il codice fiscale deve avere 16 caratteri alfanumerici.")
    }
}

pub fn is_business(data: &FormData) -> bool {
    data.get_str("customer_type") == Some("business")
}

/// A new customer of the advisory desk.
#[derive(Debug, Clone, PartialEq, FormRecord)]
pub struct CustomerRegistration {
    pub customer_type: String,
    pub company_name: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub fiscal_code: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: String,
    pub password: String,
    pub confirm_password: String,
    pub privacy: bool,
    pub newsletter: bool,
}

/// The registration form. Field names come from [`CustomerRegistrationField`].
pub fn customer_registration() -> FormDefinition {
    use CustomerRegistrationField as F;

    FormDefinition::new(vec![
        FieldConfig::select(
            F::CustomerType,
            SelectBoxConfig::fixed(vec![
                SelectOption::new("private", "Privato"),
                SelectOption::new("business", "Azienda"),
            ])
            .element(SelectElement::DualSwitch)
            .with_default("private"),
        )
        .label("Tipo cliente"),
        FieldConfig::text(F::CompanyName)
            .label("Ragione sociale")
            .required()
            .visible_when(is_business),
        FieldConfig::text(F::FirstName)
            .label("Nome")
            .required()
            .grid(GridLayout::span(6)),
        FieldConfig::text(F::LastName)
            .label("Cognome")
            .required()
            .grid(GridLayout::span(6)),
        FieldConfig::text(F::FiscalCode)
            .label("Codice fiscale")
            .required()
            .validate_with(BoolOp::And, validate_fiscal_code),
        FieldConfig::email(F::Email)
            .label("Email")
            .required()
            .grid(GridLayout::span(6)),
        FieldConfig::tel(F::Phone)
            .label("Telefono")
            .grid(GridLayout::span(6)),
        FieldConfig::date(F::BirthDate).label("Data di nascita").required(),
        FieldConfig::password(F::Password)
            .label("Password")
            .required()
            .grid(GridLayout::span(6)),
        FieldConfig::password(F::ConfirmPassword)
            .label("Conferma password")
            .required()
            .equal_to(F::Password)
            .grid(GridLayout::span(6)),
        FieldConfig::checkbox(F::Privacy)
            .label("Accetto l'informativa privacy")
            .required(),
        FieldConfig::checkbox(F::Newsletter).label("Newsletter"),
    ])
    .with_title("Registrazione cliente")
    .with_submit_label("Registra")
}
