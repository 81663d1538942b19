pub mod advisory_profile;
pub mod customer_registration;
pub mod portfolio;

// Re-export advisory_profile types
pub use advisory_profile::{
    AdvisoryProfile, AdvisoryProfileField, MAX_RISK_WITHOUT_EXPERIENCE, advisory_profile,
    validate_risk_level, wants_esg,
};

// Re-export customer_registration types
pub use customer_registration::{
    CustomerRegistration, CustomerRegistrationField, FISCAL_CODE_LENGTH, customer_registration,
    is_business, validate_fiscal_code,
};

// Re-export portfolio types
pub use portfolio::{
    Holding, HoldingField, MAX_HOLDINGS, Portfolio, PortfolioField, instruments_for, portfolio,
    validate_holdings,
};
