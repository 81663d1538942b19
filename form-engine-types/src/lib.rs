//! Core types for the form-engine crate.
//!
//! This crate provides the foundational types for declaring forms:
//! - `FormDefinition` - The top-level form structure
//! - `FieldConfig` and `FieldKind` - Individual fields and their per-type options
//! - `FormData`, `FieldValue` and `FieldPath` - Form contents and path-based keys
//! - `ValidationFeedback`, `FeedbackMap` and `BoolOp` - Validation verdicts
//! - `FormRecord` and `DataSource` traits - For typed records and data collaborators

mod field_path;
pub use field_path::FieldPath;

mod field_value;
pub use field_value::FieldValue;

mod convert;
pub use convert::{FromFieldValue, IntoFieldValue};

mod form_data;
pub use form_data::FormData;

mod select;
pub use select::{OptionSource, OptionsFn, SelectBoxConfig, SelectElement, SelectOption, UNSET};

mod field_config;
pub use field_config::{
    CheckboxOptions, DefaultItemFn, FieldConfig, FieldKind, FieldType, FileOptions, GridLayout,
    NumberOptions, RepeaterConfig, TextAreaOptions, ValidatorFn, VisibilityFn,
};

mod bool_op;
pub use bool_op::BoolOp;

mod feedback;
pub use feedback::{FeedbackMap, ValidationFeedback};

mod form_definition;
pub use form_definition::FormDefinition;

mod envelope;
pub use envelope::{ApiResponse, DataResponse};

mod error;
pub use error::{DefinitionError, FieldValueError, FormError};

mod traits;
pub use traits::{DataSource, FormRecord};
