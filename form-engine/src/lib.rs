//! # form-engine
//!
//! Declarative forms for advisory back-office pages: field configuration,
//! validation, dirty tracking and create/update/upsert submission flows.
//! Presentation-agnostic; renderers consume a [`FormView`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use form_engine::{FieldConfig, FormDefinition, FormMode, GeneralForm, MemorySource};
//!
//! let definition = FormDefinition::new(vec![
//!     FieldConfig::text("name").label("Nome").required(),
//!     FieldConfig::email("email").required(),
//!     FieldConfig::password("password").required(),
//!     FieldConfig::password("confirm_password")
//!         .label("Conferma password")
//!         .equal_to("password"),
//! ]);
//!
//! let mut form = GeneralForm::builder(definition)
//!     .mode(FormMode::Create)
//!     .source(MemorySource::new("id"))
//!     .build()?;
//!
//! form.change("name", "Mario")?;
//! let outcome = form.submit().await;
//! ```
//!
//! ## Field options
//!
//! - `required()` - Blank values are invalid (per type: checkboxes must be
//!   checked, select boxes must not be `"unset"`)
//! - `equal_to("other")` - Value must equal another field's value
//! - `visible_when(predicate)` - Hidden fields are cleared and skip validation
//! - `validate_with(op, validator)` - Custom verdict merged with the standard
//!   one through a [`BoolOp`]
//! - `grid(GridLayout::span(n))` - Column spans per breakpoint
//!
//! ## Modes
//!
//! - [`FormMode::Create`] - Start empty, submit creates a record
//! - [`FormMode::Update`] - Load a record, submit updates it
//! - [`FormMode::Upsert`] - Update if a record exists, create it otherwise
//!
//! ## Collaborators
//!
//! Forms talk to their backend through a [`DataSource`]:
//! - [`RestSource`] - Endpoints over any [`Transport`]; with the `http`
//!   feature, `ReqwestTransport` speaks JSON over HTTP
//! - [`MemorySource`] - In-memory records for tests and demos

// Re-export all types from form-engine-types
pub use form_engine_types::*;

// Re-export the derive macro
pub use form_engine_macro::FormRecord;

pub mod dispatch;
pub mod flow;
pub mod form;
pub mod options;
pub mod repeater;
pub mod transport;
pub mod validation;

pub use dispatch::{Control, DispatchOptions, FieldView, FormView, SubmitView, form_view};
pub use flow::{
    ControlledData, CreateFlow, DataState, FlowState, FormMode, NOTHING_TO_SAVE, SubmitOutcome,
    UpdateFlow, UpsertFlow,
};
pub use form::{
    CHECK_INPUT, FormBuilder, FormListener, FormMessage, GeneralForm, MessageLevel, SubmitHandle,
};
pub use options::DependentOptions;
pub use transport::{Endpoint, Method, RestSource, Transport, TransportError};
pub use validation::{compute_validation, default_validation_feedback, merge_feedback};

#[cfg(feature = "http")]
pub use transport::ReqwestTransport;

// In-memory data source for testing forms without a server
mod memory_source;
pub use memory_source::{MemorySource, MemorySourceError, Operation};
