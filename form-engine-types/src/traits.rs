use async_trait::async_trait;

use crate::{DataResponse, FieldValueError, FormData, FormError};

/// Trait for typed records edited through a form.
///
/// This trait is typically derived using `#[derive(FormRecord)]`, which also
/// generates a `<Type>Field` enum naming every field.
pub trait FormRecord: Sized {
    /// Names of the record's fields, in declaration order.
    fn field_names() -> &'static [&'static str];

    /// Flatten the record into form data.
    fn to_form_data(&self) -> FormData;

    /// Rebuild the record from form data.
    ///
    /// Fails with the offending field's name when a value is missing or has
    /// the wrong shape.
    fn from_form_data(data: &FormData) -> Result<Self, FieldValueError>;
}

/// The data collaborators a form calls: load, create and update.
///
/// Implementations answer with the remote envelope. A `success: false`
/// envelope is a business failure the page reports; an `Err` is an
/// unexpected failure (transport down, handler crashed) that the form logs
/// and reports the same way. Collaborators a form does not need keep the
/// default implementations, which report them as missing.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Load the record identified by `params`.
    async fn get_data(&self, _params: &FormData) -> anyhow::Result<DataResponse> {
        Err(FormError::MissingCollaborator("get_data").into())
    }

    /// Create a record from `payload`.
    async fn create_data(&self, _payload: &FormData) -> anyhow::Result<DataResponse> {
        Err(FormError::MissingCollaborator("create_data").into())
    }

    /// Update the record described by `payload`.
    async fn update_data(&self, _payload: &FormData) -> anyhow::Result<DataResponse> {
        Err(FormError::MissingCollaborator("update_data").into())
    }
}
