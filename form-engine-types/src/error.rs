/// Error type for form operations.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The field configuration is inconsistent.
    #[error("Invalid form definition: {0}")]
    Definition(#[from] DefinitionError),

    /// The mode needs a data collaborator that was not supplied.
    #[error("No data source configured for {0}")]
    MissingCollaborator(&'static str),

    /// No field with this name is configured.
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    /// The field is hidden by its visibility rule and cannot be edited.
    #[error("Field '{0}' is hidden")]
    HiddenField(String),

    /// A repeater operation targeted a field that is not a repeater.
    #[error("Field '{0}' is not a repeater")]
    NotARepeater(String),

    /// An external submit was requested while another one is still pending.
    #[error("A submit is already in flight")]
    SubmitInFlight,

    /// The form was unmounted before the request could be served.
    #[error("Form has been unmounted")]
    Unmounted,

    /// Collaborator failure (transport, I/O, server crash, etc.)
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

impl FormError {
    /// Create a collaborator error from any error type.
    pub fn collaborator(err: impl Into<anyhow::Error>) -> Self {
        Self::Collaborator(err.into())
    }

    /// Check if this error is the single-flight rejection of an external submit.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::SubmitInFlight)
    }
}

/// Structural problems in a `FormDefinition`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("Duplicate field name '{name}'")]
    DuplicateField { name: String },

    #[error("Field '{field}' must equal unknown field '{target}'")]
    UnknownEqualTo { field: String, target: String },

    #[error("Select box '{field}' depends on unknown field '{dependency}'")]
    UnknownDependency { field: String, dependency: String },
}

/// Error reading a typed value out of `FormData`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldValueError {
    #[error("missing value")]
    Missing,

    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{value} does not fit into {target}")]
    OutOfRange { value: f64, target: &'static str },

    #[error("field '{field}': {source}")]
    Field {
        field: String,
        source: Box<FieldValueError>,
    },
}

impl FieldValueError {
    /// Attach the name of the field the error occurred in.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }
}
