use serde::{Deserialize, Serialize};

use crate::{FieldValue, FormData};

/// The envelope every remote call answers with.
///
/// The engine only looks at `success` and `data`; `message` and `error`
/// are passed through to the page for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FieldValue>,
}

impl ApiResponse {
    /// A successful response.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            data: None,
        }
    }

    /// A failed response.
    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error,
            data: None,
        }
    }

    /// Attach a payload.
    pub fn with_data(mut self, data: impl Into<FieldValue>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// The payload as a record, if it is one.
    pub fn record(&self) -> Option<&FormData> {
        self.data.as_ref().and_then(FieldValue::as_record)
    }
}

/// What a data collaborator hands back: the raw envelope plus the record
/// extracted from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataResponse {
    pub response: ApiResponse,
    pub data: Option<FormData>,
}

impl DataResponse {
    /// Build from an envelope, extracting a record payload.
    pub fn from_response(response: ApiResponse) -> Self {
        let data = response.record().cloned();
        Self { response, data }
    }

    /// Successful and carrying a record.
    pub fn has_data(&self) -> bool {
        self.response.success && self.data.is_some()
    }
}

impl From<ApiResponse> for DataResponse {
    fn from(response: ApiResponse) -> Self {
        Self::from_response(response)
    }
}
