//! Submission flows: the state a mounted form owns and the create, update
//! and upsert state machines driving it.
//!
//! All three flows share [`FlowState`] and its change handler; they differ
//! in how data is loaded, what counts as a modification baseline and which
//! collaborator a submit calls.

mod create;
mod state;
mod update;
mod upsert;

pub use create::CreateFlow;
pub use state::FlowState;
pub use update::UpdateFlow;
pub use upsert::UpsertFlow;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{ApiResponse, DataResponse, DataSource, FormData, FormDefinition};

/// Message returned by an upsert submit that had nothing to save.
pub const NOTHING_TO_SAVE: &str = "Nessuna modifica da salvare";

/// Which flow drives a form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FormMode {
    /// Start empty, submit creates a record.
    #[default]
    Create,
    /// Load a record, submit updates it.
    Update,
    /// Load a record if there is one; create it otherwise.
    Upsert,
}

/// Everything a flow needs from outside its own state.
#[derive(Clone)]
pub struct FlowContext {
    pub definition: Arc<FormDefinition>,
    pub source: Arc<dyn DataSource>,
    /// Static parameters merged into every payload and used to load data.
    pub params: FormData,
    /// Cancelled when the form is unmounted.
    pub lifetime: CancellationToken,
}

impl FlowContext {
    pub fn is_unmounted(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// The payload of a submit: params overlaid with the form contents.
    pub fn payload(&self, data: &FormData) -> FormData {
        self.params.merged(data)
    }
}

/// Data supplied by the caller instead of being fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlledData {
    pub data: Option<FormData>,
    pub response: ApiResponse,
}

impl ControlledData {
    pub fn new(data: Option<FormData>, response: ApiResponse) -> Self {
        Self { data, response }
    }

    fn to_response(&self) -> DataResponse {
        DataResponse {
            response: self.response.clone(),
            data: self.data.clone(),
        }
    }
}

/// What happened to a load, reported to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum DataState {
    /// A request is on its way.
    Loading,
    /// The record arrived.
    Loaded(ApiResponse),
    /// The collaborator answered without a record.
    Missing(ApiResponse),
    /// The collaborator failed.
    Failed(String),
}

/// The result of a submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    NotValidated,
    /// The collaborator accepted the data.
    Saved {
        response: ApiResponse,
        data: Option<FormData>,
    },
    /// Upsert in update mode with nothing modified; nothing was sent.
    Unchanged(ApiResponse),
    /// The collaborator answered `success: false`.
    Failed { response: ApiResponse },
    /// The collaborator returned an error.
    Errored(String),
    /// The form was unmounted while the request was in flight.
    Stale,
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// A form's flow, selected by its [`FormMode`].
#[derive(Debug, Clone)]
pub enum Flow {
    Create(CreateFlow),
    Update(UpdateFlow),
    Upsert(UpsertFlow),
}

impl Flow {
    pub fn new(mode: FormMode, definition: &FormDefinition) -> Self {
        match mode {
            FormMode::Create => Self::Create(CreateFlow::new(definition)),
            FormMode::Update => Self::Update(UpdateFlow::new(definition)),
            FormMode::Upsert => Self::Upsert(UpsertFlow::new(definition)),
        }
    }

    pub fn mode(&self) -> FormMode {
        match self {
            Self::Create(_) => FormMode::Create,
            Self::Update(_) => FormMode::Update,
            Self::Upsert(_) => FormMode::Upsert,
        }
    }

    pub fn state(&self) -> &FlowState {
        match self {
            Self::Create(flow) => flow.state(),
            Self::Update(flow) => flow.state(),
            Self::Upsert(flow) => flow.state(),
        }
    }

    pub fn state_mut(&mut self) -> &mut FlowState {
        match self {
            Self::Create(flow) => flow.state_mut(),
            Self::Update(flow) => flow.state_mut(),
            Self::Upsert(flow) => flow.state_mut(),
        }
    }

    /// Load the record. Create flows have nothing to load; `None` is also
    /// returned when the form was unmounted during the fetch.
    pub async fn load(
        &mut self,
        ctx: &FlowContext,
        controlled: Option<&ControlledData>,
    ) -> Option<DataState> {
        match self {
            Self::Create(_) => None,
            Self::Update(flow) => flow.load(ctx, controlled).await,
            Self::Upsert(flow) => flow.load(ctx, controlled).await,
        }
    }

    pub async fn submit(&mut self, ctx: &FlowContext) -> SubmitOutcome {
        match self {
            Self::Create(flow) => flow.submit(ctx).await,
            Self::Update(flow) => flow.submit(ctx).await,
            Self::Upsert(flow) => flow.submit(ctx).await,
        }
    }
}

/// Fetch the record for update and upsert flows, preferring controlled data.
///
/// Returns `None` when the form was unmounted while the request was running.
pub(crate) async fn fetch_record(
    ctx: &FlowContext,
    controlled: Option<&ControlledData>,
) -> Option<anyhow::Result<DataResponse>> {
    if let Some(controlled) = controlled {
        return Some(Ok(controlled.to_response()));
    }

    let result = ctx.source.get_data(&ctx.params).await;
    if ctx.is_unmounted() {
        warn!("form unmounted while loading; discarding result");
        return None;
    }
    Some(result)
}

/// Classify a load result for the page.
pub(crate) fn data_state(result: &anyhow::Result<DataResponse>) -> DataState {
    match result {
        Ok(response) if response.has_data() => {
            info!(message = %response.response.message, "record loaded");
            DataState::Loaded(response.response.clone())
        }
        Ok(response) => {
            info!(message = %response.response.message, "no record to load");
            DataState::Missing(response.response.clone())
        }
        Err(err) => {
            error!(error = %err, "loading the record failed");
            DataState::Failed(format!("{err:#}"))
        }
    }
}

/// Turn a finished collaborator call into an outcome. Successes are left to
/// the caller, which has to reconcile its state first.
pub(crate) fn failure_outcome(
    result: anyhow::Result<DataResponse>,
) -> Result<DataResponse, SubmitOutcome> {
    match result {
        Ok(response) if response.response.success => Ok(response),
        Ok(response) => {
            warn!(message = %response.response.message, "collaborator rejected the data");
            Err(SubmitOutcome::Failed {
                response: response.response,
            })
        }
        Err(err) => {
            error!(error = %err, "collaborator call failed");
            Err(SubmitOutcome::Errored(format!("{err:#}")))
        }
    }
}

/// Serialised form of the params, used to detect changes.
pub fn params_key(params: &FormData) -> String {
    serde_json::to_string(params).unwrap_or_default()
}
