use tracing::{debug, info, warn};

use super::state::{fresh_data, normalise_loaded};
use super::{
    ControlledData, DataState, FlowContext, FlowState, NOTHING_TO_SAVE, SubmitOutcome, data_state,
    failure_outcome, fetch_record,
};
use crate::{ApiResponse, FormDefinition};

/// Edit the record if one exists, create it otherwise.
///
/// After a successful create the form switches to update mode, with the
/// record returned by the server as its new baseline.
#[derive(Debug, Clone)]
pub struct UpsertFlow {
    state: FlowState,
}

impl UpsertFlow {
    pub fn new(definition: &FormDefinition) -> Self {
        let mut state = FlowState::fresh(definition);
        state.is_create_mode = true;
        Self { state }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    pub fn is_create_mode(&self) -> bool {
        self.state.is_create_mode
    }

    /// Load the record; without one the form enters create mode.
    pub async fn load(
        &mut self,
        ctx: &FlowContext,
        controlled: Option<&ControlledData>,
    ) -> Option<DataState> {
        let result = fetch_record(ctx, controlled).await?;
        let state = data_state(&result);

        match result.ok().filter(|response| response.has_data()).and_then(|r| r.data) {
            Some(data) => {
                let data = normalise_loaded(&ctx.definition, data);
                self.state.is_create_mode = false;
                self.state.reset_to(&ctx.definition, data.clone(), Some(data));
            }
            None => {
                debug!("no record found, entering create mode");
                self.state.is_create_mode = true;
                self.state
                    .reset_to(&ctx.definition, fresh_data(&ctx.definition), None);
            }
        }

        Some(state)
    }

    pub async fn submit(&mut self, ctx: &FlowContext) -> SubmitOutcome {
        let definition = &ctx.definition;
        if !self.state.validate_all(definition) {
            warn!(create = self.state.is_create_mode, "upsert blocked by validation");
            return SubmitOutcome::NotValidated;
        }

        if !self.state.is_create_mode && !self.state.is_modified {
            self.state.validated = false;
            return SubmitOutcome::Unchanged(ApiResponse::ok(NOTHING_TO_SAVE));
        }

        self.state.is_saving = true;
        let payload = ctx.payload(&self.state.form_data);
        let result = if self.state.is_create_mode {
            ctx.source.create_data(&payload).await
        } else {
            ctx.source.update_data(&payload).await
        };
        self.state.is_saving = false;

        if ctx.is_unmounted() {
            warn!("form unmounted during upsert; discarding result");
            return SubmitOutcome::Stale;
        }
        self.state.validated = false;

        let response = match failure_outcome(result) {
            Ok(response) => response,
            Err(outcome) => return outcome,
        };

        if self.state.is_create_mode {
            info!(message = %response.response.message, "record created, switching to update");
            let record = normalise_loaded(
                definition,
                response.data.clone().unwrap_or_else(|| payload.clone()),
            );
            self.state.is_create_mode = false;
            self.state.reset_to(definition, record.clone(), Some(record));
        } else {
            info!(message = %response.response.message, "record updated");
            self.state.initial_data = Some(self.state.form_data.clone());
            self.state.refresh_modified(definition);
        }

        SubmitOutcome::Saved {
            response: response.response,
            data: response.data,
        }
    }
}
