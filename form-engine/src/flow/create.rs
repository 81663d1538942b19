use tracing::{info, warn};

use super::{FlowContext, FlowState, SubmitOutcome, failure_outcome};
use crate::FormDefinition;

/// Start empty; a valid submit creates a record and clears the form.
#[derive(Debug, Clone)]
pub struct CreateFlow {
    state: FlowState,
}

impl CreateFlow {
    pub fn new(definition: &FormDefinition) -> Self {
        Self {
            state: FlowState::fresh(definition),
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    pub async fn submit(&mut self, ctx: &FlowContext) -> SubmitOutcome {
        let definition = &ctx.definition;
        if !self.state.validate_all(definition) {
            warn!(
                invalid = ?self.state.feedback.invalid_fields().collect::<Vec<_>>(),
                "create blocked by validation"
            );
            return SubmitOutcome::NotValidated;
        }

        self.state.is_saving = true;
        let payload = ctx.payload(&self.state.form_data);
        let result = ctx.source.create_data(&payload).await;
        self.state.is_saving = false;

        if ctx.is_unmounted() {
            warn!("form unmounted during create; discarding result");
            return SubmitOutcome::Stale;
        }

        let response = match failure_outcome(result) {
            Ok(response) => response,
            Err(outcome) => return outcome,
        };

        info!(message = %response.response.message, "record created");
        let fresh = FlowState::fresh(definition);
        self.state.reset_to(definition, fresh.form_data, None);

        SubmitOutcome::Saved {
            response: response.response,
            data: response.data,
        }
    }
}
