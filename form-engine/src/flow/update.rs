use tracing::{info, warn};

use super::state::normalise_loaded;
use super::{
    ControlledData, DataState, FlowContext, FlowState, SubmitOutcome, data_state, failure_outcome,
    fetch_record,
};
use crate::{FormData, FormDefinition};

/// Edit an existing record. Submit sends the whole form and, on success,
/// makes it the new baseline.
#[derive(Debug, Clone)]
pub struct UpdateFlow {
    state: FlowState,
}

impl UpdateFlow {
    pub fn new(definition: &FormDefinition) -> Self {
        let mut state = FlowState::fresh(definition);
        state.initial_data = Some(FormData::new());
        Self { state }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    /// Load the record, from controlled data if given.
    ///
    /// Without a record the form stays empty and so does the baseline.
    /// Returns `None` when the form was unmounted during the fetch.
    pub async fn load(
        &mut self,
        ctx: &FlowContext,
        controlled: Option<&ControlledData>,
    ) -> Option<DataState> {
        let result = fetch_record(ctx, controlled).await?;
        let state = data_state(&result);

        let data = result
            .ok()
            .filter(|response| response.has_data())
            .and_then(|response| response.data)
            .map(|data| normalise_loaded(&ctx.definition, data))
            .unwrap_or_default();
        self.state.reset_to(&ctx.definition, data.clone(), Some(data));

        Some(state)
    }

    pub async fn submit(&mut self, ctx: &FlowContext) -> SubmitOutcome {
        let definition = &ctx.definition;
        if !self.state.validate_all(definition) {
            warn!("update blocked by validation");
            return SubmitOutcome::NotValidated;
        }

        self.state.is_saving = true;
        let payload = ctx.payload(&self.state.form_data);
        let result = ctx.source.update_data(&payload).await;
        self.state.is_saving = false;

        if ctx.is_unmounted() {
            warn!("form unmounted during update; discarding result");
            return SubmitOutcome::Stale;
        }
        self.state.validated = false;

        let response = match failure_outcome(result) {
            Ok(response) => response,
            Err(outcome) => return outcome,
        };

        info!(message = %response.response.message, "record updated");
        self.state.initial_data = Some(self.state.form_data.clone());
        self.state.refresh_modified(definition);

        SubmitOutcome::Saved {
            response: response.response,
            data: response.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{ApiResponse, FieldConfig, MemorySource};
    use tokio_util::sync::CancellationToken;

    fn context(source: MemorySource) -> FlowContext {
        FlowContext {
            definition: Arc::new(FormDefinition::new(vec![
                FieldConfig::text("name").required(),
                FieldConfig::text("surname").required(),
                FieldConfig::checkbox("newsletter"),
            ])),
            source: Arc::new(source),
            params: FormData::new().with("id", 1),
            lifetime: CancellationToken::new(),
        }
    }

    fn mario() -> FormData {
        FormData::new()
            .with("id", 1)
            .with("name", "Mario")
            .with("surname", "Rossi")
    }

    #[tokio::test]
    async fn dirty_tracking_against_the_loaded_record() {
        let ctx = context(MemorySource::new("id").with_record(mario()));
        let mut flow = UpdateFlow::new(&ctx.definition);

        let state = flow.load(&ctx, None).await;
        assert!(matches!(state, Some(DataState::Loaded(_))));
        assert_eq!(flow.state().form_data.get_bool("newsletter"), Some(false));
        assert!(!flow.state().is_modified);

        flow.state_mut()
            .handle_input_change(&ctx.definition, "name", "Luigi".into(), None);
        assert!(flow.state().is_modified);

        flow.state_mut()
            .handle_input_change(&ctx.definition, "name", "Mario".into(), None);
        assert!(!flow.state().is_modified);
    }

    #[tokio::test]
    async fn successful_update_becomes_the_new_baseline() {
        let ctx = context(MemorySource::new("id").with_record(mario()));
        let mut flow = UpdateFlow::new(&ctx.definition);
        flow.load(&ctx, None).await;

        flow.state_mut()
            .handle_input_change(&ctx.definition, "surname", "Bianchi".into(), None);
        let outcome = flow.submit(&ctx).await;

        assert!(outcome.is_saved());
        assert!(!flow.state().is_modified);
        assert!(!flow.state().validated);
        assert_eq!(
            flow.state().initial_data.as_ref().and_then(|d| d.get_str("surname")),
            Some("Bianchi")
        );
    }

    #[tokio::test]
    async fn invalid_submit_keeps_feedback_visible() {
        let source = MemorySource::new("id").with_record(mario());
        let ctx = context(source.clone());
        let mut flow = UpdateFlow::new(&ctx.definition);
        flow.load(&ctx, None).await;

        flow.state_mut()
            .handle_input_change(&ctx.definition, "name", "".into(), None);
        assert_eq!(flow.submit(&ctx).await, SubmitOutcome::NotValidated);
        assert!(flow.state().validated);
        assert_eq!(source.update_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_update_leaves_state_untouched() {
        let source = MemorySource::new("id").with_record(mario());
        source.fail_next_update(ApiResponse::failure("Cliente bloccato", None));
        let ctx = context(source);
        let mut flow = UpdateFlow::new(&ctx.definition);
        flow.load(&ctx, None).await;
        flow.state_mut()
            .handle_input_change(&ctx.definition, "name", "Luigi".into(), None);

        let outcome = flow.submit(&ctx).await;

        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert!(flow.state().is_modified);
        assert!(!flow.state().is_saving);
        assert!(!flow.state().validated);
        assert_eq!(flow.state().form_data.get_str("name"), Some("Luigi"));
    }

    #[tokio::test]
    async fn controlled_data_skips_the_fetch() {
        let source = MemorySource::new("id");
        let ctx = context(source.clone());
        let mut flow = UpdateFlow::new(&ctx.definition);
        let controlled = ControlledData::new(Some(mario()), ApiResponse::ok("Dati forniti"));

        flow.load(&ctx, Some(&controlled)).await;

        assert_eq!(source.get_calls(), 0);
        assert_eq!(flow.state().form_data.get_str("name"), Some("Mario"));
    }
}
