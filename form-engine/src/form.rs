//! `GeneralForm`: a mounted form driven by one of the flows.
//!
//! The form owns its flow state and reports to the page through a
//! [`FormListener`]. Pages that submit from outside the form (a toolbar
//! button, a wizard step) register a [`SubmitHandle`] and let the form serve
//! its requests with [`GeneralForm::run`] or [`GeneralForm::serve_external_submit`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::{DispatchOptions, FormView, form_view};
use crate::flow::{
    ControlledData, DataState, Flow, FlowContext, FlowState, FormMode, SubmitOutcome, params_key,
};
use crate::options::DependentOptions;
use crate::{
    ApiResponse, DataSource, FeedbackMap, FieldValue, FormData, FormDefinition, FormError,
    ValidationFeedback, repeater,
};

/// Warning shown once per submit blocked by local validation.
pub const CHECK_INPUT: &str = "Controlla i dati inseriti";

/// Severity of a message for the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A message the page should show, e.g. as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl FormMessage {
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Callbacks of the page hosting a form. All methods default to no-ops.
pub trait FormListener: Send + Sync {
    /// A save succeeded; `data` is the record the collaborator returned.
    fn on_success(&self, _response: &ApiResponse, _data: Option<&FormData>) {}

    /// The form contents changed.
    fn on_change(&self, _data: &FormData) {}

    fn on_new_message(&self, _message: &FormMessage) {}

    /// A submit was blocked by local validation.
    fn on_not_validated(&self, _feedback: &FeedbackMap) {}

    /// A load started or finished.
    fn on_data_state(&self, _state: &DataState) {}

    /// A submit started (`true`) or finished (`false`). The form is borrowed
    /// for the whole submit, so this is how the page learns to keep its
    /// submit control disabled in between.
    fn on_saving(&self, _saving: bool) {}
}

struct NoopListener;

impl FormListener for NoopListener {}

/// Builder for [`GeneralForm`].
pub struct FormBuilder {
    definition: FormDefinition,
    mode: FormMode,
    params: FormData,
    source: Option<Arc<dyn DataSource>>,
    controlled: Option<ControlledData>,
    listener: Arc<dyn FormListener>,
    dispatch: DispatchOptions,
}

impl FormBuilder {
    pub fn mode(mut self, mode: FormMode) -> Self {
        self.mode = mode;
        self
    }

    /// Static parameters: merged into every payload and used to load data.
    pub fn params(mut self, params: FormData) -> Self {
        self.params = params;
        self
    }

    pub fn source(mut self, source: impl DataSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn shared_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Supply the record instead of letting the form fetch it.
    pub fn data(mut self, data: Option<FormData>, response: ApiResponse) -> Self {
        self.controlled = Some(ControlledData::new(data, response));
        self
    }

    pub fn listener(mut self, listener: impl FormListener + 'static) -> Self {
        self.listener = Arc::new(listener);
        self
    }

    pub fn shared_listener(mut self, listener: Arc<dyn FormListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn dispatch_options(mut self, options: DispatchOptions) -> Self {
        self.dispatch = options;
        self
    }

    /// Check the definition and build the form. Nothing is loaded until
    /// [`GeneralForm::mount`].
    pub fn build(self) -> Result<GeneralForm, FormError> {
        self.definition.check()?;
        let source = self
            .source
            .ok_or(FormError::MissingCollaborator("data source"))?;

        let flow = Flow::new(self.mode, &self.definition);
        let mut dependents = DependentOptions::new();
        dependents.observe(&self.definition, &flow.state().form_data);

        Ok(GeneralForm {
            ctx: FlowContext {
                definition: Arc::new(self.definition),
                source,
                params: self.params,
                lifetime: CancellationToken::new(),
            },
            flow,
            controlled: self.controlled,
            listener: self.listener,
            dispatch: self.dispatch,
            dependents,
            data_state: None,
            requests: None,
        })
    }
}

struct SubmitRequest {
    reply: oneshot::Sender<SubmitOutcome>,
}

/// Triggers a form's submit from outside the form.
///
/// Only one submit may be pending at a time; clones share that guard.
#[derive(Clone)]
pub struct SubmitHandle {
    requests: mpsc::Sender<SubmitRequest>,
    in_flight: Arc<AtomicBool>,
}

impl SubmitHandle {
    /// Ask the form to submit and wait for the outcome.
    ///
    /// Fails with [`FormError::SubmitInFlight`] while another submit through
    /// this handle is pending, and with [`FormError::Unmounted`] when the
    /// form stopped serving requests.
    pub async fn submit(&self) -> Result<SubmitOutcome, FormError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("external submit rejected, another one is in flight");
            return Err(FormError::SubmitInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(SubmitRequest { reply })
            .await
            .map_err(|_| FormError::Unmounted)?;
        outcome.await.map_err(|_| FormError::Unmounted)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A mounted form.
pub struct GeneralForm {
    ctx: FlowContext,
    flow: Flow,
    controlled: Option<ControlledData>,
    listener: Arc<dyn FormListener>,
    dispatch: DispatchOptions,
    dependents: DependentOptions,
    data_state: Option<DataState>,
    requests: Option<mpsc::Receiver<SubmitRequest>>,
}

impl GeneralForm {
    pub fn builder(definition: FormDefinition) -> FormBuilder {
        FormBuilder {
            definition,
            mode: FormMode::default(),
            params: FormData::new(),
            source: None,
            controlled: None,
            listener: Arc::new(NoopListener),
            dispatch: DispatchOptions::default(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.flow.mode()
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.ctx.definition
    }

    pub fn params(&self) -> &FormData {
        &self.ctx.params
    }

    pub fn state(&self) -> &FlowState {
        self.flow.state()
    }

    pub fn data(&self) -> &FormData {
        &self.flow.state().form_data
    }

    /// The last load result, if a load happened.
    pub fn data_state(&self) -> Option<&DataState> {
        self.data_state.as_ref()
    }

    /// The token cancelled by [`GeneralForm::unmount`].
    pub fn lifetime(&self) -> CancellationToken {
        self.ctx.lifetime.clone()
    }

    pub fn is_unmounted(&self) -> bool {
        self.ctx.is_unmounted()
    }

    /// Load the record for update and upsert forms.
    pub async fn mount(&mut self) -> Result<Option<&DataState>, FormError> {
        if self.is_unmounted() {
            return Err(FormError::Unmounted);
        }
        self.load().await;
        Ok(self.data_state.as_ref())
    }

    async fn load(&mut self) {
        if self.mode() == FormMode::Create {
            return;
        }
        if self.controlled.is_none() {
            self.listener.on_data_state(&DataState::Loading);
        }

        let Some(state) = self.flow.load(&self.ctx, self.controlled.as_ref()).await else {
            return;
        };
        if let DataState::Failed(err) = &state {
            self.message(MessageLevel::Error, err.clone());
        }
        self.listener.on_data_state(&state);
        self.data_state = Some(state);
        self.dependents
            .observe(&self.ctx.definition, &self.flow.state().form_data);
    }

    /// Replace the params; the record is reloaded when they changed.
    pub async fn set_params(&mut self, params: FormData) {
        if params_key(&params) == params_key(&self.ctx.params) {
            return;
        }
        debug!(params = %params_key(&params), "params changed");
        self.ctx.params = params;
        if !self.is_unmounted() {
            self.load().await;
        }
    }

    /// Replace the controlled record; the form reloads when it changed.
    pub async fn set_data(&mut self, data: Option<FormData>, response: ApiResponse) {
        let controlled = ControlledData::new(data, response);
        if self.controlled.as_ref() == Some(&controlled) {
            return;
        }
        self.controlled = Some(controlled);
        if !self.is_unmounted() {
            self.load().await;
        }
    }

    /// Set a top-level field.
    pub fn change(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        self.apply_change(name, value.into(), None)
    }

    /// Set a top-level field together with the feedback its control computed.
    pub fn change_with_feedback(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
        feedback: ValidationFeedback,
    ) -> Result<(), FormError> {
        self.apply_change(name, value.into(), Some(feedback))
    }

    fn apply_change(
        &mut self,
        name: &str,
        value: FieldValue,
        reported: Option<ValidationFeedback>,
    ) -> Result<(), FormError> {
        self.ensure_editable(name)?;
        self.flow
            .state_mut()
            .handle_input_change(&self.ctx.definition, name, value, reported);
        self.changed();
        Ok(())
    }

    /// Only configured, currently visible fields take edits.
    fn ensure_editable(&self, name: &str) -> Result<(), FormError> {
        if self.ctx.definition.field(name).is_none() {
            return Err(FormError::UnknownField(name.to_string()));
        }
        if !self.flow.state().is_visible(name) {
            warn!(field = name, "edit of a hidden field rejected");
            return Err(FormError::HiddenField(name.to_string()));
        }
        Ok(())
    }

    pub fn add_item(&mut self, name: &str) -> Result<usize, FormError> {
        self.ensure_editable(name)?;
        let index = repeater::add_item(self.flow.state_mut(), &self.ctx.definition, name)?;
        self.changed();
        Ok(index)
    }

    pub fn remove_item(&mut self, name: &str, index: usize) -> Result<(), FormError> {
        self.ensure_editable(name)?;
        repeater::remove_item(self.flow.state_mut(), &self.ctx.definition, name, index)?;
        self.changed();
        Ok(())
    }

    pub fn set_item_value(
        &mut self,
        name: &str,
        index: usize,
        sub_field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), FormError> {
        self.ensure_editable(name)?;
        repeater::set_item_value(
            self.flow.state_mut(),
            &self.ctx.definition,
            name,
            index,
            sub_field,
            value.into(),
        )?;
        self.changed();
        Ok(())
    }

    /// Reset dependent select boxes, then tell the page.
    fn changed(&mut self) {
        let definition = Arc::clone(&self.ctx.definition);

        // A reset can be a dependency of another select box.
        for _ in 0..=definition.len() {
            let resets = self
                .dependents
                .refresh(&definition, &self.flow.state().form_data);
            if resets.is_empty() {
                break;
            }
            for (name, value) in resets {
                self.flow
                    .state_mut()
                    .handle_input_change(&definition, &name, value, None);
            }
        }

        self.listener.on_change(&self.flow.state().form_data);
    }

    /// Validate and save through the mode's collaborator.
    ///
    /// The form stays mutably borrowed until the save settles, so saves never
    /// overlap. Listeners hear `on_saving` on both sides of it.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.is_unmounted() {
            warn!("submit on an unmounted form");
            return SubmitOutcome::Stale;
        }

        self.listener.on_saving(true);
        let outcome = self.flow.submit(&self.ctx).await;
        self.listener.on_saving(false);
        self.report(&outcome);
        outcome
    }

    fn report(&mut self, outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::NotValidated => {
                self.message(MessageLevel::Warning, CHECK_INPUT);
                self.listener.on_not_validated(&self.flow.state().feedback);
            }
            SubmitOutcome::Saved { response, data } => {
                info!(mode = ?self.mode(), "form saved");
                self.dependents
                    .observe(&self.ctx.definition, &self.flow.state().form_data);
                self.message(MessageLevel::Success, response.message.clone());
                self.listener.on_success(response, data.as_ref());
            }
            SubmitOutcome::Unchanged(response) => {
                self.message(MessageLevel::Info, response.message.clone());
            }
            SubmitOutcome::Failed { response } => {
                let text = match (&response.error, response.message.is_empty()) {
                    (Some(error), true) => error.clone(),
                    _ => response.message.clone(),
                };
                self.message(MessageLevel::Error, text);
            }
            SubmitOutcome::Errored(err) => {
                self.message(MessageLevel::Error, err.clone());
            }
            SubmitOutcome::Stale => {}
        }
    }

    fn message(&self, level: MessageLevel, text: impl Into<String>) {
        self.listener.on_new_message(&FormMessage::new(level, text));
    }

    /// The view a renderer draws.
    pub fn view(&self) -> FormView {
        form_view(&self.ctx.definition, self.flow.state(), &self.dispatch)
    }

    /// Stop the form. In-flight calls finish, but their results are dropped.
    pub fn unmount(&mut self) {
        info!("form unmounted");
        self.ctx.lifetime.cancel();
        self.requests = None;
    }

    /// Create the handle for submits from outside the form. A new
    /// registration replaces the previous one.
    pub fn register_submit(&mut self) -> SubmitHandle {
        let (requests, receiver) = mpsc::channel(1);
        self.requests = Some(receiver);
        SubmitHandle {
            requests,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Serve one pending external submit, if any, without waiting.
    pub async fn serve_external_submit(&mut self) -> Option<SubmitOutcome> {
        let request = self.requests.as_mut()?.try_recv().ok()?;
        Some(self.answer(request).await)
    }

    /// Serve external submits until the form is unmounted or every handle
    /// is dropped.
    pub async fn run(&mut self) {
        let Some(mut requests) = self.requests.take() else {
            return;
        };
        let lifetime = self.lifetime();

        loop {
            tokio::select! {
                _ = lifetime.cancelled() => {
                    debug!("form unmounted, external submits stop");
                    break;
                }
                request = requests.recv() => {
                    let Some(request) = request else {
                        debug!("all submit handles dropped");
                        break;
                    };
                    self.answer(request).await;
                }
            }
        }

        if !self.is_unmounted() {
            self.requests = Some(requests);
        }
    }

    async fn answer(&mut self, request: SubmitRequest) -> SubmitOutcome {
        debug!("serving external submit");
        let outcome = self.submit().await;
        if request.reply.send(outcome.clone()).is_err() {
            warn!("external submit caller went away");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{FieldConfig, MemorySource};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<FormMessage>>,
        changes: Mutex<usize>,
    }

    impl FormListener for Arc<Recorder> {
        fn on_change(&self, _data: &FormData) {
            *self.changes.lock().unwrap() += 1;
        }

        fn on_new_message(&self, message: &FormMessage) {
            self.messages.lock().unwrap().push(message.clone());
        }
    }

    fn definition() -> FormDefinition {
        FormDefinition::new(vec![FieldConfig::text("name").required()])
    }

    #[test]
    fn building_needs_a_source() {
        let err = GeneralForm::builder(definition()).build().err();
        assert!(matches!(err, Some(FormError::MissingCollaborator(_))));
    }

    #[test]
    fn broken_definitions_are_rejected() {
        let definition = FormDefinition::new(vec![
            FieldConfig::text("name"),
            FieldConfig::text("name"),
        ]);
        let err = GeneralForm::builder(definition)
            .source(MemorySource::new("id"))
            .build()
            .err();
        assert!(matches!(err, Some(FormError::Definition(_))));
    }

    #[tokio::test]
    async fn blocked_submit_warns_once() {
        let recorder = Arc::new(Recorder::default());
        let mut form = GeneralForm::builder(definition())
            .source(MemorySource::new("id"))
            .listener(Arc::clone(&recorder))
            .build()
            .unwrap();

        assert_eq!(form.submit().await, SubmitOutcome::NotValidated);
        assert_eq!(
            *recorder.messages.lock().unwrap(),
            vec![FormMessage::new(MessageLevel::Warning, CHECK_INPUT)]
        );
    }

    #[tokio::test]
    async fn unknown_fields_are_rejected() {
        let recorder = Arc::new(Recorder::default());
        let mut form = GeneralForm::builder(definition())
            .source(MemorySource::new("id"))
            .listener(Arc::clone(&recorder))
            .build()
            .unwrap();

        assert!(matches!(form.change("nome", "Mario"), Err(FormError::UnknownField(_))));
        form.change("name", "Mario").unwrap();
        assert_eq!(*recorder.changes.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn unmounted_forms_do_not_submit() {
        let source = MemorySource::new("id");
        let mut form = GeneralForm::builder(definition())
            .source(source.clone())
            .build()
            .unwrap();
        form.change("name", "Mario").unwrap();
        form.unmount();

        assert_eq!(form.submit().await, SubmitOutcome::Stale);
        assert!(matches!(form.mount().await, Err(FormError::Unmounted)));
        assert_eq!(source.create_calls(), 0);
    }
}
