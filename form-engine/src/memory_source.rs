//! In-memory data source for testing forms without a server.
//!
//! `MemorySource` keeps records keyed by an id field and answers the three
//! collaborator calls the way a REST backend would. Failures can be scripted
//! per operation, and call counters tell tests what reached the "network".
//!
//! # Example
//!
//! ```rust
//! use form_engine::{ApiResponse, DataSource, FormData, MemorySource};
//!
//! # tokio_test_block_on(async {
//! let source = MemorySource::new("id")
//!     .with_record(FormData::new().with("id", 1).with("name", "Mario"));
//!
//! let found = source.get_data(&FormData::new().with("id", 1)).await.unwrap();
//! assert_eq!(found.data.unwrap().get_str("name"), Some("Mario"));
//!
//! source.fail_next_update(ApiResponse::failure("Non autorizzato", None));
//! let rejected = source.update_data(&FormData::new().with("id", 1)).await.unwrap();
//! assert!(!rejected.response.success);
//! assert_eq!(source.update_calls(), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{ApiResponse, DataResponse, DataSource, FieldValue, FormData};

/// The collaborator operations a form calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Create,
    Update,
}

/// Error type for MemorySource.
#[derive(Debug, thiserror::Error)]
pub enum MemorySourceError {
    #[error("Lock poisoned")]
    Poisoned,

    #[error("Scripted failure during {operation:?}: {message}")]
    Scripted {
        operation: Operation,
        message: String,
    },
}

enum Scripted {
    Reject(ApiResponse),
    Error(String),
}

#[derive(Default)]
struct Inner {
    records: RwLock<BTreeMap<String, FormData>>,
    scripted: RwLock<Vec<(Operation, Scripted)>>,
    next_id: AtomicUsize,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

/// A data source that keeps records in memory.
///
/// Clones share the same records, scripts and counters.
#[derive(Clone)]
pub struct MemorySource {
    id_field: String,
    latency: Option<Duration>,
    inner: Arc<Inner>,
}

impl MemorySource {
    /// Create an empty source whose records are keyed by `id_field`.
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            latency: None,
            inner: Arc::new(Inner {
                next_id: AtomicUsize::new(1),
                ..Inner::default()
            }),
        }
    }

    /// Add a record. Records without an id get the next free one.
    pub fn with_record(self, record: FormData) -> Self {
        if let Err(err) = self.store(record) {
            warn!(error = %err, "record not stored");
        }
        self
    }

    /// Delay every answer, e.g. to unmount a form mid-request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answer the next call of `operation` with `success: false`.
    pub fn fail_next(&self, operation: Operation, response: ApiResponse) {
        self.script(operation, Scripted::Reject(response));
    }

    /// Make the next call of `operation` return an error.
    pub fn error_next(&self, operation: Operation, message: impl Into<String>) {
        self.script(operation, Scripted::Error(message.into()));
    }

    pub fn fail_next_get(&self, response: ApiResponse) {
        self.fail_next(Operation::Get, response);
    }

    pub fn fail_next_create(&self, response: ApiResponse) {
        self.fail_next(Operation::Create, response);
    }

    pub fn fail_next_update(&self, response: ApiResponse) {
        self.fail_next(Operation::Update, response);
    }

    pub fn get_calls(&self) -> usize {
        self.inner.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.inner.update_calls.load(Ordering::SeqCst)
    }

    /// A stored record by id.
    pub fn record(&self, id: impl Into<FieldValue>) -> Option<FormData> {
        let key = record_key(&id.into())?;
        self.inner.records.read().ok()?.get(&key).cloned()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.records.read().map_or(0, |records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn script(&self, operation: Operation, scripted: Scripted) {
        if let Ok(mut scripts) = self.inner.scripted.write() {
            scripts.push((operation, scripted));
        }
    }

    fn take_script(&self, operation: Operation) -> Result<Option<Scripted>, MemorySourceError> {
        let mut scripts = self
            .inner
            .scripted
            .write()
            .map_err(|_| MemorySourceError::Poisoned)?;
        let position = scripts.iter().position(|(op, _)| *op == operation);
        Ok(position.map(|index| scripts.remove(index).1))
    }

    /// Answer from the script, if one is pending for `operation`.
    fn scripted_answer(&self, operation: Operation) -> Option<anyhow::Result<DataResponse>> {
        match self.take_script(operation) {
            Ok(None) => None,
            Ok(Some(Scripted::Reject(response))) => Some(Ok(DataResponse::from(response))),
            Ok(Some(Scripted::Error(message))) => {
                Some(Err(MemorySourceError::Scripted { operation, message }.into()))
            }
            Err(err) => Some(Err(err.into())),
        }
    }

    fn store(&self, mut record: FormData) -> Result<FormData, MemorySourceError> {
        let key = match record_key(record.value(&self.id_field)) {
            Some(key) => key,
            None => {
                let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
                record.insert(self.id_field.clone(), id as i64);
                id.to_string()
            }
        };

        let mut records = self
            .inner
            .records
            .write()
            .map_err(|_| MemorySourceError::Poisoned)?;
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn get_data(&self, params: &FormData) -> anyhow::Result<DataResponse> {
        self.inner.get_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if let Some(answer) = self.scripted_answer(Operation::Get) {
            return answer;
        }

        let found = record_key(params.value(&self.id_field)).and_then(|key| {
            let records = self.inner.records.read().ok()?;
            records.get(&key).cloned()
        });
        debug!(found = found.is_some(), "memory source get");

        Ok(match found {
            Some(record) => ApiResponse::ok("Dati caricati").with_data(record).into(),
            None => ApiResponse::failure("Nessun dato trovato", None).into(),
        })
    }

    async fn create_data(&self, payload: &FormData) -> anyhow::Result<DataResponse> {
        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if let Some(answer) = self.scripted_answer(Operation::Create) {
            return answer;
        }

        let record = self.store(payload.clone())?;
        debug!(id = ?record.value(&self.id_field), "memory source create");
        Ok(ApiResponse::ok("Creato con successo").with_data(record).into())
    }

    async fn update_data(&self, payload: &FormData) -> anyhow::Result<DataResponse> {
        self.inner.update_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if let Some(answer) = self.scripted_answer(Operation::Update) {
            return answer;
        }

        let Some(key) = record_key(payload.value(&self.id_field)) else {
            return Ok(ApiResponse::failure("Identificativo mancante", None).into());
        };

        let updated = {
            let mut records = self
                .inner
                .records
                .write()
                .map_err(|_| MemorySourceError::Poisoned)?;
            records.get_mut(&key).map(|record| {
                *record = record.merged(payload);
                record.clone()
            })
        };
        debug!(id = %key, found = updated.is_some(), "memory source update");

        Ok(match updated {
            Some(record) => ApiResponse::ok("Aggiornato con successo")
                .with_data(record)
                .into(),
            None => ApiResponse::failure("Nessun dato trovato", None).into(),
        })
    }
}

/// Normalise an id value to a map key; integral numbers lose their fraction.
fn record_key(id: &FieldValue) -> Option<String> {
    match id {
        FieldValue::Text(text) if !text.is_empty() => Some(text.clone()),
        FieldValue::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
        FieldValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
