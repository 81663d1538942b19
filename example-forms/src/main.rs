//! Walks the advisory forms through their flows against an in-memory
//! backend and prints the rendered HTML.
//!
//! Run with `RUST_LOG=debug` to follow the engine's decisions.

use example_forms::{
    AdvisoryProfileField, CustomerRegistrationField, PortfolioField, advisory_profile,
    customer_registration, portfolio,
};
use form_engine::{
    ApiResponse, FeedbackMap, FormData, FormListener, FormMessage, FormMode, GeneralForm,
    MemorySource, SubmitOutcome,
};
use form_engine_html::{HtmlOptions, to_html};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Forwards form events to the log.
struct LogListener(&'static str);

impl FormListener for LogListener {
    fn on_success(&self, response: &ApiResponse, data: Option<&FormData>) {
        info!(form = self.0, message = %response.message, fields = data.map_or(0, FormData::len), "saved");
    }

    fn on_new_message(&self, message: &FormMessage) {
        info!(form = self.0, level = ?message.level, "{}", message.text);
    }

    fn on_not_validated(&self, feedback: &FeedbackMap) {
        let invalid: Vec<_> = feedback.invalid_fields().collect();
        warn!(form = self.0, ?invalid, "submit blocked");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    register_customer().await?;
    build_portfolio().await?;
    profile_customer().await?;
    Ok(())
}

async fn register_customer() -> anyhow::Result<()> {
    use CustomerRegistrationField as F;

    println!("=== Registering a customer ===");
    let customers = MemorySource::new("id");
    let mut form = GeneralForm::builder(customer_registration())
        .source(customers.clone())
        .listener(LogListener("registration"))
        .build()?;
    form.mount().await?;

    form.change(F::FirstName.as_str(), "Mario")?;
    form.change(F::LastName.as_str(), "Rossi")?;
    let outcome = form.submit().await;
    info!(?outcome, "first attempt");

    form.change(F::FiscalCode.as_str(), "RSSMRA80A01H501U")?;
    form.change(F::Email.as_str(), "mario.rossi@example.com")?;
    form.change(F::BirthDate.as_str(), "1980-01-01")?;
    form.change(F::Password.as_str(), "segreta123")?;
    form.change(F::ConfirmPassword.as_str(), "segreta123")?;
    form.change(F::Privacy.as_str(), true)?;
    let outcome = form.submit().await;
    info!(saved = outcome.is_saved(), customers = customers.len(), "second attempt");

    println!("{}", to_html(&form.view(), &HtmlOptions::new().full_document(false)));
    Ok(())
}

async fn build_portfolio() -> anyhow::Result<()> {
    use PortfolioField as F;

    println!("=== Building a portfolio ===");
    let mut form = GeneralForm::builder(portfolio())
        .source(MemorySource::new("id"))
        .listener(LogListener("portfolio"))
        .build()?;
    form.mount().await?;

    form.change(F::Name.as_str(), "Prudente 2030")?;
    form.change(F::Strategy.as_str(), "income")?;
    form.change(F::AssetClass.as_str(), "bond")?;
    form.change(F::Instrument.as_str(), "btp_10y")?;
    form.change(F::Amount.as_str(), 25_000)?;

    let index = form.add_item(F::Holdings.as_str())?;
    form.set_item_value(F::Holdings.as_str(), index, "isin", "IT0005436693")?;
    form.set_item_value(F::Holdings.as_str(), index, "quantity", 10)?;

    // Switching asset class drops the instrument picked for the old one.
    form.change(F::AssetClass.as_str(), "equity")?;
    info!(instrument = ?form.data().get(F::Instrument.as_str()), "after switching asset class");
    form.change(F::Instrument.as_str(), "msci_world")?;

    // The toolbar submits through a handle while the form serves requests.
    let toolbar = form.register_submit();
    let server = tokio::spawn(async move {
        form.run().await;
        form
    });
    let outcome = toolbar.submit().await?;
    info!(saved = outcome.is_saved(), "toolbar submit");
    drop(toolbar);
    let form = server.await?;

    println!("{}", to_html(&form.view(), &HtmlOptions::new().full_document(false)));
    Ok(())
}

async fn profile_customer() -> anyhow::Result<()> {
    use AdvisoryProfileField as F;

    println!("=== Profiling a customer ===");
    let profiles = MemorySource::new(F::CustomerId.as_str());
    let mut form = GeneralForm::builder(advisory_profile())
        .mode(FormMode::Upsert)
        .params(FormData::new().with(F::CustomerId.as_str(), 42))
        .source(profiles.clone())
        .listener(LogListener("profile"))
        .build()?;
    let loaded = form.mount().await?;
    info!(?loaded, "no profile yet");

    form.change(F::Horizon.as_str(), "long")?;
    form.change(F::RiskLevel.as_str(), 6)?;
    let outcome = form.submit().await;
    info!(?outcome, "too much risk for a beginner");

    form.change(F::Experience.as_str(), "advanced")?;
    form.change(F::Esg.as_str(), true)?;
    form.change(
        F::EsgPreferences.as_str(),
        vec![form_engine::FieldValue::from("environment")],
    )?;
    let outcome = form.submit().await;
    info!(saved = outcome.is_saved(), stored = ?profiles.record(42), "profile created");

    // The second save goes through update; with nothing modified it is skipped.
    let outcome = form.submit().await;
    if let SubmitOutcome::Unchanged(response) = &outcome {
        info!(message = %response.message, "nothing to save");
    }

    form.change(F::Notes.as_str(), "Preferisce ETF a basso costo.")?;
    let outcome = form.submit().await;
    info!(saved = outcome.is_saved(), updates = profiles.update_calls(), "profile updated");

    println!("{}", to_html(&form.view(), &HtmlOptions::new()));
    form.unmount();
    Ok(())
}
