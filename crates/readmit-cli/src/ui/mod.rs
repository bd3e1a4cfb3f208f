//! `readmit ui` and `readmit predict`: a thin front end over the inference API.

pub mod client;
pub mod input;
pub mod page;

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use tokio::net::TcpListener;

use readmit_classifiers::inference::PatientRecord;

use crate::ui::client::PredictClient;
use crate::ui::input::UiConfig;
use crate::ui::page::{describe_score, render_page, FormValues, Outcome};
use crate::util::{build_socket_addr, shutdown_signal};

pub struct UiState {
    pub client: PredictClient,
}

pub fn create_router(state: Arc<UiState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(render_page(&FormValues::default(), None).into_string())
}

/// Every failure ends up as a message on the page, never as an error status.
async fn submit(State(state): State<Arc<UiState>>, Form(form): Form<FormValues>) -> Html<String> {
    let outcome = match form.to_record() {
        Ok(record) => match state.client.predict(&record).await {
            Ok(score) => {
                log::info!("Scored {:?}: {:.3}", record, score);
                Outcome::Score(score)
            }
            Err(e) => {
                log::warn!("Prediction request failed: {}", e);
                Outcome::Error(e.to_string())
            }
        },
        Err(message) => Outcome::Error(message),
    };
    Html(render_page(&form, Some(&outcome)).into_string())
}

pub async fn run(config: &UiConfig) -> anyhow::Result<()> {
    let client = PredictClient::new(&config.api_url, config.timeout())?;
    log::info!("Forwarding predictions to {}", client.predict_url());

    let addr = build_socket_addr(&config.host, config.port)?;
    let listener = TcpListener::bind(addr).await?;
    log::info!("Starting form UI on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(Arc::new(UiState { client })))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Form UI shutdown complete");
    Ok(())
}

/// Score one record through the API and print it the way the form shows it.
pub async fn run_predict(config: &UiConfig, record: PatientRecord) -> anyhow::Result<f64> {
    record.validate()?;
    let client = PredictClient::new(&config.api_url, config.timeout())?;
    let score = client.predict(&record).await?;
    let (shown, band) = describe_score(score);
    println!("Readmission risk score: {} ({})", shown, band.label());
    Ok(score)
}
