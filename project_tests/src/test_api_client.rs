//! # Live `ApiClient` Smoke Test
//!
//! Runs a full create, edit, delete round trip for one teacher against a running
//! EduData backend. Nothing is mocked: this is the check to run after deploying
//! a backend or changing the transport.
//!
//! ## Environment:
//! - `EDUDATA_BASE_URL` (or `edudata.json`): the API base, e.g. `http://localhost:8081/api`.
//! - `EDUDATA_USERNAME` / `EDUDATA_PASSWORD`: optional; a guest session is used otherwise.
//!
//! The session lives in memory only and never touches the operator's session file.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use std::env;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, ensure, Result};

use lib_edudata::loggers::{init_tracing, ConsoleNotifier, LogFormat};
use lib_edudata::resources::{DeleteOutcome, DocenteField, FixedAnswer, SubmitOutcome};
use lib_edudata::session::{LoginRedirect, Session, StoredCredentials};
use lib_edudata::{ApiClient, ClientConfig, DocenteController, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::Pretty, "info");

    // 1. Resolve configuration and build an isolated session
    let config = ClientConfig::load(None)?;
    println!("--- Starting API Client Smoke Test ---\n{}", config);

    let store = MemoryStore::new();
    let redirect = Arc::new(LoginRedirect::new());
    let client = ApiClient::new(
        &config,
        Arc::new(StoredCredentials::new(store.clone())),
        redirect.clone(),
    )?;
    let session = Session::new(client.clone(), store.clone());

    // --- TEST 1: Authentication ---
    println!("\n[Test 1] Authenticating...");
    let profile = match (env::var("EDUDATA_USERNAME"), env::var("EDUDATA_PASSWORD")) {
        (Ok(user), Ok(pass)) => session.login(&user, &pass).await?,
        _ => session.login_as_guest().await?,
    };
    ensure!(session.validate().await?, "fresh token was rejected");
    println!("✅ Logged in as {}", profile);

    // --- TEST 2: Load ---
    println!("\n[Test 2] Loading the collection...");
    let mut docentes: DocenteController = DocenteController::new(
        client,
        Arc::new(ConsoleNotifier::new(false)),
        Arc::new(FixedAnswer(true)),
    );
    docentes.load().await?;
    let before = docentes.collection().len();
    println!("✅ {} teachers on the server", before);

    // --- TEST 3: Create ---
    println!("\n[Test 3] Creating a probe record...");
    let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let identificacion = format!("{:010}", stamp % 10_000_000_000);
    docentes.toggle_form();
    docentes.update_field(DocenteField::Identificacion, &identificacion);
    docentes.update_field(DocenteField::Nombre, "Sonda Smoke Test");
    docentes.update_field(DocenteField::Email, "smoke@edudata.local");
    docentes.update_field(DocenteField::Especialidad, "Diagnóstico");
    ensure!(docentes.submit().await? == SubmitOutcome::Created);
    let created = docentes
        .collection()
        .iter()
        .find(|d| d.identificacion == identificacion)
        .cloned()
        .ok_or_else(|| anyhow!("created record missing from the reloaded list"))?;
    let id = created.id.clone().ok_or_else(|| anyhow!("server did not assign an id"))?;
    println!("✅ Created id {}", id);

    // --- TEST 4: Edit ---
    println!("\n[Test 4] Editing the probe record...");
    docentes.begin_edit(&created);
    docentes.update_field(DocenteField::Especialidad, "Diagnóstico (editado)");
    ensure!(docentes.submit().await? == SubmitOutcome::Updated);
    let edited = docentes
        .find(&id)
        .ok_or_else(|| anyhow!("edited record missing from the reloaded list"))?;
    ensure!(edited.especialidad == "Diagnóstico (editado)");
    println!("✅ Edited");

    // --- TEST 5: Filter ---
    docentes.set_filter(identificacion.clone());
    ensure!(docentes.filtered().len() == 1, "filter by identification");
    docentes.clear_filter();

    // --- TEST 6: Delete ---
    println!("\n[Test 6] Deleting the probe record...");
    ensure!(docentes.delete(&id).await? == DeleteOutcome::Deleted);
    ensure!(docentes.find(&id).is_none());
    ensure!(docentes.collection().len() == before);
    println!("✅ Deleted");

    session.logout()?;
    ensure!(redirect.redirect_count() == 0, "session expired during the run");
    println!("\n--- All Tests Passed Successfully ---");
    Ok(())
}
