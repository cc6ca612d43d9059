//! Load the built-in ISO 27001 → NIST CSF catalogue into the configured
//! database. `--with-sample-risk` also records one example risk and prints
//! it as read back through the mapping view.

use risk_register::{config, middleware, models::RiskCreate, services::builtin_catalogue, AppState};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Settings::new()?;
    middleware::init_logging(&config.log_level, &config.log_format)?;

    let with_sample_risk = std::env::args().any(|arg| arg == "--with-sample-risk");

    let app_state = AppState::new(&config).await?;

    let applied = app_state
        .mapping_service
        .load_catalogue(&builtin_catalogue())
        .await?;
    println!("Seeded ISO→NIST mappings: {}", applied);

    if with_sample_risk {
        let risk = app_state
            .risk_service
            .create_risk(RiskCreate {
                asset: Some("Customer Database".to_string()),
                threat: Some("Data Breach (hacker)".to_string()),
                vulnerability: Some("Unpatched SQL server".to_string()),
                likelihood: Some(json!(4)),
                impact: Some(json!(4)),
                treatment: Some("mitigate".to_string()),
                owner: Some("IT Security".to_string()),
                status: Some("open".to_string()),
                iso_control: Some("A.9.2.3".to_string()),
                due_date: Some("2025-11-01".to_string()),
            })
            .await?;
        println!("Inserted risk id: {}", risk.risk.id);
        println!("{}", serde_json::to_string_pretty(&risk)?);
    }

    app_state.db_pool.close().await;
    Ok(())
}
