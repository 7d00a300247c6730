use std::process::ExitCode;

use comfyrun_comfyui::pipeline::ComfyUIPipeline;
use comfyrun_worker::config::RunConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comfyrun_worker=info,comfyrun_comfyui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!(error = %message, "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = RunConfig::from_env().map_err(|e| e.to_string())?;

    let workflow = tokio::fs::read_to_string(&config.workflow_path)
        .await
        .map_err(|e| format!("cannot read {}: {e}", config.workflow_path.display()))?;

    tracing::info!(
        api_url = %config.settings.api_url,
        workflow = %config.workflow_path.display(),
        format = config.settings.image.format.as_str(),
        timeout_minutes = config.settings.timeout_minutes,
        "Running workflow",
    );

    let pipeline = ComfyUIPipeline::connect(config.settings).map_err(|e| e.to_string())?;
    let records = pipeline.run(&workflow).await.map_err(|e| e.to_string())?;

    let failed = records.iter().filter(|r| !r.is_success()).count();
    tracing::info!(outputs = records.len(), failed, "Workflow finished");

    let json = serde_json::to_string_pretty(&records).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
