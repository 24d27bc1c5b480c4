use clap::Parser;
use isin_retry::core::retry_job::JobRun;
use isin_retry::utils::error::ErrorSeverity;
use isin_retry::utils::monitor::JobMonitor;
use isin_retry::utils::{logger, validation::Validate};
use isin_retry::{
    AppConfig, CliConfig, IsinClient, IsinError, IsinRetryJob, JobRequest, JsonPatientStore,
    LocalStorage,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting isin-retry");
    tracing::info!("Loading configuration from: {}", cli.config);

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "ISIN retry failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: &CliConfig) -> Result<(), IsinError> {
    let config = AppConfig::from_file(&cli.config)?;
    config.validate()?;
    tracing::debug!("ISIN settings: {:?}", config.isin);

    let request = cli.apply_to(config.job_request());
    request.validate()?;
    display_job_summary(&config, &request);

    if cli.dry_run {
        println!("🔍 Dry run, ISIN was not contacted.");
        return Ok(());
    }

    let monitor = JobMonitor::new(cli.monitor);
    if monitor.is_enabled() {
        tracing::info!("Resource monitoring enabled");
    }

    let storage = LocalStorage::new(&config.store.path);
    let store = JsonPatientStore::load(storage, config.store_file()).await?;
    let client = Arc::new(IsinClient::new(&config.isin)?);
    let job = IsinRetryJob::new(store, client)?;
    monitor.log_phase("setup");

    let JobRun {
        stats,
        patients_processed,
    } = job.run_page(&request).await?;
    monitor.log_summary(patients_processed);

    println!("{}", serde_json::to_string_pretty(&stats)?);
    if stats.errors() > 0 {
        tracing::warn!("{} steps failed and will be retried by the next run", stats.errors());
    }
    Ok(())
}

fn display_job_summary(config: &AppConfig, request: &JobRequest) {
    println!("📋 ISIN retry job:");
    println!("  ISIN: {}", config.isin.root_url);
    println!("  Store: {}/{}", config.store.path, config.store_file());
    println!(
        "  Page: {} patients from offset {}",
        request.patients_count, request.patients_offset
    );
    println!("  Validate patients: {}", request.validate_patients);
    println!("  Export contact info: {}", request.export_patients_info);
    println!("  Export vaccinations: {}", request.export_vaccinations);
    println!();
}
