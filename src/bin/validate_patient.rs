use clap::Parser;
use isin_retry::utils::{logger, validation::Validate};
use isin_retry::{AppConfig, IsinClient, PatientValidationService};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "validate-patient")]
#[command(about = "Look up a single patient in ISIN")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "isin.toml")]
    config: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// Personal number, with or without the slash
    #[arg(long)]
    personal_number: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = match AppConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let client = Arc::new(IsinClient::new(&config.isin)?);
    let service = PatientValidationService::new(client)?;
    let result = service
        .validate_patient(&args.first_name, &args.last_name, &args.personal_number)
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
