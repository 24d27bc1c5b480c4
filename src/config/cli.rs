use crate::domain::model::JobRequest;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "isin-retry")]
#[command(about = "Retry ISIN validation and exports for a page of patients")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "isin.toml")]
    pub config: String,

    /// Number of patients in the processed page
    #[arg(long)]
    pub count: Option<usize>,

    /// Offset of the processed page
    #[arg(long)]
    pub offset: Option<usize>,

    /// Override validation of patients without ISIN id
    #[arg(long)]
    pub validate: Option<bool>,

    /// Override export of confirmed contact information
    #[arg(long)]
    pub export_info: Option<bool>,

    /// Override export of vaccinations
    #[arg(long)]
    pub export_vaccinations: Option<bool>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log process resource usage")]
    pub monitor: bool,

    /// Show the effective job without contacting ISIN
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// Applies command line overrides on top of the configured job.
    pub fn apply_to(&self, mut request: JobRequest) -> JobRequest {
        if let Some(count) = self.count {
            request.patients_count = count;
        }
        if let Some(offset) = self.offset {
            request.patients_offset = offset;
        }
        if let Some(validate) = self.validate {
            request.validate_patients = validate;
        }
        if let Some(export_info) = self.export_info {
            request.export_patients_info = export_info;
        }
        if let Some(export_vaccinations) = self.export_vaccinations {
            request.export_vaccinations = export_vaccinations;
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_given_flags() {
        let cli = CliConfig::parse_from([
            "isin-retry",
            "--count",
            "10",
            "--export-info",
            "false",
        ]);
        let base = JobRequest {
            patients_count: 100,
            patients_offset: 200,
            validate_patients: true,
            export_patients_info: true,
            export_vaccinations: false,
        };

        let request = cli.apply_to(base);
        assert_eq!(request.patients_count, 10);
        assert_eq!(request.patients_offset, 200);
        assert!(request.validate_patients);
        assert!(!request.export_patients_info);
        assert!(!request.export_vaccinations);
        assert_eq!(cli.config, "isin.toml");
    }

    #[test]
    fn test_zero_count_override_fails_validation() {
        use crate::utils::validation::Validate;

        let cli = CliConfig::parse_from(["isin-retry", "--count", "0"]);
        let base = JobRequest {
            patients_count: 100,
            patients_offset: 0,
            validate_patients: true,
            export_patients_info: true,
            export_vaccinations: true,
        };

        assert!(base.validate().is_ok());
        assert!(cli.apply_to(base).validate().is_err());
    }
}
