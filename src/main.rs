use clap::{Parser, Subcommand};
use novelty_migrator::api::ApiClient;
use novelty_migrator::audit::AuditSummary;
use novelty_migrator::auth::{decode_claims, TokenManager};
use novelty_migrator::config::Config;
use novelty_migrator::error::Result;
use novelty_migrator::pipeline::BatchProcessor;
use novelty_migrator::types::IncidentRecord;
use novelty_migrator::{logging, report};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Parser)]
#[command(name = "novelty_migrator")]
#[command(about = "Migrates tabular incident records into the case-management API")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the batch migration against the configured API
    Migrate {
        /// JSON file with the ordered incident records to submit
        #[arg(long, default_value = "assets/records.json")]
        input: String,
        /// Directory for the two-part audit report
        #[arg(long, default_value = "audit")]
        report_dir: String,
    },
    /// Decode and inspect a bearer token without contacting the network
    ValidateToken {
        /// The raw JWT to inspect
        token: String,
    },
    /// Exercise the token lifecycle against the identity endpoint
    CheckAuth,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { input, report_dir } => {
            let config = Config::load("config.toml")?;
            run_migration(&config, &input, &report_dir).await?;
        }
        Commands::ValidateToken { token } => {
            validate_token(&token);
        }
        Commands::CheckAuth => {
            let config = Config::load("config.toml")?;
            check_auth(&config).await?;
        }
    }
    Ok(())
}

async fn run_migration(config: &Config, input: &str, report_dir: &str) -> anyhow::Result<()> {
    let records = load_records(Path::new(input))?;
    println!("🚀 Starting migration of {} records...", records.len());

    let api = ApiClient::new(config);
    let mut processor = BatchProcessor::new(api, config.business.clone());
    let result = processor.run(&records).await?;

    if result.halted {
        println!("⚠️  Batch halted early after a business rejection");
    }
    print_summary(&result.summary);

    let paths = report::write_report(&result.summary, Path::new(report_dir))?;
    println!("📄 Audit report written: {}", paths.detail.display());
    println!("📄 Summary written: {}", paths.summary.display());
    Ok(())
}

/// Input collaborator: reads the ordered flat-record file and assigns 1-based
/// row indices. Spreadsheet conversion happens upstream of this tool.
fn load_records(path: &Path) -> Result<Vec<IncidentRecord>> {
    let raw = fs::read_to_string(path)?;
    let mut records: Vec<IncidentRecord> = serde_json::from_str(&raw)?;
    for (i, record) in records.iter_mut().enumerate() {
        record.row_index = i + 1;
    }
    info!(records = records.len(), input = %path.display(), "records loaded");
    Ok(records)
}

fn print_summary(summary: &AuditSummary) {
    println!("\n📊 Final summary:");
    println!("   Total records: {}", summary.total_records);
    println!("   ✅ Successful: {}", summary.successful);
    println!("   ❌ Failed: {}", summary.failed);
    println!("   👤 Persons not found: {}", summary.person_not_found);
    println!("   📈 Success rate: {:.2}%", summary.success_rate() * 100.0);
}

fn validate_token(token: &str) {
    let Some(claims) = decode_claims(token) else {
        println!("❌ Token could not be decoded");
        return;
    };

    println!("📋 JWT claims:");
    println!("   Subject: {}", claims.sub.as_deref().unwrap_or("not specified"));
    if let Some(iat) = claims.iat {
        println!("   Issued at: {}", format_epoch_secs(iat));
    }
    match claims.exp {
        Some(exp) => {
            println!("   Expires at: {}", format_epoch_secs(exp));
            let remaining_secs = exp - chrono::Utc::now().timestamp();
            if remaining_secs > 0 {
                println!(
                    "   Status: ✅ valid ({} minutes remaining)",
                    remaining_secs / 60
                );
            } else {
                println!(
                    "   Status: ❌ expired ({} minutes ago)",
                    remaining_secs.abs() / 60
                );
            }
        }
        None => println!("   Expires at: not specified"),
    }
}

async fn check_auth(config: &Config) -> anyhow::Result<()> {
    let mut auth = TokenManager::new(config.auth.clone());

    println!("🔑 Requesting initial token...");
    let first = auth.get_token().await?;
    println!("   Token obtained: {}...", &first[..first.len().min(20)]);

    let second = auth.get_token().await?;
    println!("   Cache hit on second request: {}", first == second);

    let info = auth.token_info();
    if let Some(expires_at) = info.expires_at {
        println!("   Expires at: {}", expires_at);
    }
    if let Some(refresh_at) = info.refresh_at {
        println!("   Will refresh at: {}", refresh_at);
    }

    println!("🗑️  Clearing token cache...");
    auth.clear_token();
    let third = auth.get_token().await?;
    println!("   Fresh token after clear: {}", first != third);
    println!("🎉 Token lifecycle checks completed");
    Ok(())
}

fn format_epoch_secs(secs: i64) -> String {
    use chrono::TimeZone;
    chrono::Utc
        .timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.to_string())
        .unwrap_or_else(|| format!("epoch {}", secs))
}
