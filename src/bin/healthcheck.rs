use city_search::probe::{check_health, DEFAULT_HEALTH_URL};
use clap::Parser;
use std::time::Duration;

/// 容器 HEALTHCHECK 用的健康探針
#[derive(Parser)]
#[command(name = "healthcheck")]
#[command(about = "Probe the city-search health endpoint")]
struct Args {
    /// Health endpoint URL
    #[arg(short, long, env = "CITY_SEARCH_HEALTH_URL", default_value = DEFAULT_HEALTH_URL)]
    url: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "3")]
    timeout: u64,

    /// Only report failures
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match check_health(&args.url, Duration::from_secs(args.timeout)).await {
        Ok(report) => {
            if !args.quiet {
                println!(
                    "✅ {} ({} cities, loaded at {})",
                    report.status, report.total_cities, report.loaded_at
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
