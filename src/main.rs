use city_search::core::search::LimitPolicy;
use city_search::core::{CityStore, LoadSummary};
use city_search::server::{self, handlers::AppState, ServerLimits};
use city_search::utils::{logger, validation::Validate};
use city_search::{CityError, CliConfig, Command, LoadEngine, MemoryStore, SearchService, ServerConfig};
use clap::Parser;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.command.options().resolve() {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    // 初始化日誌
    logger::init_logger(config.log_format, config.verbose);
    tracing::info!("Starting city-search {}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Effective config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(e);
    }

    let runtime = match server::build_runtime(config.workers) {
        Ok(runtime) => runtime,
        Err(e) => fail(e),
    };
    tracing::info!("Runtime started with {} workers", config.workers);

    match runtime.block_on(run(cli.command, config)) {
        Ok(Some(summary)) => print_summary(&summary),
        Ok(None) => tracing::info!("👋 Server stopped"),
        Err(e) => {
            tracing::error!("❌ city-search failed: {}", e);
            fail(e);
        }
    }

    Ok(())
}

async fn run(command: Command, config: ServerConfig) -> city_search::Result<Option<LoadSummary>> {
    let store: Arc<dyn CityStore> = Arc::new(MemoryStore::new());
    let engine = LoadEngine::new_with_monitoring(config.data_source(), store.clone(), config.monitor);

    match command {
        Command::Load(_) => engine.run().await.map(Some),
        Command::Serve(_) => {
            let summary = engine.run().await?;
            let listener = server::bind(config.socket_addr()?).await?;

            let search = SearchService::new(store, config.data_file.clone(), summary.loaded_at);
            let state = AppState::new(search, LimitPolicy::from_config(&config));
            let app = server::router(state, ServerLimits::from_config(&config));

            server::serve(listener, app, server::shutdown_signal()).await?;
            Ok(None)
        }
    }
}

fn print_summary(summary: &LoadSummary) {
    println!("✅ Loaded {} cities from {}", summary.loaded, summary.source);
    println!("   Format: {}", summary.format);
    println!("   Skipped records: {}", summary.skipped);
    println!("   Distinct cities: {}", summary.distinct_cities);
    println!("   Distinct names: {}", summary.distinct_names);
    println!("   Total keys: {}", summary.total_keys);
    println!("   Elapsed: {:?}", summary.elapsed);
}

fn fail(e: CityError) -> ! {
    eprintln!("❌ {}", e);
    std::process::exit(e.exit_code());
}
