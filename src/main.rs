use clap::Parser;
use table_trans::utils::logger;
use table_trans::{CliConfig, DisplayPipeline, LocalStorage, TableEngine, TableJobConfig};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting table-trans");
    tracing::debug!("CLI config: {:?}", cli);

    // 載入畫面設定並驗證
    let config = match TableJobConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    // 輸入與輸出路徑皆相對於目前目錄
    let storage = LocalStorage::new(".".to_string());
    let pipeline = DisplayPipeline::new(storage, config);
    let engine = TableEngine::new(pipeline);

    match engine.run() {
        Ok(output_path) => {
            tracing::info!("✅ Table written to: {}", output_path);
            println!("✅ Table written to: {}", output_path);
        }
        Err(e) => {
            tracing::error!("❌ Table transform failed: {}", e);
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
