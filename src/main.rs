use clap::Parser;
use keg_report::utils::error::{EtlError, ErrorSeverity};
use keg_report::utils::{logger, validation::Validate};
use keg_report::{CliConfig, EtlEngine, InventoryPipeline, LocalStorage};

fn exit_code(e: &EtlError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(stage: &str, e: &EtlError) {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Sugerencia: {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting keg-report CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.report_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            report_failure("Configuration", &e);
            std::process::exit(1);
        }
    };

    if cli.dry_run {
        println!("🔎 Fuente: {}", config.source_label());
        println!("📁 Salida: {}", config.output.output_path);
        println!("📋 Título: {}", config.output.title);
        for view in &config.views {
            println!(
                "  · {} [{}] por {}",
                view.name,
                view.statuses.join(", "),
                view.group_by.label()
            );
        }
        return Ok(());
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output.output_path.clone());
    let pipeline = InventoryPipeline::new(storage, config)?;
    let engine = EtlEngine::new_with_monitoring(pipeline, cli.monitor);

    match engine.run().await {
        Ok(summary) => {
            for line in &summary.lines {
                println!("{}", line);
            }
            tracing::info!("✅ Report completed");
            println!("📁 Dashboard: {}", summary.output_path);
        }
        Err(e) => {
            report_failure("Report", &e);
            let code = exit_code(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
