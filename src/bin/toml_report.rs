use anyhow::Context;
use clap::Parser;
use vacancy_report::core::ConfigProvider;
use vacancy_report::render::template::HtmlTemplate;
use vacancy_report::utils::error::ErrorSeverity;
use vacancy_report::utils::{logger, validation::Validate};
use vacancy_report::{EtlEngine, LocalStorage, ReportPipeline, TomlConfig, WkHtmlToPdf};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Vacancy report with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "report-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the profession keyword from config
    #[arg(long)]
    profession: Option<String>,

    /// Show what would be processed without touching the working directory
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based vacancy report");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 套用命令列覆蓋設定
    if let Some(profession) = args.profession.clone() {
        tracing::info!("🔧 Profession overridden to: {}", profession);
        config.report.profession = profession;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    let storage = LocalStorage::new(config.work_dir());
    let converter = WkHtmlToPdf::new(config.pdf_tool());
    let pipeline = ReportPipeline::new(storage, config, converter);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            println!("✅ Report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
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

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Profession: {}", config.profession());
    println!("  Working dir: {} (wiped on every run)", config.work_dir());
    println!("  Workers: {}", config.worker_count());
    println!("  PDF tool: {}", config.pdf_tool());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    let input = std::path::Path::new(config.input_path());
    match std::fs::metadata(input) {
        Ok(meta) => println!("  📄 Input found: {} bytes", meta.len()),
        Err(e) => println!("  ⚠️ Input not readable: {}", e),
    }

    let table = config.currency_table();
    println!(
        "  💱 Currencies ({}): {}",
        table.len(),
        table.codes().collect::<Vec<_>>().join(", ")
    );

    let template = match config.template_path() {
        Some(path) => HtmlTemplate::from_file(path)
            .with_context(|| format!("Failed to read template '{}'", path))?,
        None => HtmlTemplate::builtin()?,
    };
    println!("  🧩 Template slots: {}", template.slots().join(", "));

    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
