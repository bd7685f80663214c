use clap::Parser;
use create_boot_app::utils::cancel::handle_interrupts;
use create_boot_app::utils::{logger, validation::Validate};
use create_boot_app::{
    CancellationToken, CliConfig, LocalDirFetcher, ProjectRequest, Result, ScaffoldConfig,
    ScaffoldEngine, ScaffoldError, ScaffoldReport, TemplateFetcher, TemplateKind, TemplateLayout,
};
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = match CliConfig::try_parse() {
        Ok(config) => config,
        Err(e) => {
            // --help / --version 不算錯誤
            let _ = e.print();
            if !e.use_stderr() {
                std::process::exit(0);
            }
            let usage = ScaffoldError::Usage {
                message: e.to_string(),
            };
            std::process::exit(usage.exit_code());
        }
    };

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    match run(&config).await {
        Ok(report) => print_success(&config, &report),
        Err(e) => {
            // 終端機只顯示一次，詳細分類留在 debug 日誌
            tracing::debug!("{} (Category: {:?})", e, e.category());
            eprintln!("{}", failure_message(&e));
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(config: &CliConfig) -> Result<ScaffoldReport> {
    config.validate()?;

    let file_config = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            ScaffoldConfig::from_file(path)?
        }
        None => ScaffoldConfig::default(),
    };
    file_config.validate()?;

    let layout = file_config.layout()?;
    let request = ProjectRequest::new(&config.project_name, &config.package, config.template_type)?;
    let timeout = config
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| file_config.fetch_timeout());
    let cwd = std::env::current_dir().map_err(ScaffoldError::io_at("."))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if handle_interrupts(tokio::signal::ctrl_c, on_interrupt).await {
            std::process::exit(1);
        }
    });

    match &config.template_dir {
        Some(dir) => {
            let fetcher = LocalDirFetcher::new(dir);
            scaffold(fetcher, layout, &request, timeout, cancel, &cwd).await
        }
        None => {
            let fetcher = file_config.remote_fetcher()?;
            scaffold(fetcher, layout, &request, timeout, cancel, &cwd).await
        }
    }
}

async fn scaffold<F: TemplateFetcher>(
    fetcher: F,
    layout: TemplateLayout,
    request: &ProjectRequest,
    timeout: Duration,
    cancel: CancellationToken,
    cwd: &Path,
) -> Result<ScaffoldReport> {
    ScaffoldEngine::new(fetcher, layout)
        .with_fetch_timeout(Some(timeout))
        .with_cancellation(cancel)
        .run(request, cwd)
        .await
}

fn print_success(config: &CliConfig, report: &ScaffoldReport) {
    tracing::info!("✅ Project created successfully!");
    println!("✅ Created {} at {}", config.project_name, report.root.display());
    println!(
        "   package {}, {} files rewritten, {} source roots moved",
        config.package,
        report.rewrite.files_modified,
        report.remap.remapped.len()
    );
    for kept in &report.remap.retained {
        println!("⚠️  {} was kept because it still contains other files", kept.display());
    }
    println!();
    println!("Next steps:");
    println!("  cd {}", config.project_name);
    match config.template_type {
        TemplateKind::Gradle => println!("  ./gradlew bootRun"),
        TemplateKind::Maven => println!("  ./mvnw spring-boot:run"),
    }
}

fn failure_message(e: &ScaffoldError) -> String {
    format!("❌ {}\n💡 {}", e.user_friendly_message(), e.recovery_suggestion())
}
