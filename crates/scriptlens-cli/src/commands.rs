//! Subcommand implementations. Each returns a process exit code.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

use scriptlens_core::{
    load_criteria, select_criteria, write_report, AnalysisResult, RunSummary, Script,
};
use scriptlens_runtime::{
    Analyzer, LlmProvider, ProviderRegistry, RequestLog, RuntimeConfig, OPENAI_API_KEY_ENV,
};

use crate::args::{AnalyzeArgs, Command, CriteriaArgs};
use crate::exit_codes::{CONFIG_ERROR, NO_RESULT, SUCCESS};

pub async fn dispatch(cmd: Command) -> anyhow::Result<i32> {
    match cmd {
        Command::Analyze(args) => analyze(args).await,
        Command::Criteria(args) => criteria(args),
    }
}

fn criteria(args: CriteriaArgs) -> anyhow::Result<i32> {
    if !args.file.is_file() {
        eprintln!("Criteria file not found: {}", args.file.display());
        return Ok(CONFIG_ERROR);
    }

    let criteria = load_criteria(&args.file);
    if criteria.is_empty() {
        eprintln!("No criteria found in {}", args.file.display());
        return Ok(NO_RESULT);
    }

    for (i, criterion) in criteria.iter().enumerate() {
        println!("{}. {}", i + 1, criterion.title);
        if !criterion.description.is_empty() {
            println!("   {}", criterion.description);
        }
    }
    Ok(SUCCESS)
}

fn resolve_config(args: &AnalyzeArgs) -> anyhow::Result<RuntimeConfig> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RuntimeConfig::default(),
    }
    .apply_env();

    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(max_chars) = args.max_chars {
        config.max_chars = max_chars;
    }
    config.validate()?;
    Ok(config)
}

fn create_provider(base_url: Option<&str>) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let mut provider_config = serde_json::json!({});
    if let Some(url) = base_url {
        provider_config["base_url"] = serde_json::Value::String(url.to_string());
    }

    Ok(ProviderRegistry::with_defaults().build("openai", &provider_config)?)
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<i32> {
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            return Ok(CONFIG_ERROR);
        }
    };
    tracing::debug!(
        model = %config.model,
        mode = ?config.mode,
        max_chars = config.max_chars,
        "Configuration resolved"
    );

    let Some(script) = Script::load(&args.script) else {
        eprintln!("Script file not found: {}", args.script.display());
        return Ok(CONFIG_ERROR);
    };
    if !args.criteria.is_file() {
        eprintln!("Criteria file not found: {}", args.criteria.display());
        return Ok(CONFIG_ERROR);
    }

    let mut criteria = load_criteria(&args.criteria);
    if !args.only.is_empty() {
        criteria = select_criteria(&criteria, &args.only);
    }

    let stats = script.stats();
    println!(
        "Script: {} characters, {} words, {} lines",
        stats.chars, stats.words, stats.lines
    );
    println!("Criteria: {}", criteria.len());

    let provider = match create_provider(args.base_url.as_deref()) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("{:#}", e);
            eprintln!("Set {} in the environment or in a .env file.", OPENAI_API_KEY_ENV);
            return Ok(CONFIG_ERROR);
        }
    };

    let analyzer = Analyzer::builder().provider(provider).config(config).build()?;

    let Some(results) = analyzer.analyze(&script, &criteria).await else {
        eprintln!("No result: the script is empty or no criteria were selected.");
        return Ok(NO_RESULT);
    };

    print_results(&results);
    print_usage(analyzer.log());

    let source_name = args
        .script
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.script.display().to_string());
    if let Some(path) = write_report(&results, &source_name, &args.output_dir)? {
        println!("Report saved to {}", path.display());
    }

    if let Some(path) = &args.log_json {
        write_log(analyzer.log(), path)?;
        println!("Request log saved to {}", path.display());
    }

    Ok(SUCCESS)
}

fn print_results(results: &[AnalysisResult]) {
    println!();
    for (i, result) in results.iter().enumerate() {
        println!("{:>2}. [{}] {}", i + 1, result.class(), result.criterion.title);
        if !result.is_approved() {
            for line in result.verdict.lines().filter(|l| !l.trim().is_empty()) {
                println!("      {}", line.trim());
            }
        }
    }

    let summary = RunSummary::from_results(results);
    println!();
    println!(
        "Approved {}/{} ({:.0}%), needs attention {}: {}",
        summary.approved,
        summary.total,
        summary.score(),
        summary.needs_attention(),
        summary.rating()
    );
}

fn print_usage(log: &RequestLog) {
    let usage = log.usage();
    println!(
        "Requests: {} ({} evaluations, {} consolidations, {} errors), tokens: {} in / {} out / {} total",
        usage.requests,
        usage.evaluations,
        usage.consolidations,
        usage.errors,
        usage.tokens_in,
        usage.tokens_out,
        usage.tokens_total
    );
}

fn write_log(log: &RequestLog, path: &Path) -> anyhow::Result<()> {
    let json = log.to_json()?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
