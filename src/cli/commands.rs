//! `ingest` and `config` subcommands

use super::output::Output;
use crate::system::{IngestSummary, RagSystem};
use crate::utils::toml_config::AppConfig;
use std::path::Path;

/// Print the effective configuration, or just confirm it is valid
pub fn show_config(
    config: &AppConfig,
    path: &Path,
    validate_only: bool,
    output: &Output,
) -> anyhow::Result<()> {
    config.validate()?;

    if validate_only {
        output.success(&format!("{} is valid", path.display()));
        return Ok(());
    }

    output.header("Configuration");
    output.kv("File", &path.display().to_string());
    output.kv("Listen", &config.bind_address());
    output.kv("Model", &config.llm.model);
    output.kv(
        "API key",
        if config.resolve_env(&config.llm.api_key_env).is_some() {
            "set"
        } else {
            "missing"
        },
    );
    output.kv("Docs", &config.rag.docs_path);

    output.subheader("Effective settings");
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Load a folder of course files and report what was added
pub async fn ingest(
    system: &RagSystem,
    path: &Path,
    clear: bool,
    output: &Output,
) -> anyhow::Result<IngestSummary> {
    if !path.is_dir() {
        output.warning(&format!("{} is not a directory", path.display()));
    }
    if clear {
        output.info("Clearing existing course data");
    }

    let summary = system.add_course_folder(path, clear).await?;
    output.success(&format!(
        "Loaded {} new course(s) with {} chunk(s)",
        summary.courses, summary.chunks
    ));

    let stats = system.course_analytics().await?;
    output.subheader(&format!("{} course(s) in store", stats.total_courses));
    for title in &stats.course_titles {
        output.list_item(title);
    }

    Ok(summary)
}
