//! `mdk minify`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use mdk_core::{MinifierLevel, PackContext, PackOptions, PackPipeline, Project};
use tracing::debug;

/// Minify one file without trimming or namespace flattening
pub async fn minify_command(
    file: PathBuf,
    level: MinifierLevel,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    debug!("Minifying {} at level {}", file.display(), level);
    let source = fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Script.cs".to_string());

    let options = PackOptions {
        minify: level,
        flatten_namespaces: false,
        readme: false,
        ..PackOptions::default()
    };
    let project = Project::from_sources(
        name.clone(),
        [(name.as_str(), source.as_str())],
        &options.symbols,
    );
    let root = file.parent().map(Path::to_path_buf).unwrap_or_default();
    let context = PackContext::new(name.as_str(), root, options);

    let script = tokio::task::spawn_blocking(move || {
        PackPipeline::default_for(&context)?.build_script(&project, &context)
    })
    .await
    .context("minify task panicked")??;

    match output {
        Some(path) => fs::write(&path, &script)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{script}"),
    }
    Ok(())
}
