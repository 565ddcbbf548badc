//! `mdk pack`

use std::path::{Path, PathBuf};

use anyhow::Context;
use mdk_core::{
    ConfigLoader, DryRunWriter, FileSystemWriter, MinifierLevel, PackConfig, PackContext,
    PackOptions, PackPipeline, ProjectLoader,
};
use tracing::{debug, error, info};

use crate::output::{self, PackSummary};

/// Command-line overrides shared by every packed project
#[derive(Debug, Clone, Default)]
pub struct PackArgs {
    pub output: Option<PathBuf>,
    pub minify: Option<MinifierLevel>,
    pub trim: bool,
    pub trim_members: bool,
    pub define: Vec<String>,
    pub macros: Vec<(String, String)>,
    pub dry_run: bool,
    pub config: Option<PathBuf>,
}

/// Pack every project concurrently; fails if any project fails
pub async fn pack_command(projects: Vec<PathBuf>, args: PackArgs) -> anyhow::Result<()> {
    debug!("Packing projects: {:?}", projects);

    let mut handles = Vec::with_capacity(projects.len());
    for root in projects {
        let args = args.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let result = pack_project(&root, &args);
            (root, result)
        });
        handles.push(handle);
    }

    let mut failed = 0usize;
    for handle in handles {
        let (root, result) = handle.await.context("pack task panicked")?;
        match result {
            Ok(summary) => output::print_pack_summary(&summary),
            Err(e) => {
                error!("Packing {} failed: {:#}", root.display(), e);
                output::print_pack_failure(&root, &e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} project(s) failed to pack");
    }
    Ok(())
}

fn pack_project(root: &Path, args: &PackArgs) -> anyhow::Result<PackSummary> {
    let options = resolve_options(root, args)?;
    let project = ProjectLoader::new(&options)?.load(root)?;
    let context = PackContext::for_project(&project, options);
    let pipeline = PackPipeline::default_for(&context)?;

    let outcome = if context.is_dry_run() {
        pipeline.run(&project, &context, &DryRunWriter::new())?
    } else {
        pipeline.run(&project, &context, &FileSystemWriter)?
    };
    info!("Packed {}", project.name());

    Ok(PackSummary {
        project: project.name().to_string(),
        level: context.minifier_level(),
        characters: outcome.script.chars().count(),
        artifacts: outcome.artifacts,
        dry_run: context.is_dry_run(),
    })
}

/// Command-line flags over the project's configuration file over defaults
fn resolve_options(root: &Path, args: &PackArgs) -> anyhow::Result<PackOptions> {
    let file_config = ConfigLoader::load(args.config.as_deref(), root)?;

    let output = match &args.output {
        Some(path) => Some(std::path::absolute(path).context("invalid output path")?),
        None => None,
    };
    let mut config = PackConfig {
        minify: args.minify,
        trim: args.trim.then_some(true),
        trim_members: args.trim_members.then_some(true),
        output,
        macros: (!args.macros.is_empty()).then(|| args.macros.iter().cloned().collect()),
        symbols: (!args.define.is_empty()).then(|| args.define.clone()),
        ..PackConfig::default()
    };
    config.merge_with(file_config);

    let mut options = PackOptions::from_config(config)?;
    options.dry_run = args.dry_run;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("mdk.toml"),
            "minify = \"lite\"\ntrim = true\nsymbols = [\"RELEASE\"]\n",
        )
        .unwrap();

        let args = PackArgs {
            minify: Some(MinifierLevel::Full),
            define: vec!["DEBUG".into()],
            ..PackArgs::default()
        };
        let options = resolve_options(dir.path(), &args).unwrap();
        assert_eq!(options.minify, MinifierLevel::Full);
        assert!(options.trim);
        assert!(options.symbols.is_defined("DEBUG"));
        assert!(options.symbols.is_defined("RELEASE"));
    }
}
