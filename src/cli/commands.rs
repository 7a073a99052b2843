//! Command dispatch: loads settings, wires services, renders results.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Generator};
use tracing::{debug, instrument};

use crate::application::services::OutlineOptions;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{forest_size, to_text};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;
use crate::util::path::with_stem_suffix;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Batch { dir, recursive }) => _batch(cli, dir.as_deref(), *recursive),
        Some(Commands::Rebuild { file, output }) => _rebuild(cli, file, output.as_deref()),
        Some(Commands::Export { file, output }) => _export(cli, file, output.as_deref()),
        Some(Commands::Import {
            file,
            bookmarks,
            output,
        }) => _import(cli, file, bookmarks, output.as_deref()),
        Some(Commands::Show { file, text }) => _show(cli, file, *text),
        Some(Commands::Config { command }) => _config(command),
        Some(Commands::Completion { shell }) => {
            print_completions(*shell, &mut Cli::command());
            Ok(())
        }
        None if cli.info => Ok(()),
        None => Err(CliError::Usage(
            "no command given, see `pdfmarks --help`".into(),
        )),
    }
}

fn print_completions<G: Generator>(gen: G, cmd: &mut clap::Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Directory whose `.pdfmarks.toml` applies to `file`.
fn document_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn current_dir() -> CliResult<PathBuf> {
    std::env::current_dir()
        .map_err(|e| InfraError::io("determine current directory", e).into())
}

/// Layered settings plus the command line overrides.
fn load_settings(cli: &Cli, local_dir: &Path) -> CliResult<Settings> {
    let mut settings = Settings::load(Some(local_dir))?;
    if cli.no_strip {
        settings.strip_titles = false;
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn container_for(cli: &Cli, local_dir: &Path) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(load_settings(cli, local_dir)?))
}

#[instrument(skip(cli))]
fn _batch(cli: &Cli, dir: Option<&Path>, recursive: bool) -> CliResult<()> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => load_settings(cli, &current_dir()?)?.input_dir,
    };
    let mut settings = load_settings(cli, &dir)?;
    if recursive {
        settings.recursive = true;
    }
    let container = ServiceContainer::new(settings);

    output::header(&format!("Batch: {}", dir.display()));
    let report = container.outline.batch(&dir, &container.settings)?;

    for done in &report.processed {
        output::success_detail(&format!(
            "{} -> {} ({} bookmarks)",
            done.input.display(),
            done.output.display(),
            done.bookmarks
        ));
    }
    for failure in &report.failed {
        output::failure(&format!("{}: {}", failure.input.display(), failure.error));
    }
    output::action(
        "Done",
        &format!(
            "{} processed, {} failed",
            report.processed.len(),
            report.failed.len()
        ),
    );

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::BatchFailed {
            failed: report.failed.len(),
        })
    }
}

#[instrument(skip(cli))]
fn _rebuild(cli: &Cli, file: &Path, out: Option<&Path>) -> CliResult<()> {
    let container = container_for(cli, document_dir(file))?;
    let target = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| with_stem_suffix(file, &container.settings.suffix));
    let opts = OutlineOptions::from(container.settings.as_ref());

    let report = container.outline.rebuild(file, &target, &opts)?;
    output::success(&format!(
        "{}: {} bookmarks, {} top level",
        report.output.display(),
        report.bookmarks,
        report.roots
    ));
    Ok(())
}

#[instrument(skip(cli))]
fn _export(cli: &Cli, file: &Path, out: Option<&Path>) -> CliResult<()> {
    let container = container_for(cli, document_dir(file))?;
    let opts = OutlineOptions::from(container.settings.as_ref());

    match out {
        Some(path) if path == Path::new("-") => {
            let text = container.outline.export_text(file, &opts)?;
            io::stdout()
                .write_all(text.as_bytes())
                .map_err(|e| InfraError::io("write bookmarks to stdout", e))?;
        }
        _ => {
            let target = out
                .map(Path::to_path_buf)
                .unwrap_or_else(|| file.with_extension("txt"));
            let count = container.outline.export(file, &target, &opts)?;
            output::action("Exported", &format!("{count} bookmarks to {}", target.display()));
        }
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _import(cli: &Cli, file: &Path, bookmarks: &Path, out: Option<&Path>) -> CliResult<()> {
    let container = container_for(cli, document_dir(file))?;
    let target = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| with_stem_suffix(file, &container.settings.suffix));

    let report = container.outline.import(file, bookmarks, &target)?;
    output::success(&format!(
        "{}: {} bookmarks from {}",
        report.output.display(),
        report.bookmarks,
        bookmarks.display()
    ));
    Ok(())
}

#[instrument(skip(cli))]
fn _show(cli: &Cli, file: &Path, text: bool) -> CliResult<()> {
    let container = container_for(cli, document_dir(file))?;
    let opts = OutlineOptions::from(container.settings.as_ref());

    let forest = container.outline.infer(file, &opts)?;
    if forest.is_empty() {
        output::warning(&format!("{} has no bookmarks", file.display()));
        return Ok(());
    }
    if text {
        print!("{}", to_text(&forest));
    } else {
        let name = file.display().to_string();
        output::info(&(name.as_str(), forest.as_slice()).to_tree_string());
        output::detail(&format!("{} bookmarks", forest_size(&forest)));
    }
    Ok(())
}

#[instrument]
fn _config(command: &ConfigCommands) -> CliResult<()> {
    let cwd = current_dir()?;
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(&cwd))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let local = local_config_path(&cwd);
            match global_config_path() {
                Some(global) => output::info(&format!(
                    "global: {}{}",
                    global.display(),
                    if global.exists() { "" } else { " (missing)" }
                )),
                None => output::warning("no config directory for this platform"),
            }
            output::info(&format!(
                "local:  {}{}",
                local.display(),
                if local.exists() { "" } else { " (missing)" }
            ));
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no config directory for this platform".into())
                })?
            } else {
                local_config_path(&cwd)
            };
            let fs = RealFileSystem;
            if fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            fs.write_atomic(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
    }
    Ok(())
}
