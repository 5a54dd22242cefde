//! bookbind: bind a directory of chapters and a manifest into an EPUB 2 file.
//!
//! `bookbind [OPTIONS] <SOURCE>` writes `<SOURCE>.epub` next to the source
//! directory unless `--output` names another path.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use bind_core::config::{BinderConfig, ConfigError};
use bind_core::error::BindError;
use bind_epub::Binder;

#[derive(Parser)]
#[command(
    name = "bookbind",
    version,
    about = "Bind a manifest and its chapters into an EPUB file"
)]
struct Cli {
    /// Book source directory (contains manifest.yaml)
    source: Option<PathBuf>,

    /// Output file (default: <SOURCE>.epub next to the source directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (default: <config dir>/bookbind/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dump effective config as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bookbind").join("config.toml"))
}

/// Load the binder configuration. Failures are reported as warnings and
/// leave the defaults in place; a missing default file is not reported.
fn load_config(explicit: Option<&Path>) -> BinderConfig {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return BinderConfig::default(),
        },
    };

    match BinderConfig::load(&path) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            config
        }
        Err(ConfigError::Read { ref source, .. })
            if !required && source.kind() == std::io::ErrorKind::NotFound =>
        {
            BinderConfig::default()
        }
        Err(e) => {
            log::warn!("{}; using default configuration", e);
            BinderConfig::default()
        }
    }
}

fn dump_config(config: &BinderConfig) -> Result<()> {
    let s = toml::to_string_pretty(config).context("Error serializing config")?;
    println!("{}", s);
    Ok(())
}

fn run(source: PathBuf, output: Option<&Path>, config: BinderConfig) -> Result<PathBuf, BindError> {
    Binder::new(source, config).load_manifest()?.make_book(output)
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(cli.config.as_deref());

    if cli.dump_config {
        if let Err(e) = dump_config(&config) {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
        process::exit(0);
    }

    let Some(source) = cli.source else {
        let _ = Cli::command().print_help();
        println!();
        process::exit(0);
    };

    match run(source, cli.output.as_deref(), config) {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            eprintln!("{}", e.report());
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_options() {
        let cli = Cli::try_parse_from([
            "bookbind", "-vv", "-o", "out.epub", "-c", "cfg.toml", "mybook",
        ])
        .unwrap();
        assert_eq!(cli.source, Some(PathBuf::from("mybook")));
        assert_eq!(cli.output, Some(PathBuf::from("out.epub")));
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.dump_config);
    }

    #[test]
    fn test_cli_source_is_optional() {
        let cli = Cli::try_parse_from(["bookbind"]).unwrap();
        assert!(cli.source.is_none());
    }

    #[test]
    fn test_load_config_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "styles = \"/opt/styles\"\n[processors]\n\".RST\" = \"rst2html\"\n")
            .unwrap();
        let config = load_config(Some(path.as_path()));
        assert_eq!(config.styles, PathBuf::from("/opt/styles"));
        assert_eq!(config.processors.get("rst"), Some("rst2html"));
        assert_eq!(config.templates, BinderConfig::default().templates);
    }

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config(Some(dir.path().join("missing.toml").as_path())),
            BinderConfig::default()
        );

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "styles = [").unwrap();
        assert_eq!(load_config(Some(bad.as_path())), BinderConfig::default());
    }

    #[test]
    fn test_run_reports_error_code() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(dir.path().join("absent"), None, BinderConfig::default()).unwrap_err();
        assert!(err.report().starts_with("[Err 100] "));
    }
}
