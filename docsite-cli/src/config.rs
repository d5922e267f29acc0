use anyhow::{Result, bail};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use docsite_core::config::DEFAULT_CONFIG_PATH;
use docsite_core::{ConfigHandle, Site};
use std::path::{Path, PathBuf};

/// Arguments shared by every subcommand.
pub fn add_global_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (YAML or TOML)")
                .default_value(DEFAULT_CONFIG_PATH)
                .global(true),
        )
        .arg(
            Arg::new("docs")
                .short('d')
                .long("docs")
                .value_name("DIR")
                .help("Documentation directory, overriding directories.docs")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log progress at info level")
                .action(ArgAction::SetTrue)
                .global(true),
        )
}

/// Load configuration with cascading precedence:
/// 1. CLI arguments (highest priority)
/// 2. Configuration file
/// 3. Defaults (lowest priority)
///
/// A missing default config file is fine; a missing file the user named is
/// an error.
pub fn load_config(args: &ArgMatches) -> Result<ConfigHandle> {
    let config_file = args
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if args.value_source("config") == Some(ValueSource::CommandLine) && !config_file.exists() {
        bail!("config file not found: {}", config_file.display());
    }

    let handle = ConfigHandle::open(&config_file);

    if let Some(docs) = args.get_one::<String>("docs") {
        let docs = Path::new(docs).to_path_buf();
        handle.update(|config| config.directories.docs = docs.clone());
    }

    Ok(handle)
}

pub fn open_site(args: &ArgMatches) -> Result<Site> {
    Ok(Site::new(load_config(args)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn matches(argv: &[&str]) -> ArgMatches {
        add_global_args(Command::new("test")).try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = matches(&["test"]);
        assert_eq!(
            args.get_one::<String>("config").map(String::as_str),
            Some(DEFAULT_CONFIG_PATH)
        );
        assert!(!args.get_flag("verbose"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let args = matches(&["test", "--config", "/nonexistent/site.yaml"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_cli_args_override() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("site.yaml");
        std::fs::write(&config, "site_name: Handbook\ndirectories:\n  docs: from-file\n").unwrap();

        let args = matches(&["test", "--config", config.to_str().unwrap(), "--docs", "/custom/docs"]);
        let handle = load_config(&args).unwrap();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.site_name, "Handbook");
        assert_eq!(snapshot.directories.docs, Path::new("/custom/docs"));
        assert_eq!(handle.get("directories.docs", String::new()), "/custom/docs");
    }
}
