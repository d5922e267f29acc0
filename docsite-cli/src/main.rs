mod cmd;
mod config;

use anyhow::Result;
use clap::Command;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    config::add_global_args(
        Command::new("docsite")
            .about("Assemble and export markdown documentation")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true),
    )
    .subcommand(cmd::nav::make_subcommand())
    .subcommand(cmd::show::make_subcommand())
    .subcommand(cmd::themes::make_subcommand())
    .subcommand(cmd::export::make_subcommand())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    // --verbose enables INFO level, otherwise use RUST_LOG
    let filter = if matches.get_flag("verbose") {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match matches.subcommand() {
        Some(("nav", args)) => cmd::nav::execute(args),
        Some(("show", args)) => cmd::show::execute(args),
        Some(("themes", args)) => cmd::themes::execute(args),
        Some(("export", args)) => cmd::export::execute(args),
        _ => unreachable!("subcommand_required is set"),
    }
}
