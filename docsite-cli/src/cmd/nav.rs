use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::open_site;

pub fn make_subcommand() -> Command {
    Command::new("nav")
        .about("Print the navigation built from the docs directory")
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print entries as JSON")
                .action(ArgAction::SetTrue),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let site = open_site(args)?;
    let navigation = site.navigation();

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&navigation)?);
        return Ok(());
    }

    if navigation.is_empty() {
        eprintln!("No documents found in {}", site.config().snapshot().directories.docs.display());
        return Ok(());
    }

    for entry in &navigation {
        println!("{:>5}  {:<40}  /{}", entry.order, entry.title, entry.path);
    }

    Ok(())
}
