use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::open_site;

pub fn make_subcommand() -> Command {
    Command::new("show")
        .about("Render one document to HTML")
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .help("Logical document path, e.g. `setup` or `guides/deploy` (empty for the index)")
                .default_value(""),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the page (html, metadata, toc, neighbours) as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("toc")
                .long("toc")
                .help("Print the table of contents before the body")
                .action(ArgAction::SetTrue),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let path = args.get_one::<String>("path").map(String::as_str).unwrap_or_default();
    let site = open_site(args)?;

    let Some(page) = site.document(path) else {
        bail!("document not found: {path:?}");
    };

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    eprintln!("{}", page.title);
    if args.get_flag("toc") {
        println!("{}", page.document.toc);
    }
    println!("{}", page.document.html);

    if let Some(prev) = &page.prev {
        eprintln!("prev: {} (/{})", prev.title, prev.path);
    }
    if let Some(next) = &page.next {
        eprintln!("next: {} (/{})", next.title, next.path);
    }

    Ok(())
}
