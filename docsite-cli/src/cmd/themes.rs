use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use docsite_core::ResolvedTheme;

use crate::config::load_config;

pub fn make_subcommand() -> Command {
    Command::new("themes")
        .about("List available themes")
        .arg(
            Arg::new("css")
                .long("css")
                .help("Print the active palette as CSS custom properties")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("use")
                .long("use")
                .value_name("NAME")
                .help("Switch to NAME before printing"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;

    if let Some(name) = args.get_one::<String>("use")
        && !config.switch_theme(name)
    {
        bail!("unknown theme: {name}");
    }

    let snapshot = config.snapshot();

    if args.get_flag("css") {
        match &snapshot.theme {
            ResolvedTheme::Palette(theme) => print!("{}", theme.css_variables()),
            ResolvedTheme::Variants(variants) => println!("{}", serde_json::to_string_pretty(variants)?),
        }
        return Ok(());
    }

    for (name, info) in config.available_themes() {
        let marker = if name == snapshot.active_theme_name { "*" } else { " " };
        println!("{marker} {name:<16} {}  ({})", info.description, info.author);
    }

    Ok(())
}
