use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use docsite_core::Artifact;
use docsite_core::export::detect_engine;
use std::path::PathBuf;

use crate::config::open_site;

pub fn make_subcommand() -> Command {
    Command::new("export")
        .about("Export the documentation as Quarto markdown, a Quarto project, or PDF")
        .arg(
            Arg::new("format")
                .value_name("FORMAT")
                .help("What to produce")
                .value_parser(["qmd", "pdf", "project"])
                .required(true),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .value_name("PATH")
                .help("Export only this document (qmd and pdf)"),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("DIR")
                .help("Directory to write into")
                .default_value("."),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let format = args.get_one::<String>("format").map(String::as_str).unwrap_or("qmd");
    let path = args.get_one::<String>("path").map(String::as_str);
    let out = args
        .get_one::<String>("out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let site = open_site(args)?;

    let artifacts = match (format, path) {
        ("qmd", None) => vec![site.export_qmd_all()?],
        ("qmd", Some(path)) => vec![site.export_qmd_document(path)?],
        ("pdf", path) => {
            let site = site.with_engine(detect_engine());
            match path {
                Some(path) => vec![site.export_pdf_document(path)?],
                None => vec![site.export_pdf_all()?],
            }
        }
        ("project", _) => site.export_quarto_project()?,
        (other, _) => anyhow::bail!("unsupported export format: {other}"),
    };

    std::fs::create_dir_all(&out).with_context(|| format!("failed to create {}", out.display()))?;
    for artifact in &artifacts {
        write_artifact(&out, artifact)?;
    }

    Ok(())
}

fn write_artifact(out: &std::path::Path, artifact: &Artifact) -> Result<()> {
    let target = out.join(&artifact.filename);
    std::fs::write(&target, &artifact.bytes).with_context(|| format!("failed to write {}", target.display()))?;
    println!("{} ({}, {} bytes)", target.display(), artifact.mime_type, artifact.bytes.len());
    Ok(())
}
