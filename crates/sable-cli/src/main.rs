//! Sable command-line compiler.
//!
//! Compiles a stylesheet to css on stdout or into an output file,
//! optionally writing a source map next to it.

use anyhow::{bail, Context};
use clap::Parser;
use sable_bridge::{render_sync, OutputStyle, RenderError, RenderOptions, RenderResult};
use std::io::{Read, Write};
use std::path::PathBuf;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Parser)]
#[command(name = "sable")]
#[command(about = "Compile Sable stylesheets to css", long_about = None)]
#[command(version)]
struct Cli {
    /// Input file, or "-" to read from stdin
    input: String,

    /// Write css to this file instead of stdout
    #[arg(short, long)]
    out_file: Option<PathBuf>,

    /// Output style: nested, expanded, compact, or compressed
    #[arg(short, long, default_value = "nested")]
    style: String,

    /// Treat the input as indented syntax
    #[arg(long)]
    indented: bool,

    /// Emit source position comments before every rule
    #[arg(long)]
    line_comments: bool,

    /// Add a directory to the import search path (repeatable)
    #[arg(short = 'I', long = "include-path")]
    include_paths: Vec<String>,

    /// Decimal places kept on numeric values
    #[arg(long, default_value_t = 5)]
    precision: i32,

    /// Write a source map to this file
    #[arg(long)]
    source_map: Option<PathBuf>,

    /// Inline the source map into the css instead
    #[arg(long)]
    embed_source_map: bool,

    /// Omit the sourceMappingURL comment
    #[arg(long)]
    omit_map_comment: bool,
}

fn parse_style(name: &str) -> anyhow::Result<OutputStyle> {
    match name {
        "nested" => Ok(OutputStyle::Nested),
        "expanded" => Ok(OutputStyle::Expanded),
        "compact" => Ok(OutputStyle::Compact),
        "compressed" => Ok(OutputStyle::Compressed),
        other => bail!("unknown output style \"{other}\""),
    }
}

fn build_options(cli: &Cli) -> anyhow::Result<RenderOptions> {
    let mut options = RenderOptions {
        style: parse_style(&cli.style)?,
        indented_syntax: cli.indented,
        comments: cli.line_comments,
        include_paths: cli.include_paths.clone(),
        precision: cli.precision,
        out_file: cli
            .out_file
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        source_map: cli
            .source_map
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        source_map_embed: cli.embed_source_map,
        omit_source_map_url: cli.omit_map_comment,
        ..Default::default()
    };

    if cli.input == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        options.data = Some(source);
    } else {
        options.file = Some(cli.input.clone());
    }
    Ok(options)
}

fn report_compile_error(err: &RenderError) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "error");
    let _ = stderr.reset();
    let _ = writeln!(stderr, ": {err}");
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let options = build_options(&cli)?;
    let mut result = RenderResult::default();

    if let Err(err) = render_sync(options, &mut result) {
        report_compile_error(&err);
        return Ok(1);
    }

    let css = result.css.unwrap_or_default();
    match &cli.out_file {
        Some(path) => std::fs::write(path, css)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{css}"),
    }

    if let (Some(path), Some(map)) = (&cli.source_map, &result.source_map) {
        std::fs::write(path, map)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(0)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let code = run(cli)?;
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_names() {
        assert_eq!(parse_style("nested").unwrap(), OutputStyle::Nested);
        assert_eq!(parse_style("compressed").unwrap(), OutputStyle::Compressed);
        assert!(parse_style("shiny").is_err());
    }
}
