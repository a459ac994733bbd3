//! Assembles cool source text into a program image that runcool can load.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use coolcpu::assembler::assemble;

#[derive(Debug, Parser)]
#[clap(name = "coolasm", version, about = "Assemble cool source into a program image")]
struct Cli {
    /// Assembly source
    source: PathBuf,

    /// Where to write the image [default: SOURCE with a .coolexe extension]
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.source)
        .with_context(|| format!("cannot read {}", cli.source.display()))?;
    let image = assemble(&source).with_context(|| format!("{}", cli.source.display()))?;

    let output = cli
        .output
        .unwrap_or_else(|| cli.source.with_extension("coolexe"));
    let file = File::create(&output)
        .with_context(|| format!("cannot create {}", output.display()))?;
    common::image::write_image(BufWriter::new(file), &image)
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(())
}
