use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(version)]
pub struct ProgramArguments {
    #[arg(
        short,
        long = "input",
        value_name = "TAG=DIR",
        required = true,
        help = "input directory and its index tag, e.g. H=input/Type_H (repeatable)"
    )]
    pub inputs: Vec<String>,

    #[arg(short, long, help = "output directory (cleared at startup)")]
    pub output: String,

    #[arg(
        long,
        value_enum,
        default_value = "abort",
        help = "what to do when a single instance fails to convert"
    )]
    pub on_error: OnErrorPolicy,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
pub enum OnErrorPolicy {
    Abort,
    Skip,
}

impl ProgramArguments {
    pub fn input_directories(&self) -> anyhow::Result<Vec<(String, PathBuf)>> {
        self.inputs
            .iter()
            .map(|it| {
                let (tag, dir) = it
                    .split_once('=')
                    .with_context(|| format!("expected TAG=DIR, got `{}`", it))?;
                Ok((tag.to_string(), PathBuf::from(dir)))
            })
            .collect()
    }
}
