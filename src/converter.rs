use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, warn};
use serde::Serialize;

use crate::cli::OnErrorPolicy;
use crate::io;
use crate::io::json_writer;
use crate::problem::tdcarp::build_instance;

#[derive(Debug, Serialize)]
pub struct IndexEntry {
    pub file_name: String,
    pub instance_name: String,
    pub tags: Vec<String>,
}

/// Run-scoped state of one conversion run: owns the output directory and the
/// index accumulator. `create` clears the output directory, `finish` flushes
/// the index; in between, every successfully converted instance adds one
/// index entry.
pub struct RunContext {
    output_dir: PathBuf,
    on_error: OnErrorPolicy,
    index: Vec<IndexEntry>,
}

impl RunContext {
    pub fn create(output_dir: impl Into<PathBuf>, on_error: OnErrorPolicy) -> anyhow::Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        for entry in fs::read_dir(&output_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())
                    .with_context(|| format!("clearing {}", entry.path().display()))?;
            }
        }
        Ok(Self {
            output_dir,
            on_error,
            index: vec![],
        })
    }

    /// Converts every file in `dir`, tagging the index entries with `tag` and
    /// prefixing the output file names with `<tag>_`. Returns the number of
    /// converted instances.
    pub fn convert_dir(&mut self, dir: impl AsRef<Path>, tag: &str) -> anyhow::Result<usize> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("reading input directory {}", dir.display()))?
            .filter_map(|it| it.ok())
            .filter(|it| it.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|it| it.path())
            .collect();
        // read_dir order is platform-dependent
        files.sort();

        let mut converted = 0;
        for input in &files {
            match self.convert_file(input, tag) {
                Ok(instance_name) => {
                    debug!("converted {} as {}", input.display(), instance_name);
                    converted += 1;
                }
                Err(err) => match self.on_error {
                    OnErrorPolicy::Abort => return Err(err),
                    OnErrorPolicy::Skip => warn!("skipping {}: {:#}", input.display(), err),
                },
            }
        }
        Ok(converted)
    }

    pub fn convert_file(&mut self, input: &Path, tag: &str) -> anyhow::Result<String> {
        let stem = input
            .file_stem()
            .and_then(|it| it.to_str())
            .with_context(|| format!("invalid instance file name {}", input.display()))?;
        let output_name = format!("{}_{}.json", tag, stem);

        let parsed = io::load_instance(input)?;
        let document = build_instance(parsed)
            .with_context(|| format!("converting instance file {}", input.display()))?;
        let instance_name =
            json_writer::write_instance_document(&self.output_dir.join(&output_name), &document)?;

        self.index.push(IndexEntry {
            file_name: output_name,
            instance_name: instance_name.clone(),
            tags: vec![tag.to_string()],
        });
        Ok(instance_name)
    }

    /// Flushes `index.json` into the output directory.
    pub fn finish(self) -> anyhow::Result<()> {
        json_writer::write_index(&self.output_dir.join("index.json"), &self.index)
    }
}
