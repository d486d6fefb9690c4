use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::converter::IndexEntry;
use crate::problem::tdcarp::InstanceDocument;

/// Writes the document as pretty-printed JSON and returns the instance name
/// for index bookkeeping.
pub fn write_instance_document(path: &Path, document: &InstanceDocument) -> anyhow::Result<String> {
    write_pretty_json(path, document)
        .with_context(|| format!("writing instance document {}", path.display()))?;
    Ok(document.instance_name.clone())
}

pub fn write_index(path: &Path, entries: &[IndexEntry]) -> anyhow::Result<()> {
    write_pretty_json(path, &entries).with_context(|| format!("writing index {}", path.display()))
}

/// Serializes into a temporary sibling file and renames it into place, so a
/// failed conversion never leaves a half-written document behind.
fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let f = File::create(&tmp)?;
        let mut file = BufWriter::new(&f);
        serde_json::to_writer_pretty(&mut file, value)?;
        file.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
