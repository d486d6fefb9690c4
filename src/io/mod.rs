use std::path::Path;

use crate::problem::tdcarp::ParsedInstance;

pub mod json_writer;
pub mod tdcarp_reader;

pub fn load_instance(path: impl AsRef<Path>) -> anyhow::Result<ParsedInstance> {
    tdcarp_reader::load_instance(path)
}
