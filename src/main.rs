use clap::{CommandFactory, FromArgMatches};
use log::info;
use took::Timer;

use crate::cli::ProgramArguments;
use crate::converter::RunContext;

mod cli;
mod converter;
mod io;
mod problem;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )?;
    let args = ProgramArguments::from_arg_matches(
        &ProgramArguments::command().get_matches_from(args),
    )?;
    info!("{:?}", &args);

    let inputs = args.input_directories()?;

    let run_timer = Timer::new();
    let mut run = RunContext::create(args.output.as_str(), args.on_error)?;

    let mut total = 0;
    for (tag, dir) in &inputs {
        let dir_timer = Timer::new();
        let converted = run.convert_dir(dir, tag)?;
        info!(
            "converted {} instances from {} [{}] after {}",
            converted,
            dir.display(),
            tag,
            dir_timer.took()
        );
        total += converted;
    }

    run.finish()?;
    info!("finished {} conversions after {}", total, run_timer.took());
    Ok(())
}
