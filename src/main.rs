mod app;
mod config;
mod input;
mod logging;
mod model;
mod render;
mod session;
mod sim;
mod storage;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = config::Args::parse();
    logging::init(args.log.as_deref(), args.verbose)?;
    app::run(args)
}
