use clap::Parser;
use wgsim::ui::{run, WgsimArgs};

pub fn main() -> anyhow::Result<()> {
    let argv = WgsimArgs::parse();
    run(argv)
}
