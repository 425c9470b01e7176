pub mod args;
pub mod polltab;

use crate::args::Args;
use crate::polltab::run_poll;
use crate::polltab::PolltabResult;

use clap::Parser;

use env_logger::Env;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

fn main() -> PolltabResult<()> {
    let args = Args::parse();
    let env = Env::new().default_filter_or({
        if args.verbose {
            "debug"
        } else {
            "info"
        }
    });
    let _ = env_logger::try_init_from_env(env);

    log::debug!("this is polltab version {}", VERSION.unwrap_or("unknown"));

    run_poll(&args)
}
