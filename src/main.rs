use clap::Parser;
use knixfs::cli_interface::{execute, KnixCli};
/// a CLI interface to users to create a KnixFS image,
/// or to work with the files stored in one.
///
/// Every subcommand opens the image, runs one operation
/// and persists the result before exiting.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = KnixCli::parse();
    let stdout = std::io::stdout();
    execute(&args, &mut stdout.lock())
}
