use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use c64asm::{
    basic::{convert, BasicArgs},
    demos::{build, DemoArgs},
    instrumentation,
};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[clap(long, global = true)]
    #[clap(help = "Enable chrome tracing")]
    #[clap(long_help = "Enable chrome tracing which on program exit will generate
a json file to be opened with a chrome tracing compatible
viewer.")]
    trace: bool,
    #[clap(long, global = true, default_value = "warn")]
    #[clap(help = "Log level of the diagnostics printed to stderr")]
    log_level: Level,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[clap(about = "Build one of the bundled demo programs")]
    #[clap(aliases = &["d"])]
    Demo(DemoArgs),
    #[clap(about = "Tokenize a BASIC listing into a .prg file")]
    #[clap(aliases = &["b"])]
    Basic(BasicArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _trace_guard = if cli.trace {
        Some(instrumentation::trace())
    } else {
        instrumentation::log(cli.log_level);
        None
    };

    match &cli.command {
        Command::Demo(args) => build(args),
        Command::Basic(args) => convert(args),
    }
}
