use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::build::build;
use crate::config::Config;
use crate::init::init;
use crate::serve::serve;

mod build;
mod config;
mod init;
mod js;
mod log;
mod manifest;
mod report;
mod serve;
mod wasm;

/// Build, bundle and serve Tally apps
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print additional information while running
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Never color the output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the tally crate in the current directory
    #[command(visible_alias = "b")]
    Build(Build),

    /// Create a new tally crate in an existing directory
    Init(Init),

    /// Build, start a local development server and rebuild on changes
    #[command(visible_alias = "s")]
    Serve(Serve),
}

#[derive(Debug, Args)]
pub struct Build {
    /// Build with optimizations
    #[arg(short, long)]
    pub release: bool,

    /// Output directory, overrides `package.metadata.tally.dist`
    #[arg(long)]
    pub dist: Option<PathBuf>,

    /// Bundle name without extension, overrides `package.metadata.tally.filename`
    #[arg(long)]
    pub filename: Option<String>,

    /// Embed a script in index.html that reloads the page after rebuilds
    #[arg(long, value_enum, default_value_t = When::Auto)]
    pub autoreload: When,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum When {
    /// Only for debug builds
    Auto,
    Always,
    Never,
}

#[derive(Debug, Args)]
pub struct Init {
    /// Directory of the new crate, defaults to the current directory
    pub path: Option<PathBuf>,

    /// Package name, defaults to the directory name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct Serve {
    #[command(flatten)]
    pub build: Build,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Don't rebuild when sources change
    #[arg(long)]
    pub no_watch: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        log::enable_verbose_output();
    }

    if !cli.no_color && io::stderr().is_terminal() {
        log::enable_color_output();
    }

    let res = match &cli.command {
        Command::Build(b) => Config::load(b).and_then(|config| build(&config, 0)),
        Command::Init(i) => init(i),
        Command::Serve(s) => serve(s),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        use clap::CommandFactory;

        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags() {
        let cli = Cli::parse_from([
            "tally",
            "serve",
            "--release",
            "--port=8080",
            "--dist=public",
            "--autoreload=always",
        ]);

        let Command::Serve(s) = cli.command else {
            panic!("expected serve command");
        };

        assert!(s.build.release);
        assert_eq!(s.port, 8080);
        assert_eq!(s.build.dist, Some(PathBuf::from("public")));
        assert_eq!(s.build.autoreload, When::Always);
        assert!(!s.no_watch);
    }

    #[test]
    fn build_defaults() {
        let cli = Cli::parse_from(["tally", "b"]);

        let Command::Build(b) = cli.command else {
            panic!("expected build command");
        };

        assert!(!b.release);
        assert_eq!(b.dist, None);
        assert_eq!(b.filename, None);
        assert_eq!(b.autoreload, When::Auto);
    }
}
