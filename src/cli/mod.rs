// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code.
//!
//! Only 3 things should be public in this module: `Gridless`, `Gridless::run`,
//! and `GridlessError`.

#[macro_use]
mod common;
mod args;
mod error;
mod params;
#[cfg(test)]
mod tests;

pub use error::GridlessError;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::{AppSettings, Args, Parser};
use log::info;

use crate::PROGRESS_BARS;
use args::GridlessArgs;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    name = "gridless",
    version,
    author,
    about = r#"Gridless imaging of all-sky radio interferometer snapshots.
The visible hemisphere is divided into HEALPix pixels and every visibility is
summed directly onto every pixel."#
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(infer_long_args = true)]
pub struct Gridless {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(flatten)]
    args: GridlessArgs,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Don't draw progress bars.
    #[clap(long)]
    no_progress_bars: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run.
    #[clap(long)]
    save_toml: Option<PathBuf>,
}

impl Gridless {
    pub fn run(self) -> Result<(), GridlessError> {
        let GlobalArgs {
            no_progress_bars,
            verbosity,
            dry_run,
            save_toml,
        } = self.global_opts;
        setup_logging(verbosity).expect("Failed to initialise logging.");
        // Enable progress bars if the user didn't say "no progress bars".
        if !no_progress_bars {
            PROGRESS_BARS.store(true);
        }

        info!("gridless {}", env!("CARGO_PKG_VERSION"));
        display_build_info();

        let args = self.args.merge()?;
        if let Some(toml) = save_toml {
            let mut f = BufWriter::new(File::create(toml)?);
            f.write_all(toml::to_string(&args)?.as_bytes())?;
            f.flush()?;
        }
        args.parse()?.run(dry_run)?;

        info!("gridless complete.");
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

/// Write many info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => {
            info!("Compiled on git commit hash: {hash}{dirty}");
        }
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {hr}");
    }
    info!("            {BUILT_TIME_UTC}");
    info!("         with compiler {RUSTC_VERSION}");
    info!("");
}
