#![deny(
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

#[macro_use]
extern crate structopt;
extern crate clap;

#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate serde_json;

#[macro_use]
extern crate lazy_static;
extern crate regex;

#[macro_use]
extern crate log;

extern crate ansi_term;
extern crate atty;
extern crate cargo_metadata;
extern crate rustc_demangle;
extern crate toml;

#[macro_use]
mod utils;
pub mod interpreter;

mod cmd_build;
mod config;
pub mod error;
mod project;

pub use error::Error;

use interpreter::{BacktraceStyle, Dialect};

#[derive(Debug, StructOpt)]
#[structopt(name = "cargo-diagnose")]
#[structopt(rename_all = "kebab-case")]
pub enum SubCmds {
    /// Compile the package and interpret the compiler's diagnostics
    Build {
        #[structopt(flatten)]
        args: BuildArgs,
    },
    /// Typecheck the package and interpret the compiler's diagnostics
    Check {
        #[structopt(flatten)]
        args: BuildArgs,
    },
    /// Run the package's tests and interpret the diagnostics and panics
    Test {
        #[structopt(flatten)]
        args: BuildArgs,
    },
}

impl SubCmds {
    pub fn run( self ) -> Result< (), Error > {
        match self {
            SubCmds::Build { args } => cmd_build::command_build( cmd_build::BuildKind::Build, &args ),
            SubCmds::Check { args } => cmd_build::command_build( cmd_build::BuildKind::Check, &args ),
            SubCmds::Test { args } => cmd_build::command_build( cmd_build::BuildKind::Test, &args ),
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(rename_all = "kebab-case")]
pub struct BuildArgs {
    /// Package to build
    #[structopt(short = "p", long)]
    package: Option< String >,
    /// Additional features to build
    #[structopt(long, group = "build_features")]
    features: Vec< String >,
    /// Build all available features
    #[structopt(long, group = "build_features")]
    all_features: bool,
    /// Do not build the `default` feature
    #[structopt(long, group = "build_features")]
    no_default_features: bool,
    /// Build artifacts in release mode, with optimizations
    #[structopt(long)]
    release: bool,
    /// The diagnostic output format to interpret [values: human, json]
    #[structopt(long)]
    message_format: Option< Dialect >,
    /// How much of panic backtraces is shown [values: off, compact, full]
    #[structopt(long)]
    backtrace: Option< BacktraceStyle >,
    /// Use verbose cargo output
    #[structopt(short = "v", long)]
    verbose: bool,
}
