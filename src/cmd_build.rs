use std::env;
use std::process::Command;

use atty;

use config::Config;
use error::Error;
use interpreter::{formatter, BacktraceStyle, Dialect, Interpreter};
use project::CargoProject;
use BuildArgs;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BuildKind {
    Build,
    Check,
    Test
}

impl BuildKind {
    fn as_command( self ) -> &'static str {
        match self {
            BuildKind::Build => "build",
            BuildKind::Check => "check",
            BuildKind::Test => "test"
        }
    }
}

pub fn command_build( kind: BuildKind, args: &BuildArgs ) -> Result< (), Error > {
    let project = CargoProject::new( None )?;
    let package = project.package( args.package.as_ref().map( |name| name.as_str() ) )?;
    let config = Config::load_for_crate_printing_warnings( &package.crate_root )?.unwrap_or_default();

    let dialect = args.message_format
        .or( config.message_format )
        .unwrap_or( Dialect::HumanReadable );
    let backtrace = args.backtrace
        .or( config.backtrace )
        .unwrap_or( BacktraceStyle::Compact );

    let mut command = Command::new( "cargo" );
    command.arg( kind.as_command() );
    command.arg( "--package" ).arg( package.name.as_str() );

    if args.release {
        command.arg( "--release" );
    }

    if args.no_default_features {
        command.arg( "--no-default-features" );
    }

    if args.all_features {
        command.arg( "--all-features" );
    }

    if !args.features.is_empty() {
        command.arg( "--features" );
        command.arg( &args.features.join( " " ) );
    }

    if args.verbose {
        command.arg( "--verbose" );
    }

    if dialect == Dialect::Json {
        command.arg( "--message-format" ).arg( "json" );
    }

    if backtrace != BacktraceStyle::Off {
        command.env( "RUST_BACKTRACE", "1" );
    }

    command.current_dir( &package.crate_root );
    debug!( "Launching {:?}...", command );

    let output = command.output().map_err( |error| {
        Error::CargoFailed( format!( "cannot launch cargo: {}", error ) )
    })?;

    // Human readable diagnostics arrive on stderr, the JSON stream on
    // stdout, runtime panics on either; the interpreter sorts it all out.
    let mut text = String::from_utf8_lossy( &output.stdout ).into_owned();
    text.push_str( &String::from_utf8_lossy( &output.stderr ) );

    let mut interpreter = Interpreter::new( dialect, &package.crate_root );
    interpreter.backtrace = backtrace;
    interpreter.entry_path = package.entry_path();
    interpreter.rust_src_path = env::var( "RUST_SRC_PATH" ).ok();

    let interpretation = interpreter.interpret( &text )?;

    let use_color = atty::is( atty::Stream::Stderr );
    formatter::print( use_color, &interpretation );

    if !output.status.success() {
        return Err( Error::BuildFailed );
    }

    Ok(())
}
