use std::io;
use std::path::{Path, PathBuf};

use toml;

use error::Error;
use interpreter::{BacktraceStyle, Dialect};
use utils::read;

/// Per-crate settings loaded from an optional `Diagnose.toml` next to the
/// crate's `Cargo.toml`. Command line switches take precedence over these.
#[derive(Debug, Default)]
pub struct Config {
    config_path: Option< PathBuf >,

    pub message_format: Option< Dialect >,
    pub backtrace: Option< BacktraceStyle >
}

impl Config {
    pub fn source( &self ) -> String {
        if let Some( ref path ) = self.config_path {
            format!( "{:?}", path )
        } else {
            "Diagnose.toml".into()
        }
    }
}

pub enum Warning {
    UnknownKey( String )
}

impl Config {
    pub fn load_from_file< P >( path: P ) -> Result< Option< (Self, Vec< Warning >) >, Error > where P: AsRef< Path > {
        let path = path.as_ref();

        let mut config = Config::default();
        config.config_path = Some( path.into() );

        let config_toml = match read( path ) {
            Ok( config ) => config,
            Err( error ) => {
                if error.kind() == io::ErrorKind::NotFound {
                    return Ok( None );
                } else {
                    return Err( Error::CannotLoadFile( path.into(), error ) );
                }
            }
        };

        debug!( "Loading {:?}...", path );

        let raw: toml::Value = toml::from_str( config_toml.as_str() )
            .map_err( |error| Error::ConfigurationError( format!( "cannot parse {}: {}", config.source(), error ) ) )?;

        let mut warnings = Vec::new();
        match raw {
            toml::Value::Table( table ) => {
                for (key, value) in table {
                    match key.as_str() {
                        "message-format" => {
                            let value: String = value.try_into()
                                .map_err( |_| format!( "{}: 'message-format' is not a string", config.source() ) )?;
                            let dialect = value.parse()
                                .map_err( |error| format!( "{}: {}", config.source(), error ) )?;
                            config.message_format = Some( dialect );
                        },
                        "backtrace" => {
                            let value: String = value.try_into()
                                .map_err( |_| format!( "{}: 'backtrace' is not a string", config.source() ) )?;
                            let style = value.parse()
                                .map_err( |error| format!( "{}: {}", config.source(), error ) )?;
                            config.backtrace = Some( style );
                        },
                        _ => {
                            warnings.push( Warning::UnknownKey( key.into() ) );
                        }
                    }
                }
            },
            _ => return Err( Error::ConfigurationError( format!( "{} is not a table", config.source() ) ) )
        }

        Ok( Some( (config, warnings) ) )
    }

    pub fn load_for_crate< P >( crate_root: P ) -> Result< Option< (Self, Vec< Warning >) >, Error > where P: AsRef< Path > {
        Config::load_from_file( crate_root.as_ref().join( "Diagnose.toml" ) )
    }

    pub fn load_for_crate_printing_warnings< P >( crate_root: P ) -> Result< Option< Self >, Error > where P: AsRef< Path > {
        let (config, warnings) = match Config::load_for_crate( crate_root )? {
            Some( (config, warnings) ) => (config, warnings),
            None => return Ok( None )
        };

        for warning in warnings {
            match warning {
                Warning::UnknownKey( key ) => {
                    println_err!( "warning: unknown key in {}: {}", config.source(), key );
                }
            }
        }

        Ok( Some( config ) )
    }
}
