use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use serde_json;

#[derive(Debug)]
pub enum Error {
    ConfigurationError( String ),
    CargoFailed( String ),
    BuildFailed,
    InvalidJson( serde_json::Error ),
    CannotLoadFile( PathBuf, io::Error ),
    Other( Box< dyn error::Error > )
}

impl error::Error for Error {}

impl From< serde_json::Error > for Error {
    fn from( err: serde_json::Error ) -> Self {
        Error::InvalidJson( err )
    }
}

impl From< Box< dyn error::Error > > for Error {
    fn from( err: Box< dyn error::Error > ) -> Self {
        Error::Other( err )
    }
}

impl From< String > for Error {
    fn from( err: String ) -> Self {
        Error::Other( err.into() )
    }
}

impl< 'a > From< &'a str > for Error {
    fn from( err: &'a str ) -> Self {
        Error::Other( err.into() )
    }
}

impl fmt::Display for Error {
    fn fmt( &self, fmt: &mut fmt::Formatter ) -> fmt::Result {
        match *self {
            Error::ConfigurationError( ref message ) => write!( fmt, "{}", message ),
            Error::CargoFailed( ref message ) => write!( fmt, "{}", message ),
            Error::BuildFailed => write!( fmt, "build failed" ),
            Error::InvalidJson( ref inner ) => write!( fmt, "cannot parse the compiler's JSON output: {}", inner ),
            Error::CannotLoadFile( ref path, ref inner ) => write!( fmt, "cannot load file {:?}: {}", path, inner ),
            Error::Other( ref inner ) => write!( fmt, "{}", inner ),
        }
    }
}
