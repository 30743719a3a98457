macro_rules! println_err {
    ($($args:tt)*) => {{
        use std::io::Write;
        let stderr = ::std::io::stderr();
        let mut stderr = stderr.lock();
        let _ = writeln!( stderr, $($args)* );
    }}
}

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub fn read< P: AsRef< Path > >( path: P ) -> Result< String, io::Error > {
    let mut fp = File::open( path.as_ref() )?;
    let mut output = String::new();
    fp.read_to_string( &mut output )?;
    Ok( output )
}
