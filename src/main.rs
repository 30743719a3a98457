extern crate cargo_diagnose;
extern crate env_logger;
extern crate structopt;

use std::env;
use std::process::exit;

use cargo_diagnose::SubCmds;
use structopt::StructOpt;

fn main() {
    if let Ok( value ) = env::var( "CARGO_DIAGNOSE_LOG" ) {
        let mut builder = env_logger::Builder::new();
        builder.parse( &value );
        builder.init();
    }

    // When run as `cargo diagnose` the subcommand name is passed
    // through as the first argument; get rid of it.
    let args = env::args().enumerate().filter_map( |(nth, arg)| {
        if nth == 1 && arg == "diagnose" {
            None
        } else {
            Some( arg )
        }
    });

    if let Err( error ) = SubCmds::from_iter( args ).run() {
        eprintln!( "error: {}", error );
        exit( 101 );
    }
}
