use std::path::{Path, PathBuf};

use regex::Regex;
use rustc_demangle::demangle;

use interpreter::{is_toolchain_source, resolve_toolchain_source, BacktraceStyle, Panic};

lazy_static! {
    // thread 'main' panicked at 'index out of bounds', src/lib.rs:42
    static ref PANIC_HEADER: Regex = Regex::new(
        r"(thread '.+' panicked at '.+'), ([^/][^:]+):(\d+)"
    ).unwrap();

    //    1:     0x55c3a4a8 - std::panicking::try::h2ba8f0cb2a18079c
    static ref FRAME_LINE: Regex = Regex::new(
        r"^(\s+\d+):\s+0x[a-f0-9]+ - (.+)$"
    ).unwrap();

    //                at src/main.rs:12
    static ref LINK_LINE: Regex = Regex::new(
        r"(at (.+):(\d+))$"
    ).unwrap();

    // The hash suffix of an already demangled symbol.
    static ref FRAME_HASH: Regex = Regex::new( r"::h[0-9a-f]+$" ).unwrap();
}

// Scans the lines following a panic header for a stack backtrace. The first
// frame which links back into the project provides the panic's real
// location. Returns the number of lines consumed.
fn parse_stack_trace( lines: &[ &str ], index: usize, style: BacktraceStyle, panic: &mut Panic ) -> usize {
    if !lines[ index ].starts_with( "stack backtrace:" ) {
        return 0;
    }

    let mut consumed = 1;
    let mut stack_lines = Vec::new();
    for line in &lines[ index + 1.. ] {
        if let Some( frame ) = FRAME_LINE.captures( line ) {
            match style {
                BacktraceStyle::Full => stack_lines.push( line.to_string() ),
                BacktraceStyle::Compact => {
                    let symbol = format!( "{:#}", demangle( &frame[ 2 ] ) );
                    let symbol = FRAME_HASH.replace( &symbol, "" );
                    stack_lines.push( format!( "{}:  {}", &frame[ 1 ], symbol ) );
                },
                BacktraceStyle::Off => {}
            }
        } else if let Some( link ) = LINK_LINE.captures( line ) {
            if panic.file.is_none() && !is_toolchain_source( &link[ 2 ] ) {
                // Found a link into our own source code.
                panic.file = Some( link[ 2 ].to_owned() );
                panic.line = link[ 3 ].parse().unwrap();
            }
            if style != BacktraceStyle::Off {
                // Less leading spaces.
                stack_lines.push( format!( "  {}", &link[ 1 ] ) );
            }
        } else {
            // The stack trace has ended.
            break;
        }
        consumed += 1;
    }

    if style != BacktraceStyle::Off {
        panic.stack = Some( stack_lines.join( "\n" ) );
    }
    consumed
}

/// Tries to parse a panic and its stack trace starting at `index`. The
/// panic's file is resolved to an absolute path against `working_directory`
/// whenever it points into the project itself. Returns the panic and the
/// number of lines consumed; the caller assigns the id and decides whether
/// the panic is reported.
pub fn try_parse_panic(
    lines: &[ &str ],
    index: usize,
    style: BacktraceStyle,
    working_directory: &Path,
    rust_src_path: Option< &str >
) -> Option< (Panic, usize) > {
    let header = match PANIC_HEADER.captures( lines[ index ] ) {
        Some( header ) => header,
        None => return None
    };

    let header_file = header[ 2 ].to_owned();
    let mut panic = Panic {
        id: String::new(),
        message: header[ 1 ].to_owned(),
        file: if is_toolchain_source( &header_file ) { None } else { Some( header_file.clone() ) },
        file_path: None,
        line: header[ 3 ].parse().unwrap(),
        stack: None,
        reported: false
    };

    let mut consumed = 1;
    if index + 1 < lines.len() {
        consumed += parse_stack_trace( lines, index + 1, style, &mut panic );
    }

    if let Some( ref file ) = panic.file {
        let path = Path::new( file );
        panic.file_path = Some( if path.is_absolute() {
            path.to_owned()
        } else {
            working_directory.join( path )
        });
    } else {
        // No frame pointed back into the project, so the toolchain's own
        // source reference is all we have.
        let resolved = resolve_toolchain_source( &header_file, rust_src_path );
        if resolved != header_file && Path::new( &resolved ).is_absolute() {
            panic.file_path = Some( PathBuf::from( &resolved ) );
        }
        panic.file = Some( resolved );
    }

    Some( (panic, consumed) )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse( output: &str, style: BacktraceStyle ) -> Option< (Panic, usize) > {
        let lines: Vec< &str > = output.lines().collect();
        try_parse_panic( &lines, 0, style, Path::new( "/project" ), None )
    }

    #[test]
    fn test_header_only() {
        let (panic, consumed) = parse(
            "thread 'main' panicked at 'index out of bounds', src/lib.rs:42\n",
            BacktraceStyle::Compact
        ).unwrap();
        assert_eq!( consumed, 1 );
        assert_eq!( panic.message, "thread 'main' panicked at 'index out of bounds'" );
        assert_eq!( panic.file, Some( "src/lib.rs".to_owned() ) );
        assert_eq!( panic.file_path, Some( PathBuf::from( "/project/src/lib.rs" ) ) );
        assert_eq!( panic.line, 42 );
        assert_eq!( panic.stack, None );
    }

    #[test]
    fn test_not_a_panic() {
        assert!( parse( "error: mismatched types\n", BacktraceStyle::Compact ).is_none() );
    }

    #[test]
    fn test_backtrace_resolves_the_first_project_frame() {
        let output = "\
thread 'main' panicked at 'kaboom', ../src/libcore/option.rs:335
stack backtrace:
   1:     0x55dcf11dcf33 - std::panicking::default_hook::h4c51cc2e8a6ca6c1
                at ../src/libstd/panicking.rs:211
   2:     0x55dcf11d4b3a - kaboom::main::h3210a9a87dcc5e2e
                at src/main.rs:5
   3:     0x55dcf11d4c07 - std::rt::lang_start::h994e46957eae7a68
not a stack line
";
        let (panic, consumed) = parse( output, BacktraceStyle::Full ).unwrap();
        assert_eq!( consumed, 7 );
        assert_eq!( panic.file, Some( "src/main.rs".to_owned() ) );
        assert_eq!( panic.line, 5 );
        assert_eq!( panic.file_path, Some( PathBuf::from( "/project/src/main.rs" ) ) );
        let stack = panic.stack.unwrap();
        assert!( stack.contains( "0x55dcf11dcf33" ) );
        assert!( stack.contains( "  at src/main.rs:5" ) );
    }

    #[test]
    fn test_compact_backtrace_strips_addresses_and_hashes() {
        let output = "\
thread 'main' panicked at 'kaboom', src/main.rs:5
stack backtrace:
   1:     0x55dcf11d4b3a - kaboom::main::h3210a9a87dcc5e2e
";
        let (panic, _) = parse( output, BacktraceStyle::Compact ).unwrap();
        let stack = panic.stack.unwrap();
        assert!( !stack.contains( "0x55dcf11d4b3a" ) );
        assert_eq!( stack, "   1:  kaboom::main" );
    }

    #[test]
    fn test_off_backtrace_still_resolves_the_location() {
        let output = "\
thread 'main' panicked at 'kaboom', ../src/libcore/option.rs:335
stack backtrace:
   1:     0x55dcf11d4b3a - kaboom::main::h3210a9a87dcc5e2e
                at src/main.rs:5
";
        let (panic, consumed) = parse( output, BacktraceStyle::Off ).unwrap();
        assert_eq!( consumed, 4 );
        assert_eq!( panic.file, Some( "src/main.rs".to_owned() ) );
        assert_eq!( panic.stack, None );
    }

    #[test]
    fn test_fallback_to_the_toolchain_source() {
        let (panic, _) = parse(
            "thread 'main' panicked at 'kaboom', ../src/libcore/option.rs:335\n",
            BacktraceStyle::Compact
        ).unwrap();
        assert_eq!( panic.file, Some( "../src/libcore/option.rs".to_owned() ) );
        assert_eq!( panic.file_path, None );
        assert_eq!( panic.line, 335 );
    }

    #[test]
    fn test_fallback_uses_rust_src_path_when_available() {
        let lines = vec![ "thread 'main' panicked at 'kaboom', ../src/libcore/option.rs:335" ];
        let (panic, _) = try_parse_panic(
            &lines, 0, BacktraceStyle::Compact, Path::new( "/project" ), Some( "/rust/src" )
        ).unwrap();
        assert_eq!( panic.file, Some( "/rust/src/libcore/option.rs".to_owned() ) );
        assert_eq!( panic.file_path, Some( PathBuf::from( "/rust/src/libcore/option.rs" ) ) );
    }

    #[test]
    fn test_relative_panic_paths_are_joined_with_the_working_directory() {
        let (panic, _) = parse(
            "thread 'main' panicked at 'kaboom', lib/helper.rs:3\n",
            BacktraceStyle::Compact
        ).unwrap();
        assert_eq!( panic.file_path, Some( PathBuf::from( "/project/lib/helper.rs" ) ) );
    }
}
