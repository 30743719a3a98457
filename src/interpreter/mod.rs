use std::path::{Path, PathBuf};
use std::str;

use error::Error;

pub mod rustc_diagnostic;

pub mod formatter;
pub mod json_parser;
pub mod normalize;
pub mod panic_parser;
pub mod text_parser;

/// Max number of panics which are fully reported for a single build;
/// the rest are only counted.
pub const PANICS_LIMIT: usize = 10;

/// Trace entries carrying an order hint are sorted after the ones without;
/// this hint pushes long-form explanations to the very end.
pub const EXPLANATION_ORDER: u32 = 100;

const UNIX_RUST_SRC_PREFIX: &'static str = "../src/";
const WINDOWS_RUST_SRC_PREFIX: &'static str = "..\\src\\";

/// Checks whether a file path emitted by the compiler points into the
/// toolchain's own bundled sources rather than into the user's project.
pub fn is_toolchain_source( path: &str ) -> bool {
    path.starts_with( UNIX_RUST_SRC_PREFIX ) || path.starts_with( WINDOWS_RUST_SRC_PREFIX )
}

/// Rewrites a reference into the toolchain's bundled sources to an on-disk
/// path, provided the location of those sources is known.
pub fn resolve_toolchain_source( path: &str, rust_src_path: Option< &str > ) -> String {
    match rust_src_path {
        // Subtract one so the original path separator is preserved.
        Some( root ) if is_toolchain_source( path ) => format!( "{}{}", root, &path[ UNIX_RUST_SRC_PREFIX.len() - 1.. ] ),
        _ => path.to_owned()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
    Info
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Kind {
    Error,
    Warning,
    Note,
    Help,
    Panic,
    Explanation,
    Stack,
    Macro
}

impl Kind {
    pub fn from_level( level: &str ) -> Kind {
        match level {
            "error" => Kind::Error,
            "warning" => Kind::Warning,
            "note" => Kind::Note,
            "help" => Kind::Help,
            // Unknown level tokens stay visible.
            _ => Kind::Error
        }
    }

    pub fn severity( self ) -> Severity {
        match self {
            Kind::Error | Kind::Panic => Severity::Error,
            Kind::Warning => Severity::Warning,
            _ => Severity::Info
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub line_end: usize,
    pub column: usize,
    pub column_end: usize
}

impl Location {
    /// A location highlighting a single character.
    pub fn point( file: &str, line: usize, column: usize ) -> Location {
        Location {
            file: file.to_owned(),
            line,
            line_end: line,
            column,
            column_end: column + 1
        }
    }
}

#[derive(Clone, Debug)]
pub struct Message {
    pub text: String,
    pub kind: Kind,
    pub location: Option< Location >,
    pub trace: Vec< Message >,
    pub order: Option< u32 >,

    // Staging area filled in by the parsers and consumed by the normalizer.
    pub span_label: Option< String >,
    pub error_code: Option< String >
}

impl Message {
    pub fn new( text: String, kind: Kind ) -> Message {
        Message {
            text,
            kind,
            location: None,
            trace: Vec::new(),
            order: None,
            span_label: None,
            error_code: None
        }
    }

    pub fn severity( &self ) -> Severity {
        self.kind.severity()
    }
}

/// A message which cannot be displayed inline at a source location.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Notification {
    pub severity: Severity,
    pub text: String
}

#[derive(Clone, Debug)]
pub struct Panic {
    pub id: String,
    pub message: String,
    pub file: Option< String >,
    /// Absolute path of `file`, if it could be resolved.
    pub file_path: Option< PathBuf >,
    pub line: usize,
    pub stack: Option< String >,
    /// Panics past `PANICS_LIMIT` are only counted, not reported.
    pub reported: bool
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Dialect {
    HumanReadable,
    Json
}

impl str::FromStr for Dialect {
    type Err = String;
    fn from_str( value: &str ) -> Result< Self, Self::Err > {
        match value {
            "human" => Ok( Dialect::HumanReadable ),
            "json" => Ok( Dialect::Json ),
            _ => Err( format!( "unknown message format: `{}`", value ) )
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BacktraceStyle {
    Off,
    Compact,
    Full
}

impl str::FromStr for BacktraceStyle {
    type Err = String;
    fn from_str( value: &str ) -> Result< Self, Self::Err > {
        match value {
            "off" => Ok( BacktraceStyle::Off ),
            "compact" => Ok( BacktraceStyle::Compact ),
            "full" => Ok( BacktraceStyle::Full ),
            _ => Err( format!( "unknown backtrace style: `{}`", value ) )
        }
    }
}

/// Everything extracted from the output of one build invocation.
#[derive(Clone, Debug)]
pub struct Interpretation {
    pub messages: Vec< Message >,
    pub notifications: Vec< Notification >,
    pub panics: Vec< Panic >
}

pub struct Interpreter {
    pub dialect: Dialect,
    pub backtrace: BacktraceStyle,
    pub working_directory: PathBuf,
    /// Where a `main function not found` diagnostic should point.
    pub entry_path: PathBuf,
    pub rust_src_path: Option< String >,
    panics_counter: usize
}

impl Interpreter {
    pub fn new( dialect: Dialect, working_directory: &Path ) -> Interpreter {
        Interpreter {
            dialect,
            backtrace: BacktraceStyle::Compact,
            entry_path: working_directory.join( "src" ).join( "main.rs" ),
            working_directory: working_directory.to_owned(),
            rust_src_path: None,
            panics_counter: 0
        }
    }

    /// Scans the complete output of one build invocation. Only the panic
    /// counter survives between calls; everything else is per-invocation.
    pub fn interpret( &mut self, output: &str ) -> Result< Interpretation, Error > {
        let lines: Vec< &str > = output.lines().collect();
        debug!( "Interpreting {} lines of build output", lines.len() );

        let mut raw_messages = Vec::new();
        let mut panics: Vec< Panic > = Vec::new();
        let mut panics_seen = 0;
        let mut open_message: Option< usize > = None;

        let mut index = 0;
        while index < lines.len() {
            let line = lines[ index ];
            if line.is_empty() {
                open_message = None;
                index += 1;
                continue;
            }

            let parsed_panic = panic_parser::try_parse_panic(
                &lines,
                index,
                self.backtrace,
                &self.working_directory,
                self.rust_src_path.as_ref().map( |path| path.as_str() )
            );

            if let Some( (mut panic, consumed) ) = parsed_panic {
                self.panics_counter += 1;
                panics_seen += 1;
                panic.id = format!( "cargo-diagnose-panic-{}", self.panics_counter );
                panic.reported = panics_seen <= PANICS_LIMIT;
                panics.push( panic );
                open_message = None;
                index += consumed;
                continue;
            }

            match self.dialect {
                Dialect::Json => {
                    if line.starts_with( "{" ) {
                        json_parser::parse_message( line, &mut raw_messages )?;
                        open_message = None;
                    }
                    // Anything else is the build tool's own status output.
                    index += 1;
                },
                Dialect::HumanReadable => {
                    let consumed = text_parser::try_parse_message( &lines, index, &mut raw_messages );
                    if consumed > 0 {
                        open_message = Some( raw_messages.len() - 1 );
                        index += consumed;
                    } else {
                        // Plain continuation text; it belongs to the open
                        // submessage, if any.
                        if let Some( message_index ) = open_message {
                            if let Some( sub ) = raw_messages[ message_index ].trace.last_mut() {
                                sub.text.push( '\n' );
                                sub.text.push_str( line );
                            }
                        }
                        index += 1;
                    }
                }
            }
        }

        let mut interpretation = Interpretation {
            messages: Vec::new(),
            notifications: Vec::new(),
            panics
        };

        for message in raw_messages {
            match normalize::normalize( message, &self.entry_path ) {
                normalize::Disposition::Display( message ) => interpretation.messages.push( message ),
                normalize::Disposition::Notify( notification ) => interpretation.notifications.push( notification ),
                normalize::Disposition::Drop => {}
            }
        }

        let hidden_panics = panics_seen.saturating_sub( PANICS_LIMIT );
        if hidden_panics == 1 {
            interpretation.notifications.push( Notification {
                severity: Severity::Error,
                text: "One more panic is hidden".to_owned()
            });
        } else if hidden_panics > 1 {
            interpretation.notifications.push( Notification {
                severity: Severity::Error,
                text: format!( "{} more panics are hidden", hidden_panics )
            });
        }

        Ok( interpretation )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter( dialect: Dialect ) -> Interpreter {
        Interpreter::new( dialect, Path::new( "/project" ) )
    }

    #[test]
    fn test_human_readable_error_with_code() {
        let output = "error[E0308]: mismatched types\n  --> src/main.rs:10:5\n";
        let result = interpreter( Dialect::HumanReadable ).interpret( output ).unwrap();
        assert_eq!( result.messages.len(), 1 );
        let message = &result.messages[ 0 ];
        assert_eq!( message.kind, Kind::Error );
        assert_eq!( message.severity(), Severity::Error );
        assert_eq!( message.location, Some( Location {
            file: "src/main.rs".to_owned(),
            line: 10,
            line_end: 10,
            column: 5,
            column_end: 6
        }));
        assert!( message.text.ends_with( "[E0308]" ) );
    }

    #[test]
    fn test_panic_cap() {
        let mut output = String::new();
        for nth in 0..15 {
            output.push_str( &format!( "thread 'main' panicked at 'kaboom {}', src/lib.rs:42\n", nth ) );
        }
        let result = interpreter( Dialect::HumanReadable ).interpret( &output ).unwrap();
        assert_eq!( result.panics.len(), 15 );
        assert_eq!( result.panics.iter().filter( |panic| panic.reported ).count(), 10 );
        assert_eq!( result.notifications, vec![
            Notification {
                severity: Severity::Error,
                text: "5 more panics are hidden".to_owned()
            }
        ]);
    }

    #[test]
    fn test_single_hidden_panic_notification() {
        let mut output = String::new();
        for _ in 0..11 {
            output.push_str( "thread 'main' panicked at 'kaboom', src/lib.rs:1\n" );
        }
        let result = interpreter( Dialect::HumanReadable ).interpret( &output ).unwrap();
        assert_eq!( result.notifications.last().unwrap().text, "One more panic is hidden" );
    }

    #[test]
    fn test_panic_ids_are_monotonic_across_builds() {
        let mut interpreter = interpreter( Dialect::HumanReadable );
        let output = "thread 'main' panicked at 'kaboom', src/lib.rs:1\n";
        let first = interpreter.interpret( output ).unwrap();
        let second = interpreter.interpret( output ).unwrap();
        assert_eq!( first.panics[ 0 ].id, "cargo-diagnose-panic-1" );
        assert_eq!( second.panics[ 0 ].id, "cargo-diagnose-panic-2" );
    }

    #[test]
    fn test_meta_messages_are_dropped() {
        let output = "error: aborting due to 2 previous errors\n";
        let result = interpreter( Dialect::HumanReadable ).interpret( output ).unwrap();
        assert!( result.messages.is_empty() );
        assert!( result.notifications.is_empty() );
    }

    #[test]
    fn test_message_without_location_becomes_notification() {
        let output = "error: linking with `cc` failed: exit code: 1\n";
        let result = interpreter( Dialect::HumanReadable ).interpret( output ).unwrap();
        assert!( result.messages.is_empty() );
        assert_eq!( result.notifications, vec![
            Notification {
                severity: Severity::Error,
                text: "linking with `cc` failed: exit code: 1".to_owned()
            }
        ]);
    }

    #[test]
    fn test_missing_main_gets_a_location() {
        let output = "error: main function not found\n";
        let result = interpreter( Dialect::HumanReadable ).interpret( output ).unwrap();
        assert_eq!( result.messages.len(), 1 );
        let location = result.messages[ 0 ].location.as_ref().unwrap();
        assert_eq!( location.file, "/project/src/main.rs" );
    }

    #[test]
    fn test_continuation_text_is_appended_to_the_open_submessage() {
        let output = "\
error: expected one of `.`, `;`, `?`, or an operator, found `}`
  --> src/main.rs:3:1
note: the note
continuation of the note
";
        let result = interpreter( Dialect::HumanReadable ).interpret( output ).unwrap();
        assert_eq!( result.messages.len(), 1 );
        let trace = &result.messages[ 0 ].trace;
        assert_eq!( trace.len(), 1 );
        assert_eq!( trace[ 0 ].text, "the note\ncontinuation of the note" );
    }

    #[test]
    fn test_json_dialect_end_to_end() {
        let output = concat!(
            r#"{"reason":"compiler-artifact","package_id":"foo 0.1.0","target":{},"profile":{},"features":[],"filenames":[],"fresh":false}"#, "\n",
            r#"{"message":"unused variable: `x`","code":null,"level":"warning","spans":[{"file_name":"src/lib.rs","line_start":1,"line_end":1,"column_start":8,"column_end":9,"is_primary":true,"text":[],"label":null,"expansion":null}],"children":[],"rendered":null}"#, "\n",
            "   Compiling foo v0.1.0\n"
        );
        let result = interpreter( Dialect::Json ).interpret( output ).unwrap();
        assert_eq!( result.messages.len(), 1 );
        assert_eq!( result.messages[ 0 ].kind, Kind::Warning );
        assert_eq!( result.messages[ 0 ].location.as_ref().unwrap().file, "src/lib.rs" );
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = interpreter( Dialect::Json ).interpret( "{not json}\n" );
        assert!( result.is_err() );
    }

    #[test]
    fn test_panics_are_recognized_in_json_mode() {
        let output = "thread 'main' panicked at 'kaboom', src/lib.rs:7\n";
        let result = interpreter( Dialect::Json ).interpret( output ).unwrap();
        assert_eq!( result.panics.len(), 1 );
        assert_eq!( result.panics[ 0 ].line, 7 );
    }

    #[test]
    fn test_toolchain_source_detection() {
        assert!( is_toolchain_source( "../src/libcore/option.rs" ) );
        assert!( is_toolchain_source( "..\\src\\libcore\\option.rs" ) );
        assert!( !is_toolchain_source( "src/main.rs" ) );
    }

    #[test]
    fn test_toolchain_source_resolution() {
        assert_eq!(
            resolve_toolchain_source( "../src/libcore/option.rs", Some( "/rust/src" ) ),
            "/rust/src/libcore/option.rs"
        );
        assert_eq!(
            resolve_toolchain_source( "../src/libcore/option.rs", None ),
            "../src/libcore/option.rs"
        );
        assert_eq!(
            resolve_toolchain_source( "src/main.rs", Some( "/rust/src" ) ),
            "src/main.rs"
        );
    }
}
