use std::fmt::{self, Write};

use ansi_term::{Color, Style};

use interpreter::{Interpretation, Kind, Location, Message, Notification, Panic, Severity};

struct MaybePrint< T: fmt::Display >( bool, T );

impl< T: fmt::Display > fmt::Display for MaybePrint< T > {
    fn fmt( &self, fmt: &mut fmt::Formatter ) -> fmt::Result {
        if self.0 {
            write!( fmt, "{}", self.1 )?;
        }

        Ok(())
    }
}

fn severity_color( severity: Severity ) -> Style {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::White
    }.bold()
}

fn kind_label( kind: Kind ) -> &'static str {
    match kind {
        Kind::Error => "error",
        Kind::Warning => "warning",
        Kind::Note => "note",
        Kind::Help => "help",
        Kind::Panic => "panic",
        Kind::Explanation => "explanation",
        Kind::Stack => "stack",
        Kind::Macro => "macro"
    }
}

fn print_pointer< W: Write >( use_color: bool, indent: &str, location: &Location, fp: &mut W ) -> fmt::Result {
    let arrow_color = Color::Blue.bold();
    writeln!( fp, "{}{}-->{} {}:{}:{}",
        indent,
        MaybePrint( use_color, arrow_color.prefix() ),
        MaybePrint( use_color, arrow_color.suffix() ),
        location.file,
        location.line,
        location.column
    )
}

fn print_message< W: Write >( use_color: bool, message: &Message, fp: &mut W ) -> fmt::Result {
    let color = severity_color( message.severity() );
    writeln!( fp, "{}{}{}: {}",
        MaybePrint( use_color, color.prefix() ),
        kind_label( message.kind ),
        MaybePrint( use_color, color.suffix() ),
        message.text
    )?;
    if let Some( ref location ) = message.location {
        print_pointer( use_color, "  ", location, fp )?;
    }

    for entry in &message.trace {
        let color = severity_color( entry.severity() );
        writeln!( fp, "  {}= {}{}: {}",
            MaybePrint( use_color, color.prefix() ),
            kind_label( entry.kind ),
            MaybePrint( use_color, color.suffix() ),
            entry.text
        )?;
        if let Some( ref location ) = entry.location {
            print_pointer( use_color, "    ", location, fp )?;
        }
    }

    Ok(())
}

fn print_notification< W: Write >( use_color: bool, notification: &Notification, fp: &mut W ) -> fmt::Result {
    let color = severity_color( notification.severity );
    let label = match notification.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note"
    };
    writeln!( fp, "{}{}{}: {}",
        MaybePrint( use_color, color.prefix() ),
        label,
        MaybePrint( use_color, color.suffix() ),
        notification.text
    )
}

fn print_panic< W: Write >( use_color: bool, panic: &Panic, fp: &mut W ) -> fmt::Result {
    let color = severity_color( Severity::Error );
    let location = match panic.file {
        Some( ref file ) => format!( "line {} in {}", panic.line, file ),
        None => "an unknown location".to_owned()
    };
    writeln!( fp, "{}panic{}: a thread panicked at {}",
        MaybePrint( use_color, color.prefix() ),
        MaybePrint( use_color, color.suffix() ),
        location
    )?;
    writeln!( fp, "  {}", panic.message )?;
    if let Some( ref path ) = panic.file_path {
        writeln!( fp, "  --> {}:{}", path.to_string_lossy(), panic.line )?;
    }
    if let Some( ref stack ) = panic.stack {
        if !stack.is_empty() {
            writeln!( fp, "stack backtrace:" )?;
            writeln!( fp, "{}", stack )?;
        }
    }

    Ok(())
}

pub fn format_interpretation< W: Write >( use_color: bool, interpretation: &Interpretation, fp: &mut W ) -> fmt::Result {
    for message in &interpretation.messages {
        print_message( use_color, message, fp )?;
    }
    for panic in interpretation.panics.iter().filter( |panic| panic.reported ) {
        print_panic( use_color, panic, fp )?;
    }
    for notification in &interpretation.notifications {
        print_notification( use_color, notification, fp )?;
    }

    Ok(())
}

/// Renders the whole interpretation to stderr.
pub fn print( use_color: bool, interpretation: &Interpretation ) {
    let mut output = String::new();
    format_interpretation( use_color, interpretation, &mut output ).expect( "formatting failed" );
    eprint!( "{}", output );
}

#[cfg(test)]
fn render( interpretation: &Interpretation ) -> String {
    let mut output = String::new();
    format_interpretation( false, interpretation, &mut output ).unwrap();
    output
}

#[test]
fn test_message_rendering() {
    let mut message = Message::new( "mismatched types [E0308]".to_owned(), Kind::Error );
    message.location = Some( Location::point( "src/main.rs", 10, 5 ) );
    let mut note = Message::new( "expected because of this".to_owned(), Kind::Note );
    note.location = Some( Location::point( "src/main.rs", 8, 1 ) );
    message.trace.push( note );

    let interpretation = Interpretation {
        messages: vec![ message ],
        notifications: Vec::new(),
        panics: Vec::new()
    };
    assert_eq!( render( &interpretation ), "\
error: mismatched types [E0308]
  --> src/main.rs:10:5
  = note: expected because of this
    --> src/main.rs:8:1
" );
}

#[test]
fn test_panic_and_notification_rendering() {
    let panic = Panic {
        id: "cargo-diagnose-panic-1".to_owned(),
        message: "thread 'main' panicked at 'kaboom'".to_owned(),
        file: Some( "src/lib.rs".to_owned() ),
        file_path: Some( "/project/src/lib.rs".into() ),
        line: 42,
        stack: None,
        reported: true
    };
    let hidden = Panic {
        reported: false,
        ..panic.clone()
    };
    let interpretation = Interpretation {
        messages: Vec::new(),
        notifications: vec![
            Notification {
                severity: Severity::Error,
                text: "One more panic is hidden".to_owned()
            }
        ],
        panics: vec![ panic, hidden ]
    };
    assert_eq!( render( &interpretation ), "\
panic: a thread panicked at line 42 in src/lib.rs
  thread 'main' panicked at 'kaboom'
  --> /project/src/lib.rs:42
error: One more panic is hidden
" );
}
