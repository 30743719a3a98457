use regex::Regex;

use interpreter::{Kind, Location, Message, Severity, EXPLANATION_ORDER};

lazy_static! {
    // error[E0023]: this pattern has 1 field, but ...
    //   --> src/main.rs:157:12
    static ref HEADER: Regex = Regex::new(
        r"^(error|warning|note|help)(?:\[(E\d+)\])?: (.*)"
    ).unwrap();
    static ref HEADER_LOCATION: Regex = Regex::new(
        r"^\s*--> (.+):(\d+):(\d+)"
    ).unwrap();

    // <std macros>:1:33: 1:58 note: ... - the form emitted for errors
    // inside macro expansions, with the whole span on one line.
    static ref MACRO_HEADER: Regex = Regex::new(
        r"^\s*(.+):(\d+):(\d+): (\d+):(\d+) (error|warning|note|help):\s*(.*)"
    ).unwrap();

    // error: something happened
    static ref BARE_HEADER: Regex = Regex::new(
        r"^\s*(error|warning|note|help):\s*(.*)"
    ).unwrap();

    static ref CODE_LINE: Regex = Regex::new( r"^\s*(\d*)\s*\|" ).unwrap();
    static ref UNDERLINE: Regex = Regex::new( r"^[\s\d]*\|(\s+)([\^-]+)\s*(.*)" ).unwrap();
    static ref AUX_LINE: Regex = Regex::new( r"^\s*= (note|help): (.+)" ).unwrap();

    // Line shapes emitted by toolchains prior to 1.12.
    static ref LEGACY_LOCATION_LINE: Regex = Regex::new( r"^[^:]*:\d+\s+.*" ).unwrap();
    static ref LEGACY_UNDERLINE: Regex = Regex::new( r"^\s+\^" ).unwrap();
}

// Tries to parse one of the known message header forms. Returns the message
// and the number of lines it occupied.
fn parse_message_header( lines: &[ &str ], index: usize ) -> Option< (Message, usize) > {
    let line = lines[ index ];

    if let Some( header ) = HEADER.captures( line ) {
        let location = lines.get( index + 1 ).and_then( |next| HEADER_LOCATION.captures( next ) );
        if let Some( location ) = location {
            let mut message = Message::new( header[ 3 ].to_owned(), Kind::from_level( &header[ 1 ] ) );
            // Only one character is highlighted until the code block below
            // the header tells us more.
            message.location = Some( Location::point(
                &location[ 1 ],
                location[ 2 ].parse().unwrap(),
                location[ 3 ].parse().unwrap()
            ));
            if let Some( code ) = header.get( 2 ) {
                let code = code.as_str();
                message.error_code = Some( code.to_owned() );
                let mut explain = Message::new(
                    format!( "Explain error {} (https://doc.rust-lang.org/error-index.html#{})", code, code ),
                    Kind::Explanation
                );
                explain.order = Some( EXPLANATION_ORDER );
                message.trace.push( explain );
            }
            return Some( (message, 2) );
        }
    }

    if let Some( header ) = MACRO_HEADER.captures( line ) {
        let mut message = Message::new( header[ 7 ].to_owned(), Kind::from_level( &header[ 6 ] ) );
        message.location = Some( Location {
            file: header[ 1 ].to_owned(),
            line: header[ 2 ].parse().unwrap(),
            line_end: header[ 4 ].parse().unwrap(),
            column: header[ 3 ].parse().unwrap(),
            column_end: header[ 5 ].parse().unwrap()
        });
        return Some( (message, 1) );
    }

    if let Some( header ) = BARE_HEADER.captures( line ) {
        let message = Message::new( header[ 2 ].to_owned(), Kind::from_level( &header[ 1 ] ) );
        return Some( (message, 1) );
    }

    None
}

// Parses the code block which follows a message header:
//
//    |
// 12 |    some code here
//    |         ^^^^ additional text
//    = note: additional note
//
// A `^` underline belongs to the primary span and refines the header's
// location; a labeled `-` underline is a secondary span and becomes a note
// of its own. Returns the number of lines consumed.
fn parse_code_block( lines: &[ &str ], start: usize, message: &mut Message ) -> usize {
    let mut index = start;
    let mut context_line = None;
    while index < lines.len() && !lines[ index ].is_empty() {
        let line = lines[ index ];
        let mut parsed = false;
        if let Some( code ) = CODE_LINE.captures( line ) {
            if !code[ 1 ].is_empty() {
                context_line = Some( code[ 1 ].parse().unwrap() );
            } else if let Some( underline ) = UNDERLINE.captures( line ) {
                let column = underline[ 1 ].len();
                let marker = underline[ 2 ].to_owned();
                let label = if underline[ 3 ].is_empty() {
                    None
                } else {
                    Some( underline[ 3 ].to_owned() )
                };
                if marker.starts_with( '^' ) {
                    if let Some( ref mut location ) = message.location {
                        location.column_end = location.column + marker.len();
                    }
                    message.span_label = label;
                } else if let Some( label ) = label {
                    let mut note = Message::new( label, Kind::Note );
                    if let (Some( parent_location ), Some( line_number )) = (message.location.as_ref(), context_line) {
                        note.location = Some( Location {
                            file: parent_location.file.clone(),
                            line: line_number,
                            line_end: line_number,
                            column,
                            column_end: column + marker.len()
                        });
                    }
                    message.trace.push( note );
                }
            }
            parsed = true;
        } else if let Some( aux ) = AUX_LINE.captures( line ) {
            message.trace.push( Message::new( aux[ 2 ].to_owned(), Kind::from_level( &aux[ 1 ] ) ) );
            parsed = true;
        }

        // Gaps in the quoted source are displayed this way.
        if !parsed && line.starts_with( "..." ) {
            parsed = true;
        }
        if !parsed && ( LEGACY_LOCATION_LINE.is_match( line ) || LEGACY_UNDERLINE.is_match( line ) ) {
            parsed = true;
        }

        if !parsed {
            break;
        }
        index += 1;
    }

    index - start
}

fn parse_message_block( lines: &[ &str ], start: usize, messages: &mut Vec< Message >, parent: Option< &mut Message > ) -> usize {
    let (mut message, header_lines) = match parse_message_header( lines, start ) {
        Some( header ) => header,
        None => return 0
    };

    // Note/help levels only continue an already open message, while
    // error/warning levels only start a new one; on a mismatch the header
    // is no header at all and the line is plain text.
    let starts_message = match message.severity() {
        Severity::Error | Severity::Warning => true,
        Severity::Info => false
    };
    let is_sub_block = parent.is_some();
    if is_sub_block == starts_message {
        return 0;
    }

    let mut index = start + header_lines;
    index += parse_code_block( lines, index, &mut message );

    match parent {
        Some( parent ) => parent.trace.push( message ),
        None => {
            loop {
                let consumed = parse_message_block( lines, index, messages, Some( &mut message ) );
                if consumed == 0 {
                    break;
                }
                index += consumed;
            }
            messages.push( message );
        }
    }

    index - start
}

/// Tries to parse one complete diagnostic block (header, code block and any
/// nested note/help blocks) starting at `index`. Parsed messages are pushed
/// onto `messages`; returns the number of lines consumed, 0 if the line
/// doesn't start a block.
pub fn try_parse_message( lines: &[ &str ], index: usize, messages: &mut Vec< Message > ) -> usize {
    parse_message_block( lines, index, messages, None )
}
