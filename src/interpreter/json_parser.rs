use serde_json;

use error::Error;
use interpreter::rustc_diagnostic::{Diagnostic, DiagnosticSpan};
use interpreter::{Kind, Location, Message, EXPLANATION_ORDER};

fn span_location( span: &DiagnosticSpan ) -> Location {
    Location {
        file: span.file_name.clone(),
        line: span.line_start,
        line_end: span.line_end,
        column: span.column_start,
        column_end: span.column_end
    }
}

fn location_matches( span: &DiagnosticSpan, location: Option< &Location > ) -> bool {
    match location {
        Some( location ) => {
            span.file_name == location.file
                && span.line_start == location.line
                && span.line_end == location.line_end
                && span.column_start == location.column
                && span.column_end == location.column_end
        },
        None => false
    }
}

// Resolves a single span into the message. Synthetic buffers (their names
// are wrapped in angle brackets) are not real source; for those the macro
// expansion chain is followed until a real file turns up. Returns whether
// a real file was found. `reference` is the location the span is checked
// against to avoid storing the same location twice.
fn parse_span( span: &DiagnosticSpan, message: &mut Message, reference: Option< &Location > ) -> bool {
    let synthetic = span.file_name.starts_with( '<' );
    if span.is_primary {
        if message.span_label.is_none() {
            message.span_label = span.label.clone();
        }
        // For an error inside a macro the expanded text itself is worth seeing.
        if synthetic {
            if let Some( line ) = span.text.first() {
                message.trace.push( Message::new( line.text.clone(), Kind::Macro ) );
            }
        }
    }

    if !span.file_name.is_empty() && !synthetic {
        if !span.is_primary && span.label.is_some() {
            let mut note = Message::new( span.label.clone().unwrap(), Kind::Note );
            if !location_matches( span, reference ) {
                note.location = Some( span_location( span ) );
            }
            message.trace.push( note );
        }
        // The main location comes from the primary span, or from any other
        // span if it hasn't been found yet.
        if span.is_primary || message.location.is_none() {
            if !location_matches( span, reference ) {
                message.location = Some( span_location( span ) );
            }
        }
        true
    } else if let Some( ref expansion ) = span.expansion {
        parse_span( &expansion.span, message, reference )
    } else {
        false
    }
}

fn parse_spans( spans: &[ DiagnosticSpan ], message: &mut Message, parent_location: Option< &Location > ) {
    for span in spans {
        let reference = match parent_location {
            Some( location ) => Some( location.clone() ),
            // A top-level message is checked against its own location.
            None => message.location.clone()
        };
        parse_span( span, message, reference.as_ref() );
    }
}

// Unwraps the build tool's `reason`-tagged envelope. Objects which aren't
// compiler messages at all (artifacts, build script results, status output)
// produce no diagnostic.
fn extract_diagnostic( json: serde_json::Value ) -> Result< Option< Diagnostic >, Error > {
    let payload = if let Some( reason ) = json.get( "reason" ).and_then( |value| value.as_str() ) {
        if reason != "compiler-message" {
            return Ok( None );
        }
        match json.get( "message" ) {
            Some( inner ) => inner.clone(),
            None => return Ok( None )
        }
    } else {
        json
    };

    let is_message = payload.get( "level" ).map_or( false, |value| value.is_string() )
        && payload.get( "message" ).map_or( false, |value| value.is_string() );
    if !is_message {
        return Ok( None );
    }

    let diagnostic = serde_json::from_value( payload ).map_err( Error::InvalidJson )?;
    Ok( Some( diagnostic ) )
}

/// Parses a single line of the JSON dialect. A line which is valid JSON but
/// not a compiler message is consumed without effect; a line which is not
/// valid JSON is an error.
pub fn parse_message( line: &str, messages: &mut Vec< Message > ) -> Result< (), Error > {
    let json: serde_json::Value = serde_json::from_str( line ).map_err( Error::InvalidJson )?;
    let diagnostic = match extract_diagnostic( json )? {
        Some( diagnostic ) => diagnostic,
        None => return Ok( () )
    };

    let mut message = Message::new( diagnostic.message.clone(), Kind::from_level( &diagnostic.level ) );
    parse_spans( &diagnostic.spans, &mut message, None );

    let main_location = message.location.clone();
    for child in &diagnostic.children {
        let mut sub = Message::new( child.message.clone(), Kind::from_level( &child.level ) );
        parse_spans( &child.spans, &mut sub, main_location.as_ref() );
        message.trace.push( sub );
    }

    if let Some( ref code ) = diagnostic.code {
        message.error_code = Some( code.code.clone() );
        if let Some( ref explanation ) = code.explanation {
            let mut explain = Message::new( explanation.clone(), Kind::Explanation );
            explain.order = Some( EXPLANATION_ORDER );
            message.trace.push( explain );
        }
    }

    messages.push( message );
    Ok( () )
}

#[cfg(test)]
fn parse_single( line: &str ) -> Message {
    let mut messages = Vec::new();
    parse_message( line, &mut messages ).unwrap();
    assert_eq!( messages.len(), 1 );
    messages.pop().unwrap()
}

#[cfg(test)]
static TEST_BASIC_ERROR_JSON: &'static str = r##"
{
  "message": "cannot find value `foobar` in this scope",
  "code": {
    "code": "E0425",
    "explanation": "An identifier was used like a value, but no such value exists.\n"
  },
  "level": "error",
  "spans": [
    {
      "file_name": "src/main.rs",
      "byte_start": 47,
      "byte_end": 53,
      "line_start": 3,
      "line_end": 3,
      "column_start": 5,
      "column_end": 11,
      "is_primary": true,
      "text": [
        {
          "text": "    foobar",
          "highlight_start": 5,
          "highlight_end": 11
        }
      ],
      "label": "not found in this scope",
      "suggested_replacement": null,
      "expansion": null
    }
  ],
  "children": [],
  "rendered": null
}
"##;

#[test]
fn test_basic_error() {
    let message = parse_single( TEST_BASIC_ERROR_JSON.trim() );
    assert_eq!( message.kind, Kind::Error );
    assert_eq!( message.text, "cannot find value `foobar` in this scope" );
    assert_eq!( message.location, Some( Location {
        file: "src/main.rs".to_owned(),
        line: 3,
        line_end: 3,
        column: 5,
        column_end: 11
    }));
    // The label and the error code are merely staged; appending them is the
    // normalizer's job.
    assert_eq!( message.span_label, Some( "not found in this scope".to_owned() ) );
    assert_eq!( message.error_code, Some( "E0425".to_owned() ) );
    assert_eq!( message.trace.len(), 1 );
    assert_eq!( message.trace[ 0 ].kind, Kind::Explanation );
    assert_eq!( message.trace[ 0 ].order, Some( EXPLANATION_ORDER ) );
}

#[cfg(test)]
static TEST_EXPANSION_JSON: &'static str = r##"
{
  "message": "mismatched types",
  "code": null,
  "level": "error",
  "spans": [
    {
      "file_name": "<println macros>",
      "line_start": 1,
      "line_end": 1,
      "column_start": 33,
      "column_end": 58,
      "is_primary": true,
      "text": [
        {
          "text": "( $ ( $ arg : tt ) * ) => ( print ! ( concat ! ( $ fmt , \"\\n\" ) ) )",
          "highlight_start": 33,
          "highlight_end": 58
        }
      ],
      "label": "expected (), found integral variable",
      "expansion": {
        "span": {
          "file_name": "<print macros>",
          "line_start": 2,
          "line_end": 2,
          "column_start": 1,
          "column_end": 10,
          "is_primary": true,
          "text": [],
          "label": null,
          "expansion": {
            "span": {
              "file_name": "src/main.rs",
              "line_start": 7,
              "line_end": 7,
              "column_start": 5,
              "column_end": 20,
              "is_primary": true,
              "text": [],
              "label": null,
              "expansion": null
            },
            "macro_decl_name": "print!"
          }
        },
        "macro_decl_name": "println!"
      }
    }
  ],
  "children": []
}
"##;

#[test]
fn test_expansion_chain_is_followed_to_a_real_file() {
    let message = parse_single( TEST_EXPANSION_JSON.trim() );
    assert_eq!( message.location, Some( Location {
        file: "src/main.rs".to_owned(),
        line: 7,
        line_end: 7,
        column: 5,
        column_end: 20
    }));
    // The label comes from the primary span, the macro text too.
    assert_eq!( message.span_label, Some( "expected (), found integral variable".to_owned() ) );
    assert_eq!( message.trace.len(), 1 );
    assert_eq!( message.trace[ 0 ].kind, Kind::Macro );
    assert!( message.trace[ 0 ].text.contains( "concat !" ) );
}

#[cfg(test)]
static TEST_SECONDARY_SPANS_JSON: &'static str = r##"
{
  "message": "cannot borrow `x` as mutable more than once at a time",
  "code": { "code": "E0499", "explanation": null },
  "level": "error",
  "spans": [
    {
      "file_name": "src/main.rs",
      "line_start": 4,
      "line_end": 4,
      "column_start": 14,
      "column_end": 15,
      "is_primary": false,
      "text": [],
      "label": "first mutable borrow occurs here",
      "expansion": null
    },
    {
      "file_name": "src/main.rs",
      "line_start": 5,
      "line_end": 5,
      "column_start": 14,
      "column_end": 15,
      "is_primary": true,
      "text": [],
      "label": "second mutable borrow occurs here",
      "expansion": null
    }
  ],
  "children": [
    {
      "message": "first borrow ends here",
      "code": null,
      "level": "note",
      "spans": [
        {
          "file_name": "src/main.rs",
          "line_start": 6,
          "line_end": 6,
          "column_start": 1,
          "column_end": 2,
          "is_primary": true,
          "text": [],
          "label": null,
          "expansion": null
        }
      ],
      "children": []
    }
  ]
}
"##;

#[test]
fn test_secondary_spans_and_children() {
    let message = parse_single( TEST_SECONDARY_SPANS_JSON.trim() );
    // The primary span wins even when it comes second.
    assert_eq!( message.location.as_ref().unwrap().line, 5 );
    assert_eq!( message.span_label, Some( "second mutable borrow occurs here".to_owned() ) );
    assert_eq!( message.trace.len(), 2 );

    let note = &message.trace[ 0 ];
    assert_eq!( note.kind, Kind::Note );
    assert_eq!( note.text, "first mutable borrow occurs here" );
    assert_eq!( note.location.as_ref().unwrap().line, 4 );

    let child = &message.trace[ 1 ];
    assert_eq!( child.kind, Kind::Note );
    assert_eq!( child.text, "first borrow ends here" );
    assert_eq!( child.location.as_ref().unwrap().line, 6 );
}

#[test]
fn test_child_location_identical_to_the_parent_is_not_stored() {
    let line = r##"{
        "message": "unused variable",
        "level": "warning",
        "spans": [
            { "file_name": "src/lib.rs", "line_start": 1, "line_end": 1,
              "column_start": 5, "column_end": 6, "is_primary": true,
              "text": [], "label": null, "expansion": null }
        ],
        "children": [
            {
                "message": "consider removing it",
                "level": "help",
                "spans": [
                    { "file_name": "src/lib.rs", "line_start": 1, "line_end": 1,
                      "column_start": 5, "column_end": 6, "is_primary": true,
                      "text": [], "label": null, "expansion": null }
                ],
                "children": []
            }
        ]
    }"##;
    let message = parse_single( line );
    assert_eq!( message.location.as_ref().unwrap().line, 1 );
    assert_eq!( message.trace.len(), 1 );
    assert_eq!( message.trace[ 0 ].location, None );
}

#[test]
fn test_non_message_objects_are_ignored() {
    let mut messages = Vec::new();
    parse_message( r#"{"reason":"compiler-artifact","package_id":"foo","fresh":true}"#, &mut messages ).unwrap();
    parse_message( r#"{"reason":"build-script-executed","package_id":"foo"}"#, &mut messages ).unwrap();
    parse_message( r#"{"features":[]}"#, &mut messages ).unwrap();
    assert!( messages.is_empty() );
}

#[test]
fn test_cargo_envelope_is_unwrapped() {
    let line = r##"{
        "reason": "compiler-message",
        "package_id": "foo 0.1.0 (path+file:///tmp/foo)",
        "message": {
            "message": "unused import: `std::io`",
            "code": { "code": "unused_imports", "explanation": null },
            "level": "warning",
            "spans": [
                { "file_name": "src/lib.rs", "line_start": 2, "line_end": 2,
                  "column_start": 5, "column_end": 12, "is_primary": true,
                  "text": [], "label": null, "expansion": null }
            ],
            "children": []
        }
    }"##;
    let message = parse_single( line );
    assert_eq!( message.kind, Kind::Warning );
    assert_eq!( message.error_code, Some( "unused_imports".to_owned() ) );
    assert_eq!( message.location.as_ref().unwrap().file, "src/lib.rs" );
}

#[test]
fn test_invalid_json_is_an_error() {
    let mut messages = Vec::new();
    assert!( parse_message( "{ not json", &mut messages ).is_err() );
}
