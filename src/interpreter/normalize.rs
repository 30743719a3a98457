use std::path::Path;

use regex::Regex;

use interpreter::{is_toolchain_source, Location, Message, Notification};

fn pattern( pattern: &str ) -> Regex {
    Regex::new( pattern ).unwrap()
}

lazy_static! {
    // Span labels which only restate what the main message already says,
    // using different wording; appending them would add nothing. Each pair
    // is keyed by the diagnostic code it was observed with.
    static ref REDUNDANT_LABELS: Vec< (Regex, Regex) > = vec![
        // E0001
        ( pattern( "this is an unreachable pattern" ),
          pattern( "unreachable pattern" ) ),
        // E0004
        ( pattern( "pattern `.+` not covered" ),
          pattern( "non-exhaustive patterns: `.+` not covered" ) ),
        // E0023
        ( pattern( r"expected \d+ fields, found \d+" ),
          pattern( r"this pattern has \d+ field, but the corresponding variant has \d+ fields" ) ),
        // E0026
        ( pattern( "struct `.+` does not have field `.+`" ),
          pattern( "struct `.+` does not have a field named `.+`" ) ),
        // E0027
        ( pattern( "missing field `.+`" ),
          pattern( "pattern does not mention field `.+`" ) ),
        // E0029
        ( pattern( "ranges require char or numeric types" ),
          pattern( "only char and numeric types are allowed in range patterns" ) ),
        // E0040
        ( pattern( "call to destructor method" ),
          pattern( "explicit use of destructor method" ) ),
        // E0046
        ( pattern( "missing `.+` in implementation" ),
          pattern( "not all trait items implemented, missing: `.+`" ) ),
        // E0057
        ( pattern( r"expected \d+ parameter[s]?" ),
          pattern( r"this function takes \d+ parameter[s]? but \d+ parameter[s]? (was|were) supplied" ) ),
        // E0062
        ( pattern( "used more than once" ),
          pattern( "field `.+` specified more than once" ) ),
        // E0067
        ( pattern( "invalid expression for left-hand side" ),
          pattern( "invalid left-hand side expression" ) ),
        // E0068
        ( pattern( r"return type is not \(\)" ),
          pattern( r"`return;` in a function whose return type is not `\(\)`" ) ),
        // E0071
        ( pattern( "not a struct" ),
          pattern( "`.+` does not name a struct or a struct variant" ) ),
        // E0072
        ( pattern( "recursive type has infinite size" ),
          pattern( "recursive type `.+` has infinite size" ) ),
        // E0087
        ( pattern( r"expected \d+ parameter[s]?" ),
          pattern( r"too many type parameters provided: expected at most \d+ parameter[s]?, found \d+ parameter[s]?" ) ),
        // E0091
        ( pattern( "unused type parameter" ),
          pattern( "type parameter `.+` is unused" ) ),
        // E0101
        ( pattern( "cannot resolve type of expression" ),
          pattern( "cannot determine a type for this expression: unconstrained type" ) ),
        // E0102
        ( pattern( "cannot resolve type of variable" ),
          pattern( "cannot determine a type for this local variable: unconstrained type" ) ),
        // E0106
        ( pattern( "expected lifetime parameter" ),
          pattern( "missing lifetime specifier" ) ),
        // E0107
        ( pattern( r"(un)?expected (\d+ )?lifetime parameter[s]?" ),
          pattern( r"wrong number of lifetime parameters: expected \d+, found \d+" ) ),
        // E0109
        ( pattern( "type parameter not allowed" ),
          pattern( "type parameters are not allowed on this type" ) ),
        // E0110
        ( pattern( "lifetime parameter not allowed" ),
          pattern( "lifetime parameters are not allowed on this type" ) ),
        // E0116
        ( pattern( "impl for type defined outside of crate" ),
          pattern( "cannot define inherent `.+` for a type outside of the crate where the type is defined" ) ),
        // E0117
        ( pattern( "impl doesn't use types inside crate" ),
          pattern( "only traits defined in the current crate can be implemented for arbitrary types" ) ),
        // E0119
        ( pattern( "conflicting implementation for `.+`" ),
          pattern( "conflicting implementations of trait `.+` for type `.+`" ) ),
        // E0120
        ( pattern( "implementing Drop requires a struct" ),
          pattern( "the Drop trait may only be implemented on structures" ) ),
        // E0121
        ( pattern( "not allowed in type signatures" ),
          pattern( "the type placeholder `_` is not allowed within types on item signatures" ) ),
        // E0124
        ( pattern( "field already declared" ),
          pattern( "field `.+` is already declared" ) ),
        // E0368
        ( pattern( r"cannot use `[<>+&|^\-]?=` on type `.+`" ),
          pattern( r"binary assignment operation `[<>+&|^\-]?=` cannot be applied to type `.+`" ) ),
        // E0387
        ( pattern( "cannot borrow mutably" ),
          pattern( "cannot borrow immutable local variable `.+` as mutable" ) ),
    ];

    // Summary lines the build tool emits after the actual diagnostics;
    // they carry no information of their own.
    static ref META_MESSAGES: Vec< Regex > = vec![
        pattern( r"^aborting due to (\d+ )?previous errors?$" ),
        pattern( "^could not compile `.+`" ),
    ];
}

fn is_redundant_label( label: &str, text: &str ) -> bool {
    REDUNDANT_LABELS.iter().any( |&(ref label_pattern, ref message_pattern)| {
        label_pattern.is_match( label ) && message_pattern.is_match( text )
    })
}

fn is_meta_message( text: &str ) -> bool {
    META_MESSAGES.iter().any( |pattern| pattern.is_match( text ) )
}

/// A location is only worth displaying if it points into the user's
/// own sources.
pub fn is_location_usable( location: &Option< Location > ) -> bool {
    match *location {
        Some( ref location ) => {
            !location.file.starts_with( '<' ) && !is_toolchain_source( &location.file )
        },
        None => false
    }
}

// Folds the staged span label and error code into the message text and
// clears the staging area.
fn merge_staged_extras( message: &mut Message ) {
    if let Some( label ) = message.span_label.take() {
        if !label.is_empty()
            && !message.text.contains( &label )
            && !is_redundant_label( &label, &message.text )
        {
            message.text = format!( "{} ({})", message.text, label );
        }
    }
    if let Some( code ) = message.error_code.take() {
        message.text = format!( "{} [{}]", message.text, code );
    }
}

/// What should become of a message after normalization.
#[derive(Debug)]
pub enum Disposition {
    /// Keep it for structured display.
    Display( Message ),
    /// No usable location; surface it as a standalone notification.
    Notify( Notification ),
    /// Nothing worth showing.
    Drop
}

/// Post-processes one parsed message. The steps are order-sensitive:
/// staged label/code merging, location deduplication between the message
/// and its trace, trace ordering, and finally the decision whether the
/// message is displayable at all.
pub fn normalize( mut message: Message, entry_path: &Path ) -> Disposition {
    merge_staged_extras( &mut message );
    for sub in &mut message.trace {
        merge_staged_extras( sub );
    }

    for sub in &mut message.trace {
        if !is_location_usable( &sub.location ) {
            sub.location = None;
            continue;
        }
        if !is_location_usable( &message.location ) {
            // The submessage knows where the problem is even though the
            // message itself doesn't; hoist the location up.
            message.location = sub.location.take();
        } else if sub.location == message.location {
            sub.location = None;
        }
    }

    // A stable sort, so entries without an explicit order hint keep their
    // relative positions and precede the hinted ones.
    message.trace.sort_by_key( |entry| entry.order.unwrap_or( 0 ) );

    if !is_location_usable( &message.location ) {
        if message.text == "main function not found" {
            // The compiler has no position to point at, but the fix
            // belongs in the crate's entry file.
            message.location = Some( Location::point( &entry_path.to_string_lossy(), 1, 1 ) );
        } else if is_meta_message( &message.text ) {
            return Disposition::Drop;
        } else {
            return Disposition::Notify( Notification {
                severity: message.severity(),
                text: message.text
            });
        }
    }

    Disposition::Display( message )
}

#[cfg(test)]
mod tests {
    use super::*;
    use interpreter::{Kind, Severity, EXPLANATION_ORDER};

    fn entry() -> &'static Path {
        Path::new( "/project/src/main.rs" )
    }

    fn displayed( message: Message ) -> Message {
        match normalize( message, entry() ) {
            Disposition::Display( message ) => message,
            other => panic!( "message was not displayed: {:?}", other )
        }
    }

    fn located( text: &str, kind: Kind ) -> Message {
        let mut message = Message::new( text.to_owned(), kind );
        message.location = Some( Location::point( "src/main.rs", 10, 5 ) );
        message
    }

    #[test]
    fn test_span_label_is_appended() {
        let mut message = located( "mismatched types", Kind::Error );
        message.span_label = Some( "expected u32".to_owned() );
        let message = displayed( message );
        assert_eq!( message.text, "mismatched types (expected u32)" );
        assert_eq!( message.span_label, None );
    }

    #[test]
    fn test_span_label_already_contained_is_not_appended() {
        let mut message = located( "unused variable: `x`", Kind::Warning );
        message.span_label = Some( "unused variable: `x`".to_owned() );
        let message = displayed( message );
        assert_eq!( message.text, "unused variable: `x`" );
    }

    #[test]
    fn test_redundant_span_label_is_suppressed() {
        let mut message = located( "non-exhaustive patterns: `None` not covered", Kind::Error );
        message.span_label = Some( "pattern `None` not covered".to_owned() );
        let message = displayed( message );
        assert_eq!( message.text, "non-exhaustive patterns: `None` not covered" );
    }

    #[test]
    fn test_error_code_is_appended() {
        let mut message = located( "mismatched types", Kind::Error );
        message.error_code = Some( "E0308".to_owned() );
        let message = displayed( message );
        assert_eq!( message.text, "mismatched types [E0308]" );
        assert_eq!( message.error_code, None );
    }

    #[test]
    fn test_child_location_identical_to_parent_is_stripped() {
        let mut message = located( "mismatched types", Kind::Error );
        let mut sub = Message::new( "expected because of this".to_owned(), Kind::Note );
        sub.location = message.location.clone();
        message.trace.push( sub );
        let message = displayed( message );
        assert_eq!( message.trace[ 0 ].location, None );
    }

    #[test]
    fn test_child_location_different_from_parent_is_kept() {
        let mut message = located( "mismatched types", Kind::Error );
        let mut sub = Message::new( "expected because of this".to_owned(), Kind::Note );
        sub.location = Some( Location::point( "src/lib.rs", 3, 1 ) );
        message.trace.push( sub );
        let message = displayed( message );
        assert!( message.trace[ 0 ].location.is_some() );
    }

    #[test]
    fn test_child_location_is_promoted_to_a_parent_without_one() {
        let mut message = Message::new( "mismatched types".to_owned(), Kind::Error );
        let mut sub = Message::new( "expected because of this".to_owned(), Kind::Note );
        sub.location = Some( Location::point( "src/lib.rs", 3, 1 ) );
        message.trace.push( sub );
        let message = displayed( message );
        assert_eq!( message.location, Some( Location::point( "src/lib.rs", 3, 1 ) ) );
        assert_eq!( message.trace[ 0 ].location, None );
    }

    #[test]
    fn test_toolchain_location_is_unusable() {
        let mut message = located( "mismatched types", Kind::Error );
        let mut sub = Message::new( "defined here".to_owned(), Kind::Note );
        sub.location = Some( Location::point( "../src/libcore/option.rs", 1, 1 ) );
        message.trace.push( sub );
        let message = displayed( message );
        assert_eq!( message.trace[ 0 ].location, None );
    }

    #[test]
    fn test_explanations_sort_last() {
        let mut message = located( "mismatched types", Kind::Error );
        let mut explain = Message::new( "Explain error E0308".to_owned(), Kind::Explanation );
        explain.order = Some( EXPLANATION_ORDER );
        message.trace.push( explain );
        message.trace.push( Message::new( "first note".to_owned(), Kind::Note ) );
        message.trace.push( Message::new( "second note".to_owned(), Kind::Note ) );
        let message = displayed( message );
        assert_eq!( message.trace[ 0 ].text, "first note" );
        assert_eq!( message.trace[ 1 ].text, "second note" );
        assert_eq!( message.trace[ 2 ].kind, Kind::Explanation );
    }

    #[test]
    fn test_meta_messages_are_dropped() {
        for text in &[
            "aborting due to previous error",
            "aborting due to 2 previous errors",
            "could not compile `foo`"
        ] {
            let message = Message::new( text.to_string(), Kind::Error );
            match normalize( message, entry() ) {
                Disposition::Drop => {},
                other => panic!( "`{}` was not dropped: {:?}", text, other )
            }
        }
    }

    #[test]
    fn test_unlocated_message_becomes_a_notification() {
        let message = Message::new( "linking failed".to_owned(), Kind::Warning );
        match normalize( message, entry() ) {
            Disposition::Notify( notification ) => {
                assert_eq!( notification.severity, Severity::Warning );
                assert_eq!( notification.text, "linking failed" );
            },
            other => panic!( "message was not routed to a notification: {:?}", other )
        }
    }

    #[test]
    fn test_missing_main_is_pointed_at_the_entry_file() {
        let message = Message::new( "main function not found".to_owned(), Kind::Error );
        let message = displayed( message );
        assert_eq!( message.location, Some( Location::point( "/project/src/main.rs", 1, 1 ) ) );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut message = located( "mismatched types", Kind::Error );
        message.span_label = Some( "expected u32".to_owned() );
        message.error_code = Some( "E0308".to_owned() );
        let mut sub = Message::new( "expected because of this".to_owned(), Kind::Note );
        sub.location = message.location.clone();
        message.trace.push( sub );
        let mut explain = Message::new( "Explain error E0308".to_owned(), Kind::Explanation );
        explain.order = Some( EXPLANATION_ORDER );
        message.trace.push( explain );

        let once = displayed( message );
        let twice = displayed( once.clone() );
        assert_eq!( once.text, twice.text );
        assert_eq!( once.location, twice.location );
        assert_eq!( once.trace.len(), twice.trace.len() );
        for (first, second) in once.trace.iter().zip( twice.trace.iter() ) {
            assert_eq!( first.text, second.text );
            assert_eq!( first.location, second.location );
        }
    }
}
