//! Error handling tests for declfmt
//!
//! Tests for parse errors and trivial inputs through the public API.

use declfmt::{check, format, Error};

mod parse_errors {
    use super::*;

    #[test]
    fn missing_binding_name() {
        assert!(format("let = 1").is_err());
    }

    #[test]
    fn missing_member_block() {
        assert!(format("extension Foo").is_err());
    }

    #[test]
    fn unclosed_block() {
        assert!(format("struct S { let a: Int").is_err());
    }

    #[test]
    fn unclosed_string() {
        assert!(format("let s = \"open").is_err());
    }

    #[test]
    fn unterminated_block_comment() {
        assert!(format("/* never closed\nlet a = 1").is_err());
    }

    #[test]
    fn stray_punctuation() {
        assert!(format("???").is_err());
    }

    #[test]
    fn double_comma_in_arguments() {
        assert!(format("let x = f(a,, b)").is_err());
    }

    #[test]
    fn parse_error_carries_a_span() {
        let error = format("let = 1").unwrap_err();
        match error {
            Error::ParseError { message, span } => {
                assert!(message.contains("line 1"), "message was: {message}");
                assert!(span.is_some());
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}

mod trivial_inputs {
    use super::*;

    #[test]
    fn empty_input_is_not_an_error() {
        assert_eq!(format("").unwrap(), "");
    }

    #[test]
    fn whitespace_only_input_formats_to_empty() {
        assert_eq!(format("  \n\t\n").unwrap(), "");
    }

    #[test]
    fn comment_only_input_keeps_the_comment() {
        assert_eq!(format("// just a note\n").unwrap(), "// just a note\n");
    }

    #[test]
    fn check_accepts_formatted_source() {
        assert!(check("let a = 1\n").unwrap());
    }

    #[test]
    fn check_rejects_unformatted_source() {
        assert!(!check("let a    = 1\n").unwrap());
    }

    #[test]
    fn check_propagates_parse_errors() {
        assert!(check("let = 1").is_err());
    }
}
