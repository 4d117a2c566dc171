//! Printer tests for declfmt
//!
//! These drive the engine directly with hand-built token streams, without
//! going through the parser or the token builder.

use declfmt::diagnostics::SourcePosition;
use declfmt::formatter::comment::Comment;
use declfmt::formatter::context::Context;
use declfmt::formatter::printer::PrettyPrinter;
use declfmt::formatter::token::{BreakKind, GroupBreakStyle, Token, TokenStream, Verbatim};
use declfmt::Configuration;

fn config(line_length: usize) -> Configuration {
    Configuration {
        line_length,
        ..Configuration::default()
    }
}

fn print(tokens: Vec<Token>, line_length: usize) -> String {
    let mut context = Context::new(config(line_length), "", None);
    PrettyPrinter::new(&mut context, TokenStream::from(tokens)).pretty_print()
}

fn syntax(text: &str) -> Token {
    Token::Syntax(text.to_string())
}

fn brk(kind: BreakKind, size: usize) -> Token {
    Token::Break {
        kind,
        size,
        ignores_discretionary: false,
    }
}

fn newlines(count: usize, discretionary: bool) -> Token {
    Token::Newlines {
        count,
        discretionary,
    }
}

mod writes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn syntax_and_spaces() {
        let out = print(vec![syntax("a"), Token::space(1), syntax("b")], 80);
        assert_eq!(out, "a b");
    }

    #[test]
    fn empty_stream_prints_nothing() {
        let out = print(vec![], 80);
        assert_eq!(out, "");
    }

    #[test]
    fn pending_spaces_dropped_at_newline() {
        let out = print(
            vec![syntax("a"), Token::space(3), newlines(1, true), syntax("b")],
            80,
        );
        assert_eq!(out, "a\nb");
    }
}

mod breaks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn break_stays_as_spaces_when_it_fits() {
        let out = print(
            vec![syntax("aaaa"), brk(BreakKind::Continue, 1), syntax("bbb")],
            20,
        );
        assert_eq!(out, "aaaa bbb");
    }

    #[test]
    fn fired_continue_break_indents_the_next_line() {
        let out = print(
            vec![syntax("aaaa"), brk(BreakKind::Continue, 1), syntax("bbb")],
            5,
        );
        assert_eq!(out, "aaaa\n  bbb");
    }

    #[test]
    fn fired_same_break_keeps_the_indent() {
        let out = print(
            vec![
                syntax("aa"),
                brk(BreakKind::Same, 1),
                syntax("bb"),
                brk(BreakKind::Same, 1),
                syntax("cc"),
            ],
            6,
        );
        assert_eq!(out, "aa bb\ncc");
    }

    #[test]
    fn consistent_group_breaks_all_or_nothing() {
        let out = print(
            vec![
                Token::Open(GroupBreakStyle::Consistent),
                syntax("aa"),
                brk(BreakKind::Same, 1),
                syntax("bb"),
                brk(BreakKind::Same, 1),
                syntax("cc"),
                Token::Close,
            ],
            6,
        );
        assert_eq!(out, "aa\nbb\ncc");
    }

    #[test]
    fn consistent_group_stays_inline_when_it_fits() {
        let out = print(
            vec![
                Token::Open(GroupBreakStyle::Consistent),
                syntax("aa"),
                brk(BreakKind::Same, 1),
                syntax("bb"),
                Token::Close,
            ],
            20,
        );
        assert_eq!(out, "aa bb");
    }

    #[test]
    fn open_and_close_breaks_manage_indentation() {
        let out = print(
            vec![
                syntax("{"),
                brk(BreakKind::Open, 1),
                newlines(1, true),
                syntax("x"),
                newlines(1, true),
                brk(BreakKind::Close { must_break: true }, 1),
                syntax("}"),
            ],
            20,
        );
        assert_eq!(out, "{\n  x\n}");
    }

    #[test]
    fn reset_break_fires_only_on_continuation_lines() {
        // The continue break fires, making the second line a continuation;
        // the reset break then forces "{" back to column zero.
        let out = print(
            vec![
                syntax("aaaa"),
                brk(BreakKind::Continue, 1),
                syntax("bbbb"),
                brk(BreakKind::Reset, 1),
                syntax("{"),
            ],
            7,
        );
        assert_eq!(out, "aaaa\n  bbbb\n{");
    }

    #[test]
    fn reset_break_is_a_space_outside_continuations() {
        let out = print(
            vec![syntax("aaaa"), brk(BreakKind::Reset, 1), syntax("{")],
            20,
        );
        assert_eq!(out, "aaaa {");
    }
}

mod newline_handling {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn discretionary_newlines_capped_by_blank_line_budget() {
        let out = print(vec![syntax("a"), newlines(5, true), syntax("b")], 80);
        assert_eq!(out, "a\n\nb");
    }

    #[test]
    fn non_discretionary_newlines_do_not_pile_onto_existing_ones() {
        let out = print(
            vec![syntax("a"), newlines(1, true), newlines(1, false), syntax("b")],
            80,
        );
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn discretionary_newlines_extend_existing_ones_up_to_cap() {
        let out = print(
            vec![syntax("a"), newlines(1, false), newlines(2, true), syntax("b")],
            80,
        );
        assert_eq!(out, "a\n\nb");
    }
}

mod comments {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn over_long_end_of_line_comment_diagnoses() {
        let comment = Comment::new(
            "// this comment is much too long to fit",
            SourcePosition::new(1, 7),
        );
        let mut context = Context::new(config(10), "", None);
        let stream = TokenStream::from(vec![
            syntax("let a"),
            Token::space(2),
            Token::Comment {
                comment,
                was_end_of_line: true,
            },
            newlines(1, false),
        ]);
        let out = PrettyPrinter::new(&mut context, stream).pretty_print();
        assert_eq!(out, "let a  // this comment is much too long to fit\n");
        assert_eq!(context.diagnostics().len(), 1);
        assert_eq!(
            context.diagnostics()[0].message,
            "End-of-line comment exceeds the line length"
        );
        assert_eq!(context.diagnostics()[0].position, SourcePosition::new(1, 7));
    }

    #[test]
    fn fitting_end_of_line_comment_is_silent() {
        let comment = Comment::new("// ok", SourcePosition::new(1, 7));
        let mut context = Context::new(config(40), "", None);
        let stream = TokenStream::from(vec![
            syntax("let a"),
            Token::space(2),
            Token::Comment {
                comment,
                was_end_of_line: true,
            },
            newlines(1, false),
        ]);
        let out = PrettyPrinter::new(&mut context, stream).pretty_print();
        assert_eq!(out, "let a  // ok\n");
        assert!(context.diagnostics().is_empty());
    }

    #[test]
    fn free_standing_comment_indents_with_the_scope() {
        let comment = Comment::new("// note", SourcePosition::new(2, 3));
        let out = print(
            vec![
                syntax("{"),
                brk(BreakKind::Open, 1),
                newlines(1, true),
                Token::Comment {
                    comment,
                    was_end_of_line: false,
                },
                newlines(1, true),
                syntax("x"),
                newlines(1, true),
                brk(BreakKind::Close { must_break: true }, 1),
                syntax("}"),
            ],
            40,
        );
        assert_eq!(out, "{\n  // note\n  x\n}");
    }
}

mod verbatim {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn verbatim_blocks_paste_without_reflow() {
        let out = print(
            vec![
                Token::Verbatim(Verbatim::new("keep   =  this\n  and this")),
                newlines(1, false),
            ],
            10,
        );
        assert_eq!(out, "keep   =  this\n  and this\n");
    }

    #[test]
    fn verbatim_reindents_to_the_paste_site() {
        let out = print(
            vec![
                syntax("{"),
                brk(BreakKind::Open, 1),
                newlines(1, true),
                Token::Verbatim(Verbatim::new("    a\n      b")),
                newlines(1, true),
                brk(BreakKind::Close { must_break: true }, 1),
                syntax("}"),
            ],
            40,
        );
        assert_eq!(out, "{\n  a\n    b\n}");
    }
}

mod structural_errors {
    use super::*;

    #[test]
    #[should_panic(expected = "unmatched close group")]
    fn unmatched_close_group_panics() {
        print(vec![syntax("a"), Token::Close], 80);
    }

    #[test]
    #[should_panic(expected = "unclosed open group")]
    fn unclosed_open_group_panics() {
        print(
            vec![Token::Open(GroupBreakStyle::Consistent), syntax("a")],
            80,
        );
    }

    #[test]
    #[should_panic(expected = "open break was not matched")]
    fn unmatched_open_break_panics() {
        print(vec![syntax("a"), brk(BreakKind::Open, 1), syntax("b")], 80);
    }

    #[test]
    #[should_panic(expected = "unmatched close break")]
    fn unmatched_close_break_panics() {
        print(
            vec![syntax("a"), brk(BreakKind::Close { must_break: false }, 1)],
            80,
        );
    }
}
