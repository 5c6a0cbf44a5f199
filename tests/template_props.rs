//! Property tests for message-to-template conversion

use logger_formatter::scan::end_of_quoted_string;
use logger_formatter::{standardize, TemplateParser};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    Ident(String),
}

fn piece() -> impl Strategy<Value = Piece> {
    prop_oneof![
        "[a-zA-Z0-9 :,.=-]{0,12}".prop_map(Piece::Literal),
        "[a-z_$][a-zA-Z0-9_]{0,8}".prop_map(Piece::Ident),
    ]
}

fn separator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(" + "), Just("+"), Just(" +"), Just("+ "), Just("  +   ")]
}

fn expression() -> impl Strategy<Value = (Vec<Piece>, String)> {
    prop::collection::vec((piece(), separator()), 1..=20).prop_map(|parts| {
        let mut expr = String::new();
        for (idx, (piece, sep)) in parts.iter().enumerate() {
            if idx > 0 {
                expr.push_str(sep);
            }
            match piece {
                Piece::Literal(text) => {
                    expr.push('"');
                    expr.push_str(text);
                    expr.push('"');
                }
                Piece::Ident(name) => expr.push_str(name),
            }
        }
        let pieces = parts.into_iter().map(|(piece, _)| piece).collect();
        (pieces, expr)
    })
}

proptest! {
    #[test]
    fn placeholders_match_params((pieces, expr) in expression()) {
        let result = standardize(&expr).unwrap();

        let idents: Vec<&str> = pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Ident(name) => Some(name.as_str()),
                Piece::Literal(_) => None,
            })
            .collect();
        prop_assert_eq!(&result.params, &idents);

        // Every index appears exactly once, in order
        let mut rest = result.template.as_str();
        for idx in 0..result.params.len() {
            let placeholder = format!("{{{idx}}}");
            let at = rest.find(&placeholder);
            prop_assert!(at.is_some(), "missing {} in {}", placeholder, result.template);
            rest = &rest[at.unwrap() + placeholder.len()..];
        }
        prop_assert!(!rest.contains('{'), "unexpected placeholder after last index in {}", result.template);
    }

    #[test]
    fn literal_text_round_trips((pieces, expr) in expression()) {
        let result = standardize(&expr).unwrap();

        let mut expected = String::from("\"");
        let mut next = 0;
        for piece in &pieces {
            match piece {
                Piece::Literal(text) => expected.push_str(text),
                Piece::Ident(_) => {
                    expected.push_str(&format!("{{{next}}}"));
                    next += 1;
                }
            }
        }
        expected.push('"');
        prop_assert_eq!(result.template, expected);
    }

    #[test]
    fn whitespace_around_operands_is_irrelevant((_pieces, expr) in expression()) {
        let padded = format!("  {expr}\t ");
        prop_assert_eq!(standardize(&expr).unwrap(), standardize(&padded).unwrap());
    }

    #[test]
    fn budget_is_a_hard_limit((pieces, expr) in expression()) {
        let exact = TemplateParser::new(pieces.len());
        prop_assert!(exact.standardize(&expr).is_ok());

        if pieces.len() > 1 {
            let short = TemplateParser::new(pieces.len() - 1);
            prop_assert!(short.standardize(&expr).is_err());
        }
    }

    #[test]
    fn escaped_quotes_never_close_a_literal(chunks in prop::collection::vec("[a-z ]{0,5}", 1..6)) {
        let content = chunks.join("\\\"");
        let literal = format!("\"{content}\" + tail");
        prop_assert_eq!(end_of_quoted_string(&literal, 1), Some(content.len() + 1));
    }
}
