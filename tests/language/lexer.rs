//! Integration tests for the lexer
//!
//! Tests tokenization of grammar source code.

use sylva_foundation::Type;
use sylva_language::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !matches!(k, TokenKind::Comment(_)))
        .collect()
}

#[test]
fn lex_declaration() {
    assert_eq!(
        kinds("#main = @item"),
        vec![
            TokenKind::Hash,
            TokenKind::Ident("main".into()),
            TokenKind::Equals,
            TokenKind::At,
            TokenKind::Ident("item".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_numbers() {
    assert_eq!(
        kinds("1 18446744073709551615 1.5"),
        vec![
            TokenKind::Int(1),
            TokenKind::Uint(u64::MAX),
            TokenKind::Double(1.5),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_variables_and_strings() {
    assert_eq!(
        kinds("$string \"a\\nb\""),
        vec![
            TokenKind::Variable(Type::String),
            TokenKind::String("a\nb".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_are_tokens() {
    let tokens = Lexer::tokenize_all("// note\n*");
    assert!(matches!(tokens[0].kind, TokenKind::Comment(_)));
    assert_eq!(tokens[1].kind, TokenKind::Star);
}

#[test]
fn bad_input_is_an_error_token() {
    let tokens = Lexer::tokenize_all("\"open");
    assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Error(_))));
}
