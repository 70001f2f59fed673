//! Tokenizer output as seen by grammars and by serializers.

use descent::prelude::*;
use descent::Error;

fn arith() -> Tokenizer {
    Tokenizer::builder()
        .rule(r"\d+\.\d+", "real")
        .rule(r"\d+", "int")
        .rule(r"[A-Za-z_]\w*", "ident")
        .build()
        .unwrap()
}

fn render(tokens: impl IntoIterator<Item = Token>) -> String {
    tokens.into_iter().map(|t| t.to_string()).collect::<Vec<_>>().join(" ")
}

#[test]
fn test_mixed_input() {
    let tokenizer = arith();
    let tokens = tokenizer.tokens("x1 = 3.25 * (y + 10)");
    insta::assert_snapshot!(
        render(tokens),
        @"ident(x1) char(=) real(3.25) char(*) char(() ident(y) char(+) int(10) char())"
    );
}

#[test]
fn test_lookahead_rules_feed_a_grammar() {
    let tokenizer = Tokenizer::new([
        (r"\d+\.\d+", "real"),
        (r"\d+(?!\.\d)", "int"),
        (r"[+\-*/]", "op"),
    ])
    .unwrap();
    insta::assert_snapshot!(
        render(tokenizer.tokens("1 + 1.0 - 2")),
        @"int(1) op(+) real(1.0) op(-) int(2)"
    );
    let number = kind("int") | kind("real");
    let sum = number.clone() - (kind("op") - number).many();
    let mut ts = tokenizer.tokenize("1 + 1.0 - 2");
    assert!(sum.parse_stream(&mut ts).is_some());
    assert!(ts.is_exhausted());
}

#[test]
fn test_tokens_serialize_as_records() {
    let tokens: Vec<Token> = arith().tokens("a 1").collect();
    let json = serde_json::to_value(&tokens).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"kind": "ident", "value": "a"},
            {"kind": "int", "value": "1"},
        ])
    );
    let back: Vec<Token> = serde_json::from_value(json).unwrap();
    assert_eq!(back, tokens);
}

#[test]
fn test_stream_feeds_a_parser() {
    let assign = kind("ident") - token("=") - (kind("int") | kind("real"));
    let mut ts = arith().tokenize("rate = 0.5 rest");
    let captured = assign.label("all").map(|m| m.label("all").unwrap_or(Value::Nil));
    assert_eq!(
        captured.parse_stream(&mut ts),
        Some(Value::List(vec![
            Value::Token(Token::new("ident", "rate")),
            Value::Token(Token::new(Token::CHAR_KIND, "=")),
            Value::Token(Token::new("real", "0.5")),
        ]))
    );
    assert_eq!(ts.remaining(), vec![Token::new("ident", "rest")]);
}

#[test]
fn test_blank_input() {
    assert_eq!(arith().tokens("   \n\t ").count(), 0);
    assert!(arith().tokenize("").is_exhausted());
}

#[test]
fn test_bad_ignore_pattern() {
    let result = Tokenizer::builder().rule("a", "a").ignore(Some("(")).build();
    assert!(matches!(result, Err(Error::InvalidPattern { pattern, .. }) if pattern == "("));
}
