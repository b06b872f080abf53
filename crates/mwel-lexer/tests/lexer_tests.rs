//! Lexer behavior tests: error recovery, whitespace and newline handling,
//! grouping states, number fragments, and the four string syntaxes.

use mwel_error::ErrorCollector;
use mwel_lexer::{AugAssignOp, Dialect, Lexer, Token, TokenKind};
use pretty_assertions::assert_eq;

fn lex(source: &str) -> (Vec<Token>, ErrorCollector) {
    let mut errors = ErrorCollector::new();
    let tokens = Lexer::new(&mut errors).tokenize(source);
    (tokens, errors)
}

fn lex_jel(source: &str) -> (Vec<Token>, ErrorCollector) {
    let mut errors = ErrorCollector::new();
    let tokens = Lexer::with_dialect(Dialect::Jel, &mut errors).tokenize(source);
    (tokens, errors)
}

fn number_kind(int: &str) -> TokenKind {
    TokenKind::Number(mwel_lexer::NumberParts {
        int: int.into(),
        frac: "".into(),
        exp: "".into(),
        tag: "".into(),
    })
}

/// Walk tokens and error records in lockstep against an expectation script.
struct Expect<'a> {
    tokens: std::vec::IntoIter<Token>,
    errors: std::collections::VecDeque<mwel_error::ErrorRecord>,
    source: &'a str,
}

impl<'a> Expect<'a> {
    fn new(source: &'a str, dialect: Dialect) -> Self {
        let mut sink = ErrorCollector::new();
        let tokens = Lexer::with_dialect(dialect, &mut sink).tokenize(source);
        Expect {
            tokens: tokens.into_iter(),
            errors: sink.into_records().into(),
            source,
        }
    }

    fn token(&mut self, kind: TokenKind, text: &str) -> Token {
        let token = self.tokens.next().unwrap_or_else(|| panic!("expected {kind:?}, ran out of tokens"));
        assert_eq!(kind, token.kind, "token kind in {:?}", self.source);
        assert_eq!(text, &*token.text, "token text in {:?}", self.source);
        token
    }

    fn token_at(&mut self, kind: TokenKind, text: &str, line: u32) -> Token {
        let token = self.token(kind, text);
        assert_eq!(line, token.position.line, "line of {text:?} in {:?}", self.source);
        token
    }

    fn identifier(&mut self, name: &str) {
        self.token(TokenKind::Identifier(name.into()), name);
    }

    fn number(&mut self, text: &str, int: &str, frac: &str, exp: &str, tag: &str) {
        let token = self.tokens.next().unwrap_or_else(|| panic!("expected number, ran out of tokens"));
        assert_eq!(text, &*token.text);
        match &token.kind {
            TokenKind::Number(parts) => {
                assert_eq!(int, &*parts.int, "int of {text:?}");
                assert_eq!(frac, &*parts.frac, "frac of {text:?}");
                assert_eq!(exp, &*parts.exp, "exp of {text:?}");
                assert_eq!(tag, &*parts.tag, "tag of {text:?}");
            }
            other => panic!("expected number token for {text:?}, got {other:?}"),
        }
    }

    fn string(&mut self, value: &str) -> Token {
        let token = self.tokens.next().unwrap_or_else(|| panic!("expected string, ran out of tokens"));
        match &token.kind {
            TokenKind::String(actual) => assert_eq!(value, &**actual),
            other => panic!("expected string token, got {other:?}"),
        }
        token
    }

    fn error(&mut self, token: &str) {
        let record = self.errors.pop_front().unwrap_or_else(|| panic!("expected an error for {token:?}"));
        assert_eq!(Some(token.to_owned()), record.token, "offending token");
    }

    fn error_at(&mut self, token: &str, line: u32) {
        let record = self.errors.pop_front().unwrap_or_else(|| panic!("expected an error for {token:?}"));
        assert_eq!(Some(token.to_owned()), record.token);
        assert_eq!(Some(line), record.position.map(|p| p.line));
    }

    fn finish(mut self) {
        let extra: Vec<Token> = self.tokens.by_ref().collect();
        assert!(extra.is_empty(), "unexpected trailing tokens: {extra:?}");
        assert!(self.errors.is_empty(), "unexpected trailing errors: {:?}", self.errors);
    }
}

#[test]
fn illegal_characters_are_skipped() {
    let mut t = Expect::new("1 2 $@ & 3 4 #", Dialect::Jel);
    t.number("1", "1", "", "", "");
    t.number("2", "2", "", "", "");
    t.error("$");
    t.error("@");
    t.error("&");
    t.number("3", "3", "", "", "");
    t.number("4", "4", "", "", "");
    t.error("#");
    t.finish();
}

#[test]
fn whitespace_handling() {
    // Linefeed is a token; space, tab, and carriage return are ignored;
    // form feed and vertical tab are invalid.
    let mut t = Expect::new("  \n\t\t 1 2 \u{c} 3 \r \u{b}\r \n\n\n 4  \t", Dialect::Mwel);
    t.token_at(TokenKind::Newline, "\n", 1);
    t.number("1", "1", "", "", "");
    t.number("2", "2", "", "", "");
    t.error("\u{c}");
    t.number("3", "3", "", "", "");
    t.error("\u{b}");
    t.token_at(TokenKind::Newline, "\n\n\n", 2);
    t.number("4", "4", "", "", "");
    t.finish();
}

#[test]
fn escaped_newlines_are_suppressed() {
    let mut t = Expect::new("\n \n\n \\\n\n \\   \t  \n 3  \\  \u{c} 4  \n5", Dialect::Mwel);
    t.token_at(TokenKind::Newline, "\n", 1);
    t.token_at(TokenKind::Newline, "\n\n", 2);
    // Escaped newline, no token
    t.token_at(TokenKind::Newline, "\n", 5);
    // Escaped newline, no token
    let three = t.token(number_kind("3"), "3");
    assert_eq!(7, three.position.line);
    t.error("\u{c}");
    t.error("4");
    // Escaped newline, no token
    let five = t.token(number_kind("5"), "5");
    assert_eq!(8, five.position.line);
    t.finish();
}

#[test]
fn groupings_suppress_newlines_and_recover_from_mismatches() {
    let mut t = Expect::new(
        "\n ( \n ) \n [ \n\n ] \n { \n \n \n } \n \
         \n ( \n [ \n { \n } \n ] \n ) \n \
         \n ( \n ] \n } \n ) \n \
         \n [ \n ) \n } \n ] \n \
         \n { \n ) \n ] \n } \n ",
        Dialect::Mwel,
    );
    t.token_at(TokenKind::Newline, "\n", 1);
    t.token_at(TokenKind::LeftParen, "(", 2);
    t.token_at(TokenKind::RightParen, ")", 3);
    t.token_at(TokenKind::Newline, "\n", 3);
    t.token_at(TokenKind::LeftBracket, "[", 4);
    t.token_at(TokenKind::RightBracket, "]", 6);
    t.token_at(TokenKind::Newline, "\n", 6);
    t.token_at(TokenKind::LeftBrace, "{", 7);
    t.token_at(TokenKind::RightBrace, "}", 10);
    t.token_at(TokenKind::Newline, "\n", 10);

    t.token(TokenKind::Newline, "\n");
    t.token(TokenKind::LeftParen, "(");
    t.token(TokenKind::LeftBracket, "[");
    t.token(TokenKind::LeftBrace, "{");
    t.token(TokenKind::RightBrace, "}");
    t.token(TokenKind::RightBracket, "]");
    t.token(TokenKind::RightParen, ")");
    t.token(TokenKind::Newline, "\n");

    t.token(TokenKind::Newline, "\n");
    t.token(TokenKind::LeftParen, "(");
    t.error("]");
    t.error("}");
    t.token(TokenKind::RightParen, ")");
    t.token(TokenKind::Newline, "\n");

    t.token(TokenKind::Newline, "\n");
    t.token(TokenKind::LeftBracket, "[");
    t.error(")");
    t.error("}");
    t.token(TokenKind::RightBracket, "]");
    t.token(TokenKind::Newline, "\n");

    t.token(TokenKind::Newline, "\n");
    t.token(TokenKind::LeftBrace, "{");
    t.error(")");
    t.error("]");
    t.token(TokenKind::RightBrace, "}");
    t.token(TokenKind::Newline, "\n");
    t.finish();
}

#[test]
fn operators() {
    let mut t = Expect::new("+ - : , <= < >= > == != . * / % **", Dialect::Jel);
    t.token(TokenKind::Plus, "+");
    t.token(TokenKind::Minus, "-");
    t.token(TokenKind::Colon, ":");
    t.token(TokenKind::Comma, ",");
    t.token(TokenKind::LessThanOrEqual, "<=");
    t.token(TokenKind::LessThan, "<");
    t.token(TokenKind::GreaterThanOrEqual, ">=");
    t.token(TokenKind::GreaterThan, ">");
    t.token(TokenKind::Equal, "==");
    t.token(TokenKind::NotEqual, "!=");
    t.token(TokenKind::Dot, ".");
    t.token(TokenKind::Times, "*");
    t.token(TokenKind::Divide, "/");
    t.token(TokenKind::Modulo, "%");
    t.token(TokenKind::Power, "**");
    t.finish();
}

#[test]
fn identifiers() {
    let mut t = Expect::new("a A z Z foo Bar12 FOO_bar _ _foo _f1 F_0_9 2_ 23foo", Dialect::Jel);
    for name in ["a", "A", "z", "Z", "foo", "Bar12", "FOO_bar", "_", "_foo", "_f1", "F_0_9"] {
        t.identifier(name);
    }
    // Tags start with a letter, so the underscore is its own identifier...
    t.number("2", "2", "", "", "");
    t.identifier("_");
    // ...but digits may continue a tag.
    t.number("23foo", "23", "", "", "foo");
    t.finish();
}

#[test]
fn jel_keywords() {
    let mut t = Expect::new("and false in not null or true And andyet andnot", Dialect::Jel);
    t.token(TokenKind::And, "and");
    t.token(TokenKind::False, "false");
    t.token(TokenKind::In, "in");
    t.token(TokenKind::Not, "not");
    t.token(TokenKind::Null, "null");
    t.token(TokenKind::Or, "or");
    t.token(TokenKind::True, "true");
    t.identifier("And");
    t.identifier("andyet");
    t.identifier("andnot");
    t.finish();
}

#[test]
fn mwel_keywords() {
    let mut t = Expect::new("else end function local return", Dialect::Mwel);
    t.token(TokenKind::Else, "else");
    t.token(TokenKind::End, "end");
    t.token(TokenKind::Function, "function");
    t.token(TokenKind::Local, "local");
    t.token(TokenKind::Return, "return");
    t.finish();
}

#[test]
fn mwel_assignment_operators() {
    let mut t = Expect::new("= -= += *= /= %= **= <- ->", Dialect::Mwel);
    t.token(TokenKind::Assign, "=");
    t.token(TokenKind::AugAssign(AugAssignOp::Sub), "-=");
    t.token(TokenKind::AugAssign(AugAssignOp::Add), "+=");
    t.token(TokenKind::AugAssign(AugAssignOp::Mul), "*=");
    t.token(TokenKind::AugAssign(AugAssignOp::Div), "/=");
    t.token(TokenKind::AugAssign(AugAssignOp::Mod), "%=");
    t.token(TokenKind::AugAssign(AugAssignOp::Pow), "**=");
    t.token(TokenKind::LeftArrow, "<-");
    t.token(TokenKind::RightArrow, "->");
    t.finish();
}

#[test]
fn mwel_comments_are_ignored() {
    let (tokens, errors) = lex("   # foo # 123 abc");
    assert!(tokens.is_empty());
    assert!(errors.is_empty());

    let mut t = Expect::new("1 # foo 123 abc\n# blah blah\n2", Dialect::Mwel);
    t.number("1", "1", "", "", "");
    t.token(TokenKind::Newline, "\n");
    t.token(TokenKind::Newline, "\n");
    t.number("2", "2", "", "", "");
    t.finish();
}

#[test]
fn number_fragments() {
    let mut t = Expect::new(
        "1 2 0 12 123 012 0.0 1.23 34.0567 .1 2. 0e0 1E23 1.2e+123 2.3E-00089 1.2e 2.4E 5",
        Dialect::Jel,
    );
    t.number("1", "1", "", "", "");
    t.number("2", "2", "", "", "");
    t.number("0", "0", "", "", "");
    t.number("12", "12", "", "", "");
    t.number("123", "123", "", "", "");

    // Zero is the only number whose integer part can have a leading '0',
    // so '012' is lexed as '0' and '12'
    t.number("0", "0", "", "", "");
    t.number("12", "12", "", "", "");

    t.number("0.0", "0", "0", "", "");
    t.number("1.23", "1", "23", "", "");
    t.number("34.0567", "34", "0567", "", "");

    // There must be at least one digit on either side of a decimal point,
    // so the '.' in '.1' and '2.' is lexed as a dot
    t.token(TokenKind::Dot, ".");
    t.number("1", "1", "", "", "");
    t.number("2", "2", "", "", "");
    t.token(TokenKind::Dot, ".");

    t.number("0e0", "0", "", "0", "");
    t.number("1E23", "1", "", "23", "");
    t.number("1.2e+123", "1", "2", "+123", "");
    t.number("2.3E-00089", "2", "3", "-00089", "");

    // There must be at least one digit after the 'e' or 'E', so the letter
    // is lexed as a tag in '1.2e' and '2.4E'
    t.number("1.2e", "1", "2", "", "e");
    t.number("2.4E", "2", "4", "", "E");
    t.number("5", "5", "", "", "");
    t.finish();
}

#[test]
fn number_tags() {
    let mut t = Expect::new("0s 1ms 2.3us 0.1e23MpS2 12a1B2c345 1.23E123E123", Dialect::Jel);
    t.number("0s", "0", "", "", "s");
    t.number("1ms", "1", "", "", "ms");
    t.number("2.3us", "2", "3", "", "us");
    t.number("0.1e23MpS2", "0", "1", "23", "MpS2");
    t.number("12a1B2c345", "12", "", "", "a1B2c345");
    t.number("1.23E123E123", "1", "23", "123", "E123");
    t.finish();
}

#[test]
fn single_line_strings() {
    let mut t = Expect::new(
        "'' ' ' 'foo' 'foo bar blah' 'can\\'t' '\"baz\"' 'foo\nbar'' \
         \"\" \" \" \"foo\" \"foo bar blah\" \"can\\\"t\" \"'baz'\" \"foo\nbar\"\"",
        Dialect::Jel,
    );
    t.string("");
    t.string(" ");
    t.string("foo");
    t.string("foo bar blah");
    t.string("can't");
    t.string("\"baz\"");

    // A raw newline terminates the string with an error; the partial value
    // is still emitted and lexing resumes on the next line.
    let partial = t.string("foo");
    assert_eq!(1, partial.position.line);
    t.error_at("\n", 1);
    let bar = t.tokens.next().unwrap_or_else(|| panic!("expected identifier"));
    assert_eq!(TokenKind::Identifier("bar".into()), bar.kind);
    assert_eq!(2, bar.position.line);
    t.string("");

    t.string("");
    t.string(" ");
    t.string("foo");
    t.string("foo bar blah");
    t.string("can\"t");
    t.string("'baz'");

    let partial = t.string("foo");
    assert_eq!(2, partial.position.line);
    t.error_at("\n", 2);
    let bar = t.tokens.next().unwrap_or_else(|| panic!("expected identifier"));
    assert_eq!(TokenKind::Identifier("bar".into()), bar.kind);
    assert_eq!(3, bar.position.line);
    t.string("");
    t.finish();
}

#[test]
fn multiline_strings() {
    let mut t = Expect::new(
        "'''''' ''' ''' '''foo''' '''foo\n'bar'\nblah''' \
         '''foo\\'''bar''' '''\"baz\"''' \
         \"\"\"\"\"\" \"\"\" \"\"\" \"\"\"foo\"\"\" \"\"\"foo\n\"bar\"\nblah\"\"\" \
         \"\"\"foo\\\"\"\"bar\"\"\"  \"\"\"'baz'\"\"\"",
        Dialect::Jel,
    );
    t.string("");
    t.string(" ");
    t.string("foo");
    let multi = t.string("foo\n'bar'\nblah");
    assert_eq!(1, multi.position.line);
    let escaped = t.string("foo'''bar");
    assert_eq!(3, escaped.position.line);
    t.string("\"baz\"");

    t.string("");
    t.string(" ");
    t.string("foo");
    let multi = t.string("foo\n\"bar\"\nblah");
    assert_eq!(3, multi.position.line);
    let escaped = t.string("foo\"\"\"bar");
    assert_eq!(5, escaped.position.line);
    t.string("'baz'");
    t.finish();
}

#[test]
fn string_whitespace_is_preserved() {
    for delim in ["'''", "\"\"\"", "'", "\""] {
        let source = format!("{delim} \t\r{delim}");
        let mut t = Expect::new(&source, Dialect::Jel);
        t.string(" \t\r");
        t.finish();
    }
}

#[test]
fn string_escape_sequences() {
    for delim in ["'''", "\"\"\"", "'", "\""] {
        let source = format!("{delim} \\z \\' \\\" \\\\ \\/ \\b \\f \\n \\r \\t \\u0061\\uD834\\udD1e\\u0062{delim}");
        let mut t = Expect::new(&source, Dialect::Jel);
        // The unknown escape '\z' is reported and the backslash is kept.
        t.error("\\");
        t.string(" \\z ' \" \\ / \u{8} \u{c} \n \r \t a\u{1D11E}b");
        t.finish();
    }
}

#[test]
fn unpaired_surrogates_are_reported() {
    let mut t = Expect::new("'a\\uD834b'", Dialect::Jel);
    t.error("\\");
    t.string("ab");
    t.finish();

    let mut t = Expect::new("'a\\uDC00b'", Dialect::Jel);
    t.error("\\");
    t.string("ab");
    t.finish();
}

#[test]
fn unterminated_string_at_end_of_input() {
    let (tokens, errors) = lex_jel("'abc");
    assert_eq!(1, tokens.len());
    assert!(matches!(&tokens[0].kind, TokenKind::String(value) if &**value == "abc"));
    assert_eq!(1, errors.len());
    assert_eq!("Unterminated string literal", errors.records()[0].message);
}

#[test]
fn every_token_position_is_a_real_source_position() {
    let source = "local a = {x: 1, y: '''two\nlines'''}\nb = a.x + 2.5ms\n";
    let (tokens, errors) = lex(source);
    assert!(errors.is_empty());

    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    for token in &tokens {
        let offset = line_starts[(token.position.line - 1) as usize] + token.position.column as usize;
        assert_eq!(
            &source[offset..offset + token.text.len()],
            &*token.text,
            "token {token:?} does not sit at its recorded position",
        );
    }
}
