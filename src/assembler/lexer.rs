//! This lexer tokenizes AVM assembly.
//!
//! Malformed input never stops the lexer: it is reported as an
//! `Error` token carrying the message, and the resolver decides what to
//! do with it.
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::token::{parse_int, Token, TokenKind, Where};

static IDENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex"));
static DEC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("Invalid decimal regex"));
static HEX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0[xX](?P<digits>[0-9a-fA-F]+)$").expect("Invalid hex regex"));
static OCT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0[oO](?P<digits>[0-7]+)$").expect("Invalid octal regex"));
static BIN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0[bB](?P<digits>[01]+)$").expect("Invalid binary regex"));
static FLOAT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+\.[0-9]+$").expect("Invalid float regex"));

/// Tokenizes a whole source file. The result always ends with an `Eof` token.
pub fn tokenize(source: &str, path: &str) -> Vec<Token> {
    let path: Rc<str> = Rc::from(path);
    let mut tokens: Vec<Token> = Vec::with_capacity(256);
    let mut line_count = 0;

    for (index, line) in source.lines().enumerate() {
        tokens.append(&mut tokenize_line(line, index + 1, &path));
        line_count = index + 1;
    }

    let errors = tokens.iter().filter(|t| t.kind == TokenKind::Error).count();
    if errors > 0 {
        debug!("{} lexer error(s) in {}", errors, path);
    }

    tokens.push(Token::eof(Where::new(path, line_count + 1, 1)));
    tokens
}

fn tokenize_line(line: &str, line_num: usize, path: &Rc<str>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::new();
    let chars: Vec<char> = line.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let at = Where::new(path.clone(), line_num, i + 1);
        match chars[i] {
            ';' => break,
            c if c.is_whitespace() => i += 1,
            ',' => {
                out.push(Token::new(TokenKind::Comma, ",", at));
                i += 1;
            }
            '"' => {
                let (result, next) = quoted(&chars, i);
                i = next;
                out.push(match result {
                    Ok(s) => Token::new(TokenKind::Str, s, at),
                    Err(e) => Token::new(TokenKind::Error, e, at),
                });
            }
            '\'' => {
                let (result, next) = quoted(&chars, i);
                i = next;
                out.push(match result {
                    Ok(s) if s.chars().count() == 1 => Token::new(TokenKind::Char, s, at),
                    Ok(s) => Token::new(
                        TokenKind::Error,
                        format!("character literal must hold exactly one character, got '{}'", s),
                        at,
                    ),
                    Err(e) => Token::new(TokenKind::Error, e, at),
                });
            }
            _ => {
                let start = i;
                while i < chars.len() && !is_boundary(chars[i]) {
                    i += 1;
                }
                let chunk: String = chars[start..i].iter().collect();
                out.push(classify(&chunk, at));
            }
        }
    }

    out
}

/// Characters that end a bare chunk.
fn is_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ';' | '"' | '\'')
}

/// Reads a quoted literal starting at the opening quote in `chars[start]`.
/// Returns the unescaped contents and the index just past the closing quote.
fn quoted(chars: &[char], start: usize) -> (Result<String, String>, usize) {
    let quote = chars[start];
    let what = if quote == '"' { "string" } else { "character" };
    let mut sb = String::new();

    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            c if c == quote => return (Ok(sb), i + 1),
            '\\' => {
                i += 1;
                let escaped = match chars.get(i) {
                    Some('n')  => '\n',
                    Some('t')  => '\t',
                    Some('r')  => '\r',
                    Some('0')  => '\0',
                    Some('\\') => '\\',
                    Some('\'') => '\'',
                    Some('"')  => '"',
                    Some(c) => {
                        return (Err(format!("unknown escape sequence '\\{}'", c)), skip_to_quote(chars, i, quote))
                    }
                    None => break,
                };
                sb.push(escaped);
            }
            c => sb.push(c),
        }
        i += 1;
    }

    (Err(format!("unterminated {} literal", what)), chars.len())
}

fn skip_to_quote(chars: &[char], from: usize, quote: char) -> usize {
    chars[from..]
        .iter()
        .position(|c| *c == quote)
        .map(|p| from + p + 1)
        .unwrap_or_else(|| chars.len())
}

fn classify(chunk: &str, at: Where) -> Token {
    if let Some(name) = chunk.strip_suffix(':') {
        if IDENT_REGEX.is_match(name) {
            return Token::new(TokenKind::Label, name, at);
        }
    }

    if let Some(name) = chunk.strip_prefix('&') {
        if IDENT_REGEX.is_match(name) {
            return Token::new(TokenKind::Addr, name, at);
        }
    }

    match chunk {
        "let"  => return Token::new(TokenKind::Let, chunk, at),
        "sz8"  => return Token::new(TokenKind::Size8, chunk, at),
        "sz16" => return Token::new(TokenKind::Size16, chunk, at),
        "sz32" => return Token::new(TokenKind::Size32, chunk, at),
        "sz64" => return Token::new(TokenKind::Size64, chunk, at),
        _ => {}
    }

    if DEC_REGEX.is_match(chunk) {
        return integer(TokenKind::Dec, chunk, chunk, at);
    }

    for (regex, kind) in &[(&HEX_REGEX, TokenKind::Hex),
                           (&OCT_REGEX, TokenKind::Oct),
                           (&BIN_REGEX, TokenKind::Bin)] {
        if let Some(caps) = regex.captures(chunk) {
            return integer(*kind, &caps["digits"], chunk, at);
        }
    }

    if FLOAT_REGEX.is_match(chunk) {
        return Token::new(TokenKind::Float, chunk, at);
    }

    if IDENT_REGEX.is_match(chunk) {
        return Token::new(TokenKind::Word, chunk, at);
    }

    Token::new(TokenKind::Error, format!("unexpected '{}'", chunk), at)
}

fn integer(kind: TokenKind, digits: &str, chunk: &str, at: Where) -> Token {
    match parse_int(kind, digits) {
        Some(_) => Token::new(kind, digits, at),
        None => Token::new(
            TokenKind::Error,
            format!("integer literal '{}' does not fit in 64 bits", chunk),
            at,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn at() -> Where {
        Where::new(Rc::from("t.asm"), 1, 1)
    }

    #[test]
    fn test_classify() {
        let cases = [
            ("entry:", TokenKind::Label, "entry"),
            ("&loop", TokenKind::Addr, "loop"),
            ("let", TokenKind::Let, "let"),
            ("sz8", TokenKind::Size8, "sz8"),
            ("sz16", TokenKind::Size16, "sz16"),
            ("sz32", TokenKind::Size32, "sz32"),
            ("sz64", TokenKind::Size64, "sz64"),
            ("255", TokenKind::Dec, "255"),
            ("-12", TokenKind::Dec, "-12"),
            ("0xff", TokenKind::Hex, "ff"),
            ("0XFF", TokenKind::Hex, "FF"),
            ("0o377", TokenKind::Oct, "377"),
            ("0b11111111", TokenKind::Bin, "11111111"),
            ("1.5", TokenKind::Float, "1.5"),
            ("-0.25", TokenKind::Float, "-0.25"),
            ("psh", TokenKind::Word, "psh"),
            ("my_var2", TokenKind::Word, "my_var2"),
        ];
        for (chunk, kind, data) in cases.iter() {
            let tok = classify(chunk, at());
            assert_eq!(tok.kind, *kind, "classifying {}", chunk);
            assert_eq!(tok.data, *data, "classifying {}", chunk);
        }

        for chunk in &["0xfg", "0o8", "0b102", "1.", "9lives", "&", "&1x", ":", "a:b", "$"] {
            assert_eq!(classify(chunk, at()).kind, TokenKind::Error, "classifying {}", chunk);
        }
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(classify("18446744073709551615", at()).kind, TokenKind::Dec);
        assert_eq!(classify("18446744073709551616", at()).kind, TokenKind::Error);
        assert_eq!(classify("0xffffffffffffffff", at()).kind, TokenKind::Hex);
        assert_eq!(classify("0x10000000000000000", at()).kind, TokenKind::Error);
    }

    #[test]
    fn test_tokenize_line() {
        let path: Rc<str> = Rc::from("t.asm");
        let toks = tokenize_line("  psh 0x56 ; push something", 4, &path);
        assert_eq!(kinds(&toks), vec![TokenKind::Word, TokenKind::Hex]);
        assert_eq!(toks[0].at, Where::new(path.clone(), 4, 3));
        assert_eq!(toks[1].at, Where::new(path.clone(), 4, 7));

        let toks = tokenize_line("let msg sz8 \"Hi, there\\n\",10,'a'", 1, &path);
        assert_eq!(
            kinds(&toks),
            vec![TokenKind::Let, TokenKind::Word, TokenKind::Size8, TokenKind::Str,
                 TokenKind::Comma, TokenKind::Dec, TokenKind::Comma, TokenKind::Char]
        );
        assert_eq!(toks[3].data, "Hi, there\n");
        assert_eq!(toks[7].data, "a");

        let toks = tokenize_line("loop: jmp &loop", 1, &path);
        assert_eq!(kinds(&toks), vec![TokenKind::Label, TokenKind::Word, TokenKind::Addr]);
    }

    #[test]
    fn test_quoted_errors() {
        let path: Rc<str> = Rc::from("t.asm");

        let toks = tokenize_line("let s sz8 \"open", 1, &path);
        assert_eq!(toks[3].kind, TokenKind::Error);
        assert_eq!(toks[3].data, "unterminated string literal");

        let toks = tokenize_line("psh 'ab'", 1, &path);
        assert_eq!(toks[1].kind, TokenKind::Error);

        let toks = tokenize_line("psh '\\q' hlt", 1, &path);
        assert_eq!(kinds(&toks), vec![TokenKind::Word, TokenKind::Error, TokenKind::Word]);

        let toks = tokenize_line("psh '\\''", 1, &path);
        assert_eq!(toks[1].kind, TokenKind::Char);
        assert_eq!(toks[1].data, "'");
    }

    #[test]
    fn test_tokenize() {
        let asm_input = "
        entry:
            psh 1
            psh 2 ; comment
            add
            hlt
        ";
        let toks = tokenize(asm_input, "t.asm");
        assert_eq!(
            kinds(&toks),
            vec![TokenKind::Label, TokenKind::Word, TokenKind::Dec, TokenKind::Word,
                 TokenKind::Dec, TokenKind::Word, TokenKind::Word, TokenKind::Eof]
        );
        assert_eq!(toks[0].at.line, 2);
        assert_eq!(toks[6].at.line, 6);

        let toks = tokenize("", "t.asm");
        assert_eq!(kinds(&toks), vec![TokenKind::Eof]);
    }
}
