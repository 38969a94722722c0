//! Tokens produced by the lexer and consumed by both assembler passes.
use std::fmt;
use std::rc::Rc;

/// A position in a source file. Lines and columns start at 1.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Where {
    pub path: Rc<str>,
    pub line: usize,
    pub col: usize,
}

impl Where {
    pub fn new(path: Rc<str>, line: usize, col: usize) -> Self {
        Where { path, line, col }
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.col)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Word,
    Label,
    Let,
    Size8,
    Size16,
    Size32,
    Size64,
    Dec,
    Hex,
    Oct,
    Bin,
    Char,
    Float,
    Str,
    Addr,
    Comma,
    Eof,
    Error,
}

impl TokenKind {
    /// Number of bytes a size specifier stands for.
    pub fn element_size(&self) -> Option<usize> {
        use TokenKind::*;
        match self {
            Size8  => Some(1),
            Size16 => Some(2),
            Size32 => Some(4),
            Size64 => Some(8),
            _      => None,
        }
    }

    /// Radix of an integer literal kind.
    pub fn radix(&self) -> Option<u32> {
        use TokenKind::*;
        match self {
            Dec => Some(10),
            Hex => Some(16),
            Oct => Some(8),
            Bin => Some(2),
            _   => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind::*;
        let name = match self {
            Word   => "word",
            Label  => "label",
            Let    => "keyword 'let'",
            Size8  => "size 'sz8'",
            Size16 => "size 'sz16'",
            Size32 => "size 'sz32'",
            Size64 => "size 'sz64'",
            Dec    => "decimal integer",
            Hex    => "hexadecimal integer",
            Oct    => "octal integer",
            Bin    => "binary integer",
            Char   => "character",
            Float  => "float",
            Str    => "string",
            Addr   => "address",
            Comma  => "','",
            Eof    => "end of file",
            Error  => "error",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub data: String,
    pub at:   Where,
}

impl Token {
    pub fn new(kind: TokenKind, data: impl Into<String>, at: Where) -> Self {
        Token { kind, data: data.into(), at }
    }

    pub fn eof(at: Where) -> Self {
        Token::new(TokenKind::Eof, "", at)
    }

    /// Whether the token can stand as an instruction argument or a data item.
    pub fn is_arg(&self) -> bool {
        use TokenKind::*;
        matches!(self.kind, Dec | Hex | Oct | Bin | Char | Float | Addr)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            TokenKind::Eof | TokenKind::Comma | TokenKind::Let |
            TokenKind::Size8 | TokenKind::Size16 |
            TokenKind::Size32 | TokenKind::Size64 => write!(f, "{}", self.kind),
            _ => write!(f, "{} '{}'", self.kind, self.data),
        }
    }
}

/// Parses the payload of an integer literal of the given kind.
///
/// Decimal literals may be negative and are reinterpreted as two's
/// complement. Returns `None` when the text does not fit in 64 bits.
pub fn parse_int(kind: TokenKind, text: &str) -> Option<u64> {
    let radix = kind.radix()?;
    if radix == 10 {
        text.parse::<i64>()
            .map(|v| v as u64)
            .or_else(|_| text.parse::<u64>())
            .ok()
    } else {
        u64::from_str_radix(text, radix).ok()
    }
}
