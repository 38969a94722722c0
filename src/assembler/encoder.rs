//! The compilation pass.
//!
//! Walks the token stream left behind by the resolver with a single token
//! of lookahead, emitting one instruction record per instruction and laying
//! out `let` variables in the memory region:
//!
//! ```nasm
//! let name sz8  1, 2, 3        ; three bytes
//! let text sz16 "ab", 0        ; every character takes two bytes
//! ```
//!
//! Variables are bound when their declaration is reached, so unlike labels
//! they cannot be referenced before they are declared.
use std::collections::HashMap;
use std::rc::Rc;

use super::error::Error;
use super::isa::{self, Record, Word};
use super::resolver::Labels;
use super::token::{parse_int, Token, TokenKind, Where};

pub type Variables = HashMap<String, Word>;

#[derive(Debug, Default)]
pub struct Encoding {
    pub memory:    Vec<u8>,
    pub program:   Vec<Record>,
    pub variables: Variables,
}

/// Runs the compilation pass over a resolved token stream.
pub fn encode(tokens: &[Token], labels: &Labels) -> Result<Encoding, Error> {
    Encoder::new(tokens, labels).run()
}

pub struct Encoder<'a> {
    tokens: &'a [Token],
    pos:    usize,
    labels: &'a Labels,
    eof:    Token,
    out:    Encoding,
}

impl<'a> Encoder<'a> {
    pub fn new(tokens: &'a [Token], labels: &'a Labels) -> Self {
        // Stands in for the end marker should the stream lack one.
        let eof = match tokens.last() {
            Some(tok) => Token::eof(tok.at.clone()),
            None => Token::eof(Where::new(Rc::from(""), 0, 0)),
        };
        Encoder { tokens, pos: 0, labels, eof, out: Encoding::default() }
    }

    /// Run the encoder, consuming itself and returning the encoded regions.
    pub fn run(mut self) -> Result<Encoding, Error> {
        loop {
            let tok = self.current();
            match tok.kind {
                TokenKind::Word => self.instruction()?,
                TokenKind::Let  => self.variable()?,
                TokenKind::Eof  => break,
                _ => {
                    return Err(Error::Unexpected { at: tok.at.clone(), found: tok.to_string() });
                }
            }
        }

        debug!(
            "encoded {} instruction(s), {} byte(s) of memory, {} variable(s)",
            self.out.program.len(),
            self.out.memory.len(),
            self.out.variables.len()
        );
        Ok(self.out)
    }

    fn instruction(&mut self) -> Result<(), Error> {
        let tok = self.current().clone();

        let ins = match isa::lookup(&tok.data) {
            Some(ins) => ins,
            None => return Err(Error::NotAnInstruction { at: tok.at, name: tok.data }),
        };

        self.advance();
        let arg = self.current();
        if !arg.is_arg() {
            if ins.has_arg {
                return Err(Error::ExpectsArgument { at: tok.at, name: tok.data });
            }

            self.emit(ins.opcode, 0);
            return Ok(());
        } else if !ins.has_arg {
            return Err(Error::ExpectsNoArguments { at: tok.at, name: tok.data });
        }

        let operand = self.arg_to_word(arg)?;
        self.advance();

        self.emit(ins.opcode, operand);
        Ok(())
    }

    fn variable(&mut self) -> Result<(), Error> {
        self.advance();
        let tok = self.current().clone();
        if tok.kind != TokenKind::Word {
            return Err(Error::ExpectedIdentifier { at: tok.at.clone(), found: tok.to_string() });
        }

        let name = tok.data;
        if self.out.variables.contains_key(&name) {
            return Err(Error::VariableRedefined { at: tok.at, name });
        }
        if self.labels.contains_key(&name) {
            return Err(Error::LabelExists { at: tok.at, name });
        }
        if isa::lookup(&name).is_some() {
            return Err(Error::ReservedName { at: tok.at, name });
        }

        let address = self.out.memory.len() as Word;
        debug!("variable '{}' => 0x{:X}", name, address);
        self.out.variables.insert(name, address);

        self.advance();
        let size_tok = self.current();
        let size = match size_tok.kind.element_size() {
            Some(size) => size,
            None => {
                return Err(Error::ExpectedSize { at: size_tok.at.clone(), found: size_tok.to_string() });
            }
        };

        self.advance();
        loop {
            let item = self.current().clone();
            if item.kind == TokenKind::Str {
                for ch in item.data.chars() {
                    self.write_memory(ch as Word, size);
                }
            } else if item.is_arg() {
                let data = self.arg_to_word(&item)?;
                self.write_memory(data, size);
            } else {
                return Err(Error::ExpectedData { at: item.at.clone(), found: item.to_string() });
            }

            self.advance();
            if self.current().kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }

        Ok(())
    }

    /// Converts an argument-shaped token to the word it denotes.
    fn arg_to_word(&self, tok: &Token) -> Result<Word, Error> {
        match tok.kind {
            TokenKind::Dec | TokenKind::Hex | TokenKind::Oct | TokenKind::Bin => {
                parse_int(tok.kind, &tok.data).ok_or_else(|| Error::Internal {
                    at: tok.at.clone(),
                    message: format!("malformed {} literal '{}'", tok.kind, tok.data),
                })
            }

            TokenKind::Char => {
                let mut chars = tok.data.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Ok(ch as Word),
                    _ => Err(Error::Internal {
                        at: tok.at.clone(),
                        message: format!("character literal '{}' is not a single character", tok.data),
                    }),
                }
            }

            TokenKind::Float => tok.data.parse::<f64>().map(f64::to_bits).map_err(|_| Error::Internal {
                at: tok.at.clone(),
                message: format!("malformed float literal '{}'", tok.data),
            }),

            TokenKind::Addr => self
                .labels
                .get(&tok.data)
                .or_else(|| self.out.variables.get(&tok.data))
                .copied()
                .ok_or_else(|| Error::Undeclared { at: tok.at.clone(), name: tok.data.clone() }),

            _ => Err(Error::ExpectedArgument { at: tok.at.clone(), found: tok.to_string() }),
        }
    }

    /// Appends the low `size` bytes of `data` to memory, big-endian.
    fn write_memory(&mut self, data: Word, size: usize) {
        let bytes = data.to_be_bytes();
        self.out.memory.extend_from_slice(&bytes[bytes.len() - size..]);
    }

    fn emit(&mut self, opcode: u8, operand: Word) {
        self.out.program.push(Record { opcode, operand });
    }

    #[inline]
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    /// Moves to the next token. Never moves past the end marker.
    #[inline]
    fn advance(&mut self) {
        if self.current().kind != TokenKind::Eof {
            self.pos += 1;
        }
    }
}
