//! The preprocessing pass.
//!
//! Binds every label to the instruction slot it precedes and strips the
//! label declarations out of the token stream, so that the encoder only
//! ever sees instructions, their arguments and variable declarations.
use std::collections::HashMap;

use super::error::Error;
use super::isa::{self, Word};
use super::token::{Token, TokenKind, Where};

pub type Labels = HashMap<String, Word>;

/// Name of the label execution starts at.
pub const ENTRY_LABEL: &str = "entry";

#[derive(Debug)]
pub struct Resolution {
    pub labels:       Labels,
    /// The filtered stream, always terminated by an `Eof` token.
    pub tokens:       Vec<Token>,
    pub program_size: Word,
    pub entry_point:  Word,
}

/// Runs the preprocessing pass over a token stream.
pub fn resolve<I>(tokens: I) -> Result<Resolution, Error>
where
    I: IntoIterator<Item = Token>,
{
    let mut labels = Labels::new();
    let mut out: Vec<Token> = Vec::new();
    let mut slot: Word = 0;
    let mut eof: Option<Token> = None;
    let mut last_at: Option<Where> = None;

    for tok in tokens {
        last_at = Some(tok.at.clone());
        match tok.kind {
            TokenKind::Error => {
                return Err(Error::Lex { at: tok.at, message: tok.data });
            }

            TokenKind::Label => {
                if labels.contains_key(&tok.data) {
                    return Err(Error::LabelRedefined { at: tok.at, name: tok.data });
                }
                debug!("label '{}' => slot {}", tok.data, slot);
                labels.insert(tok.data, slot);
                continue;
            }

            TokenKind::Eof => {
                eof = Some(tok);
                break;
            }

            TokenKind::Word if isa::lookup(&tok.data).is_some() => slot += 1,

            _ => {}
        }

        out.push(tok);
    }

    let entry_point = *labels.get(ENTRY_LABEL).ok_or(Error::MissingEntry)?;

    // A stream without an end marker still gets one, placed at its last token.
    let eof = match (eof, last_at) {
        (Some(tok), _) => tok,
        (None, Some(at)) => Token::eof(at),
        (None, None) => return Err(Error::MissingEntry),
    };
    out.push(eof);

    debug!("program size: {} instruction(s), entry point: {}", slot, entry_point);

    Ok(Resolution {
        labels,
        tokens: out,
        program_size: slot,
        entry_point,
    })
}
