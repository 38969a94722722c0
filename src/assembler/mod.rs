//! The Assembler module is in charge of taking an
//! AVM assembly file and producing the binary container
//! the virtual machine loads.
//!
//! It does this in two passes over the token stream: the
//! resolver binds labels and filters the stream, then the
//! encoder lays out memory and instruction records.

pub mod container;
pub mod encoder;
pub mod error;
pub mod isa;
pub mod lexer;
pub mod resolver;
pub mod token;

use container::Container;
use error::Error;
use isa::Word;
use token::Token;

/// Assembles a token stream into a container. Nothing is written anywhere;
/// a failure in either pass returns before a container exists.
pub fn assemble<I>(tokens: I) -> Result<Container, Error>
where
    I: IntoIterator<Item = Token>,
{
    let resolution = resolver::resolve(tokens)?;
    let encoding = encoder::encode(&resolution.tokens, &resolution.labels)?;

    debug_assert_eq!(encoding.program.len() as Word, resolution.program_size);

    Ok(Container {
        program_size: resolution.program_size,
        memory_size:  encoding.memory.len() as Word,
        entry_point:  resolution.entry_point,
        memory:       encoding.memory,
        program:      encoding.program,
    })
}
