//! Errors raised while assembling. Every one of them aborts the run.
use std::fmt;

use thiserror::Error;

use super::token::Where;

/// Broad classification of an [`Error`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    Lex,
    Symbol,
    Syntax,
    Internal,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::Lex      => "lex",
            ErrorKind::Symbol   => "symbol",
            ErrorKind::Syntax   => "syntax",
            ErrorKind::Internal => "internal",
            ErrorKind::Io       => "I/O",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{at}: {message}")]
    Lex { at: Where, message: String },

    #[error("{at}: redefinition of label '{name}'")]
    LabelRedefined { at: Where, name: String },

    #[error("{at}: redefinition of variable '{name}'")]
    VariableRedefined { at: Where, name: String },

    #[error("{at}: label '{name}' already exists")]
    LabelExists { at: Where, name: String },

    #[error("{at}: '{name}' is an instruction and cannot name a variable")]
    ReservedName { at: Where, name: String },

    #[error("{at}: address name '{name}' was not declared")]
    Undeclared { at: Where, name: String },

    #[error("program entry point label 'entry' not found")]
    MissingEntry,

    #[error("{at}: unexpected {found}")]
    Unexpected { at: Where, found: String },

    #[error("{at}: '{name}' is not an instruction")]
    NotAnInstruction { at: Where, name: String },

    #[error("{at}: instruction '{name}' expects an argument")]
    ExpectsArgument { at: Where, name: String },

    #[error("{at}: instruction '{name}' expects no arguments")]
    ExpectsNoArguments { at: Where, name: String },

    #[error("{at}: expected argument, got {found}")]
    ExpectedArgument { at: Where, found: String },

    #[error("{at}: expected variable identifier, got {found}")]
    ExpectedIdentifier { at: Where, found: String },

    #[error("{at}: expected data element size (sz8/sz16/sz32/sz64), got {found}")]
    ExpectedSize { at: Where, found: String },

    #[error("{at}: expected data, got {found}")]
    ExpectedData { at: Where, found: String },

    #[error("{at}: internal error: {message}")]
    Internal { at: Where, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            Lex { .. } => ErrorKind::Lex,

            LabelRedefined { .. } |
            VariableRedefined { .. } |
            LabelExists { .. } |
            ReservedName { .. } |
            Undeclared { .. } |
            MissingEntry => ErrorKind::Symbol,

            Unexpected { .. } |
            NotAnInstruction { .. } |
            ExpectsArgument { .. } |
            ExpectsNoArguments { .. } |
            ExpectedArgument { .. } |
            ExpectedIdentifier { .. } |
            ExpectedSize { .. } |
            ExpectedData { .. } => ErrorKind::Syntax,

            Internal { .. } => ErrorKind::Internal,
            Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_display() {
        let at = Where::new(Rc::from("a.asm"), 3, 5);
        let err = Error::LabelRedefined { at, name: "loop".to_owned() };
        assert_eq!(err.to_string(), "a.asm:3:5: redefinition of label 'loop'");
        assert_eq!(err.kind(), ErrorKind::Symbol);
        assert_eq!(err.kind().to_string(), "symbol");

        let err = Error::MissingEntry;
        assert_eq!(err.to_string(), "program entry point label 'entry' not found");
        assert_eq!(err.kind(), ErrorKind::Symbol);
    }

    #[test]
    fn test_io_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from(io);
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "denied");
    }
}
