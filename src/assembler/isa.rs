//! The AVM instruction set as seen by the assembler.
//!
//! Every instruction is encoded as a fixed 9 byte record: one opcode byte
//! followed by a big-endian 64-bit operand. Instructions that take no
//! argument carry a zero operand.
//!
//! ```nasm
//! let msg sz8 "Hi!", 10 ; memory data
//!
//! entry:
//!     psh 1.5           ; floats are stored as their IEEE-754 bits
//!     psh &msg          ; address of a variable or a label
//!     jmp &done         ; labels may be used before they are declared
//! done:
//!     hlt
//! ```

use std::fmt;

/// The unit of data storage and instruction operands.
pub type Word = u64;

/// Size in bytes of one encoded instruction record.
pub const RECORD_SIZE: usize = 9;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub opcode:  u8,
    pub has_arg: bool,
}

const fn op(opcode: u8) -> Instruction {
    Instruction { opcode, has_arg: false }
}

const fn op_arg(opcode: u8) -> Instruction {
    Instruction { opcode, has_arg: true }
}

static INSTRUCTIONS: &[(&str, Instruction)] = &[
    // Stack
    ("nop", op(0x00)),
    ("psh", op_arg(0x01)),
    ("pop", op(0x02)),
    ("dup", op_arg(0x03)),
    ("swp", op_arg(0x04)),
    ("emp", op(0x05)),

    // Integer arithmetic
    ("add", op(0x10)),
    ("sub", op(0x11)),
    ("mul", op(0x12)),
    ("div", op(0x13)),
    ("mod", op(0x14)),
    ("inc", op(0x15)),
    ("dec", op(0x16)),

    // Float arithmetic
    ("fad", op(0x17)),
    ("fsb", op(0x18)),
    ("fmu", op(0x19)),
    ("fdi", op(0x1a)),
    ("fin", op(0x1b)),
    ("fde", op(0x1c)),

    // Comparison
    ("equ", op(0x20)),
    ("neq", op(0x21)),
    ("grt", op(0x22)),
    ("geq", op(0x23)),
    ("les", op(0x24)),
    ("leq", op(0x25)),
    ("ueq", op(0x26)),
    ("une", op(0x27)),
    ("ugr", op(0x28)),
    ("uge", op(0x29)),
    ("ule", op(0x2a)),
    ("ulq", op(0x2b)),
    ("feq", op(0x2c)),
    ("fne", op(0x2d)),
    ("fgr", op(0x2e)),
    ("fge", op(0x2f)),
    ("fle", op(0x30)),
    ("flq", op(0x31)),

    // Bitwise
    ("and", op(0x38)),
    ("orr", op(0x39)),
    ("not", op(0x3a)),
    ("bsl", op(0x3b)),
    ("bsr", op(0x3c)),

    // Control flow
    ("jmp", op_arg(0x40)),
    ("jnz", op_arg(0x41)),
    ("cal", op_arg(0x42)),
    ("ret", op(0x43)),

    // Memory
    ("r08", op(0x50)),
    ("r16", op(0x51)),
    ("r32", op(0x52)),
    ("r64", op(0x53)),
    ("w08", op(0x54)),
    ("w16", op(0x55)),
    ("w32", op(0x56)),
    ("w64", op(0x57)),

    // Debugging
    ("dmp", op(0xf0)),
    ("prt", op(0xf1)),
    ("fpr", op(0xf2)),

    ("hlt", op(0xff)),
];

/// Looks up an instruction by its mnemonic.
pub fn lookup(name: &str) -> Option<Instruction> {
    INSTRUCTIONS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ins)| *ins)
}

/// Returns the mnemonic of an opcode.
pub fn name_of(opcode: u8) -> Option<&'static str> {
    INSTRUCTIONS
        .iter()
        .find(|(_, ins)| ins.opcode == opcode)
        .map(|(n, _)| *n)
}

/// One encoded instruction of the program region.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Record {
    pub opcode:  u8,
    pub operand: Word,
}

impl Record {
    /// Assembles the record to its binary form.
    pub fn assemble(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0] = self.opcode;
        out[1..].copy_from_slice(&self.operand.to_be_bytes());
        out
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = name_of(self.opcode).unwrap_or("???");
        match lookup(name) {
            Some(ins) if ins.has_arg => write!(f, "{} 0x{:X}", name, self.operand),
            _ => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_is_unique() {
        let mut names = HashSet::new();
        let mut opcodes = HashSet::new();
        for (name, ins) in INSTRUCTIONS {
            assert!(names.insert(*name), "duplicate mnemonic {}", name);
            assert!(opcodes.insert(ins.opcode), "duplicate opcode 0x{:02X}", ins.opcode);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("hlt"), Some(Instruction { opcode: 0xff, has_arg: false }));
        assert_eq!(lookup("psh"), Some(Instruction { opcode: 0x01, has_arg: true }));
        assert!(lookup("jmp").unwrap().has_arg);
        assert_eq!(lookup("HLT"), None);
        assert_eq!(lookup("let"), None);
        assert_eq!(name_of(0x40), Some("jmp"));
        assert_eq!(name_of(0xee), None);
    }

    #[test]
    fn test_assemble() {
        let rec = Record { opcode: 0x01, operand: 0x0102_0304_0506_0708 };
        assert_eq!(rec.assemble(), [0x01, 1, 2, 3, 4, 5, 6, 7, 8]);

        let rec = Record { opcode: 0xff, operand: 0 };
        assert_eq!(rec.assemble(), [0xff, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Record { opcode: 0x01, operand: 255 }.to_string(), "psh 0xFF");
        assert_eq!(Record { opcode: 0xff, operand: 0 }.to_string(), "hlt");
    }
}
