//! Serializes an assembled program into the AVM binary container.
//!
//! ```text
//! [#!/usr/bin/avm\n]          only for executables
//! 'A' 'V' 'M'                 magic
//! major minor patch           version
//! program size                u64, in instructions
//! memory size                 u64, in bytes
//! entry point                 u64, instruction slot
//! memory                      memory size bytes
//! program                     program size * 9 bytes
//! ```
//!
//! All integers are big-endian.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::isa::{Record, Word, RECORD_SIZE};

pub const MAGIC: [u8; 3] = *b"AVM";
pub const VERSION: [u8; 3] = [1, 7, 7];
pub const SHEBANG: &[u8] = b"#!/usr/bin/avm\n";

#[derive(Debug, PartialEq, Eq)]
pub struct Container {
    pub program_size: Word,
    pub memory_size:  Word,
    pub entry_point:  Word,
    pub memory:       Vec<u8>,
    pub program:      Vec<Record>,
}

impl Container {
    /// Writes the container to `writer`, prefixed by the interpreter line
    /// when `executable` is set.
    pub fn write_to<W: Write>(&self, writer: &mut W, executable: bool) -> io::Result<()> {
        if executable {
            writer.write_all(SHEBANG)?;
        }

        writer.write_all(&MAGIC)?;
        writer.write_all(&VERSION)?;

        writer.write_all(&self.program_size.to_be_bytes())?;
        writer.write_all(&self.memory_size.to_be_bytes())?;
        writer.write_all(&self.entry_point.to_be_bytes())?;

        writer.write_all(&self.memory)?;
        for record in self.program.iter() {
            writer.write_all(&record.assemble())?;
        }

        Ok(())
    }

    /// Creates the file at `path` and writes the container to it. An
    /// executable container is also given execute permission.
    ///
    /// A failed write leaves whatever was already written in place.
    pub fn write_file<P: AsRef<Path>>(&self, path: P, executable: bool) -> io::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;

        if executable {
            set_executable(&file)?;
        }

        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, executable)?;
        writer.flush()?;

        debug!(
            "wrote {} instruction(s) and {} byte(s) of memory to {}",
            self.program_size,
            self.memory_size,
            path.display()
        );
        Ok(())
    }

    /// Total size in bytes of the serialized container.
    pub fn byte_len(&self, executable: bool) -> usize {
        let shebang = if executable { SHEBANG.len() } else { 0 };
        shebang + MAGIC.len() + VERSION.len() + 3 * 8 + self.memory.len() + self.program.len() * RECORD_SIZE
    }
}

#[cfg(unix)]
fn set_executable(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = file.metadata()?.permissions();
    perms.set_mode(0o755);
    file.set_permissions(perms)
}

#[cfg(not(unix))]
fn set_executable(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn halt_only() -> Container {
        Container {
            program_size: 1,
            memory_size:  0,
            entry_point:  0,
            memory:       Vec::new(),
            program:      vec![Record { opcode: 0xff, operand: 0 }],
        }
    }

    #[test]
    fn test_layout() {
        let container = Container {
            program_size: 1,
            memory_size:  2,
            entry_point:  0,
            memory:       vec![0xAA, 0xBB],
            program:      vec![Record { opcode: 0x01, operand: 0x0102 }],
        };

        let mut out = Vec::new();
        container.write_to(&mut out, false).unwrap();

        let mut expected = b"AVM".to_vec();
        expected.extend_from_slice(&VERSION);
        expected.extend_from_slice(&1u64.to_be_bytes());
        expected.extend_from_slice(&2u64.to_be_bytes());
        expected.extend_from_slice(&0u64.to_be_bytes());
        expected.extend_from_slice(&[0xAA, 0xBB]);
        expected.extend_from_slice(&[0x01, 0, 0, 0, 0, 0, 0, 0x01, 0x02]);

        assert_eq!(out, expected);
        assert_eq!(out.len(), container.byte_len(false));
    }

    #[test]
    fn test_shebang() {
        let mut out = Vec::new();
        halt_only().write_to(&mut out, true).unwrap();
        assert!(out.starts_with(b"#!/usr/bin/avm\nAVM"));
        assert_eq!(out.len(), halt_only().byte_len(true));
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("halt");
        halt_only().write_file(&path, false).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], b"AVM");
        assert_eq!(bytes.len(), 6 + 24 + 9);
        assert_eq!(bytes[bytes.len() - 9..], [0xff, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("halt");
        halt_only().write_file(&path, true).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0);
        assert!(fs::read(&path).unwrap().starts_with(SHEBANG));
    }

    #[test]
    fn test_write_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out");
        let err = halt_only().write_file(&path, false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
