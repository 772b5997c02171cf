use std::fmt;
use std::io;

// Everything that can end an emulation session. Memory accesses are total
// functions and never appear here; see the read/write contracts in mmu.rs.
#[derive(Debug)]
pub enum Error {
    // The rom file could not be read, or its size is outside the 0x150 byte
    // to 2 MiB window a cartridge image may occupy.
    BadRomFile(String),
    // The cartridge type byte names a memory bank controller this core does
    // not implement.
    UnsupportedCartridge(u8),
    // The fetched byte is not a documented LR35902 opcode.
    InvalidOpcode { pc: u16, opcode: u8 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::BadRomFile(reason) => write!(f, "bad rom file: {}", reason),
            Error::UnsupportedCartridge(n) => write!(f, "unsupported cartridge type: 0x{:02x}", n),
            Error::InvalidOpcode { pc, opcode } => {
                write!(f, "invalid opcode 0x{:02x} at 0x{:04x}", opcode, pc)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::BadRomFile(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
