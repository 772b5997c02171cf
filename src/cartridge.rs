// A cartridge image is at most 2 MiB of rom cut into 16 KiB banks, with an
// information area at 0x0100-0x014f: entry point, logo bitmap, game title,
// cartridge type and the rom/ram size codes. The type byte names the memory
// bank controller soldered next to the rom; the banking protocol itself is a
// bus concern and lives in mmu.rs. Once constructed a cartridge never
// changes.
//
// Reference:
//   - http://gbdev.gg8.se/wiki/articles/The_Cartridge_Header
//   - http://gbdev.gg8.se/wiki/articles/Memory_Bank_Controllers
use super::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

// 128 banks of 16 KiB.
const ROM_MAX: usize = 0x20_0000;
const BANK_SIZE: usize = 0x4000;

// The memory bank controller families this core knows how to drive.
//  00h        ROM ONLY
//  01h..03h   MBC1 (+RAM, +BATTERY)
//  05h..06h   MBC2 (+BATTERY)
// Everything else is refused at load time.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Mbc {
    None,
    Mbc1,
    Mbc2,
}

pub struct Cartridge {
    rom: Vec<u8>,
    title: String,
    mbc: Mbc,
    rom_banks: usize,
    ram_banks: usize,
}

impl Cartridge {
    pub fn power_up(path: impl AsRef<Path>) -> Result<Self> {
        rog::debugln!("Loading cartridge from {:?}", path.as_ref());
        let mut f = File::open(path.as_ref())?;
        let mut rom = Vec::new();
        f.read_to_end(&mut rom)?;
        Self::from_rom(rom)
    }

    pub fn from_rom(rom: Vec<u8>) -> Result<Self> {
        if rom.len() < 0x0150 {
            return Err(Error::BadRomFile(String::from(
                "missing required information area which located at 0100-014F",
            )));
        }
        if rom.len() > ROM_MAX {
            return Err(Error::BadRomFile(format!("rom size more than {}", ROM_MAX)));
        }
        let mbc = match rom[0x0147] {
            0x00 => Mbc::None,
            0x01..=0x03 => Mbc::Mbc1,
            0x05..=0x06 => Mbc::Mbc2,
            n => return Err(Error::UnsupportedCartridge(n)),
        };
        let rom_banks = 2 << rom[0x0148];
        let ram_banks = match rom[0x0149] {
            0x00 => 0,
            0x01..=0x02 => 1,
            // 32 KiB, the most the external ram window can page through.
            _ => 4,
        };
        let title = Self::parse_title(&rom);
        let cart = Self { rom, title, mbc, rom_banks, ram_banks };
        rog::debugln!("Cartridge name is {}", cart.title());
        rog::debugln!("Cartridge type is {:?}", cart.mbc());
        Ok(cart)
    }

    // Up to 14 bytes of upper case ascii at 0x0134, padded with zeros.
    fn parse_title(rom: &[u8]) -> String {
        let mut buf = String::new();
        for &b in &rom[0x0134..0x0142] {
            if b == 0x00 {
                break;
            }
            buf.push(b as char);
        }
        buf
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mbc(&self) -> Mbc {
        self.mbc
    }

    pub fn rom_banks(&self) -> usize {
        self.rom_banks
    }

    pub fn ram_banks(&self) -> usize {
        self.ram_banks
    }

    // Byte at `offset` within rom bank `index`. Missing rom reads as 0xff,
    // like any other absent hardware on the bus.
    pub fn read_bank(&self, index: usize, offset: u16) -> u8 {
        let i = index * BANK_SIZE + offset as usize;
        if i < self.rom.len() {
            self.rom[i]
        } else {
            0xff
        }
    }
}
