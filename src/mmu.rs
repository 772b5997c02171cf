// The bus. Every read and write the CPU issues lands here and is dispatched
// to the cartridge rom, video ram, work ram and its echo, sprite attributes,
// the I/O ports or high ram. Writes into the rom window never store a byte:
// they are commands to the cartridge's memory bank controller, decoded per
// family below.
//
// Reference: http://gbdev.gg8.se/wiki/articles/Memory_Bank_Controllers
use super::cartridge::{Cartridge, Mbc};
use super::error::Result;
use super::intf::Intf;
use super::joypad::Joypad;
use super::memory::Memory;
use super::ppu::Ppu;
use super::serial::Serial;
use super::timer::Timer;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub struct Mmu {
    pub cartridge: Cartridge,
    pub ppu: Ppu,
    pub joypad: Joypad,
    pub serial: Serial,
    pub timer: Timer,
    pub intf: Rc<RefCell<Intf>>,
    inte: u8,
    wram: [u8; 0x2000],
    hram: [u8; 0x7f],
    // Raw backing for the I/O ports this core does not interpret itself;
    // host adapters park bytes here.
    io: [u8; 0x80],

    // Memory bank controller state. The rom window 0x4000-0x7fff shows
    // `rom_bank`, the external ram window shows `ram_bank` of the 32 KiB
    // pool, but only while ram is enabled.
    rom_bank: usize,
    ram_bank: usize,
    ram_enable: bool,
    // MBC1 mode select: in rom banking mode the 0x4000-0x5fff writes extend
    // the rom bank number, in ram banking mode they pick the ram bank.
    rom_banking: bool,
    eram: [u8; 0x8000],
}

impl Mmu {
    pub fn power_up(path: impl AsRef<Path>) -> Result<Self> {
        let cartridge = Cartridge::power_up(path)?;
        Ok(Self::with_cartridge(cartridge))
    }

    pub fn with_cartridge(cartridge: Cartridge) -> Self {
        let intf = Rc::new(RefCell::new(Intf::power_up()));
        let mut r = Self {
            cartridge,
            ppu: Ppu::power_up(intf.clone()),
            joypad: Joypad::power_up(intf.clone()),
            serial: Serial::power_up(),
            timer: Timer::power_up(intf.clone()),
            intf,
            inte: 0x00,
            wram: [0x00; 0x2000],
            hram: [0x00; 0x7f],
            io: [0x00; 0x80],
            rom_bank: 0x01,
            ram_bank: 0x00,
            ram_enable: false,
            rom_banking: true,
            eram: [0x00; 0x8000],
        };
        // I/O register state at 0x0100, right after the boot rom hands over.
        r.set(0xff05, 0x00);
        r.set(0xff06, 0x00);
        r.set(0xff07, 0x00);
        r.set(0xff10, 0x80);
        r.set(0xff11, 0xbf);
        r.set(0xff12, 0xf3);
        r.set(0xff14, 0xbf);
        r.set(0xff16, 0x3f);
        r.set(0xff17, 0x00);
        r.set(0xff19, 0xbf);
        r.set(0xff1a, 0x7f);
        r.set(0xff1b, 0xff);
        r.set(0xff1c, 0x9f);
        r.set(0xff1e, 0xbf);
        r.set(0xff20, 0xff);
        r.set(0xff21, 0x00);
        r.set(0xff22, 0x00);
        r.set(0xff23, 0xbf);
        r.set(0xff24, 0x77);
        r.set(0xff25, 0xf3);
        r.set(0xff26, 0xf1);
        r.set(0xff40, 0x91);
        r.set(0xff42, 0x00);
        r.set(0xff43, 0x00);
        r.set(0xff45, 0x00);
        r.set(0xff47, 0xfc);
        r.set(0xff48, 0xff);
        r.set(0xff49, 0xff);
        r.set(0xff4a, 0x00);
        r.set(0xff4b, 0x00);
        r
    }

    // Advance the clocked units by one instruction's worth of cycles.
    pub fn next(&mut self, cycles: u32) {
        self.timer.next(cycles);
        self.ppu.next(cycles);
    }

    // A write into 0x0000-0x7fff, interpreted by the bank controller.
    fn bank_command(&mut self, a: u16, v: u8) {
        match self.cartridge.mbc() {
            Mbc::None => {}
            Mbc::Mbc1 => match a {
                // Any value with 0xa in the low nibble enables ram; anything
                // else disables it.
                0x0000..=0x1fff => self.ram_enable = v & 0x0f == 0x0a,
                0x2000..=0x3fff => {
                    let n = (self.rom_bank & 0x60) | (v & 0x1f) as usize;
                    self.rom_bank = if n == 0x00 { 0x01 } else { n };
                }
                0x4000..=0x5fff => {
                    if self.rom_banking {
                        self.rom_bank = (self.rom_bank & 0x1f) | ((v & 0x03) as usize) << 5;
                    } else if self.cartridge.ram_banks() != 0 {
                        self.ram_bank = (v & 0x03) as usize;
                    }
                }
                0x6000..=0x7fff => {
                    self.rom_banking = v & 0x01 == 0x00;
                    if self.rom_banking {
                        self.ram_bank = 0x00;
                    }
                }
                _ => {}
            },
            // MBC2 decodes the whole low window by address bit 4: clear means
            // the ram enable latch, set means a rom bank select from the low
            // four value bits.
            Mbc::Mbc2 => {
                if let 0x0000..=0x3fff = a {
                    if a & 0x0010 == 0x0000 {
                        self.ram_enable = v & 0x0f == 0x0a;
                    } else {
                        let n = (v & 0x0f) as usize;
                        self.rom_bank = if n == 0x00 { 0x01 } else { n };
                    }
                }
            }
        }
    }
}

impl Memory for Mmu {
    fn get(&self, a: u16) -> u8 {
        match a {
            0x0000..=0x3fff => self.cartridge.read_bank(0, a),
            0x4000..=0x7fff => self.cartridge.read_bank(self.rom_bank, a - 0x4000),
            0x8000..=0x9fff => self.ppu.get(a),
            0xa000..=0xbfff => {
                if self.ram_enable {
                    self.eram[self.ram_bank * 0x2000 + a as usize - 0xa000]
                } else {
                    0xff
                }
            }
            0xc000..=0xdfff => self.wram[a as usize - 0xc000],
            0xe000..=0xfdff => self.wram[a as usize - 0xe000],
            0xfe00..=0xfe9f => self.ppu.get(a),
            0xfea0..=0xfeff => 0xff,
            0xff00 => self.joypad.get(a),
            0xff01..=0xff02 => self.serial.get(a),
            0xff04..=0xff07 => self.timer.get(a),
            0xff0f => self.intf.borrow().data,
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.get(a),
            0xff00..=0xff7f => self.io[a as usize - 0xff00],
            0xff80..=0xfffe => self.hram[a as usize - 0xff80],
            0xffff => self.inte,
        }
    }

    fn set(&mut self, a: u16, v: u8) {
        match a {
            0x0000..=0x7fff => self.bank_command(a, v),
            0x8000..=0x9fff => self.ppu.set(a, v),
            0xa000..=0xbfff => {
                if self.ram_enable {
                    self.eram[self.ram_bank * 0x2000 + a as usize - 0xa000] = v;
                }
            }
            // The echo region shares the work ram backing, so a write to
            // either side is visible from both.
            0xc000..=0xdfff => self.wram[a as usize - 0xc000] = v,
            0xe000..=0xfdff => self.wram[a as usize - 0xe000] = v,
            0xfe00..=0xfe9f => self.ppu.set(a, v),
            0xfea0..=0xfeff => {}
            0xff00 => self.joypad.set(a, v),
            0xff01..=0xff02 => self.serial.set(a, v),
            0xff04..=0xff07 => self.timer.set(a, v),
            0xff0f => self.intf.borrow_mut().data = v,
            0xff46 => {
                // OAM DMA: copy 0xa0 bytes from v << 8 into the sprite
                // attribute table.
                let base = u16::from(v) << 8;
                for i in 0x00..0xa0 {
                    let b = self.get(base + i);
                    self.set(0xfe00 + i, b);
                }
            }
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.set(a, v),
            0xff00..=0xff7f => self.io[a as usize - 0xff00] = v,
            0xff80..=0xfffe => self.hram[a as usize - 0xff80] = v,
            0xffff => self.inte = v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::rom_image;

    fn mmu(type_byte: u8, rom_size_code: u8, ram_size_code: u8) -> Mmu {
        Mmu::with_cartridge(Cartridge::from_rom(rom_image(type_byte, rom_size_code, ram_size_code)).unwrap())
    }

    #[test]
    fn rom_window_defaults_to_bank_1() {
        let m = mmu(0x01, 0x02, 0x00);
        assert_eq!(m.get(0x4000), 0x01);
    }

    #[test]
    fn mbc1_bank_select_and_zero_forcing() {
        let mut m = mmu(0x01, 0x02, 0x00);
        m.set(0x2000, 0x05);
        assert_eq!(m.get(0x4000), 0x05);
        // Selecting bank 0 lands on bank 1.
        m.set(0x2000, 0x00);
        assert_eq!(m.get(0x4000), 0x01);
    }

    #[test]
    fn mbc1_upper_bits_extend_the_rom_bank_in_rom_mode() {
        let mut m = mmu(0x01, 0x06, 0x00);
        m.set(0x2000, 0x01);
        m.set(0x4000, 0x01);
        assert_eq!(m.rom_bank, 0x21);
    }

    #[test]
    fn mbc1_ram_mode_selects_the_ram_bank() {
        let mut m = mmu(0x03, 0x00, 0x03);
        m.set(0x0000, 0x0a);
        m.set(0x6000, 0x01);
        m.set(0x4000, 0x02);
        assert_eq!(m.ram_bank, 0x02);
        m.set(0xa000, 0x55);
        // Back to rom mode: ram bank forced to 0, so the byte is hidden.
        m.set(0x6000, 0x00);
        assert_eq!(m.ram_bank, 0x00);
        assert_ne!(m.get(0xa000), 0x55);
    }

    #[test]
    fn external_ram_reads_0xff_while_disabled() {
        let mut m = mmu(0x03, 0x00, 0x02);
        assert_eq!(m.get(0xa000), 0xff);
        // Disabled writes are dropped.
        m.set(0xa000, 0x12);
        m.set(0x0000, 0x0a);
        assert_eq!(m.get(0xa000), 0x00);
        m.set(0xa000, 0x12);
        assert_eq!(m.get(0xa000), 0x12);
        m.set(0x0000, 0x00);
        assert_eq!(m.get(0xa000), 0xff);
    }

    #[test]
    fn mbc2_decodes_by_address_bit_4() {
        let mut m = mmu(0x05, 0x02, 0x00);
        // Bit 4 set: rom bank select from the low nibble.
        m.set(0x0010, 0x07);
        assert_eq!(m.get(0x4000), 0x07);
        m.set(0x0010, 0x00);
        assert_eq!(m.rom_bank, 0x01);
        // Bit 4 clear: ram enable latch.
        m.set(0x0000, 0x0a);
        assert!(m.ram_enable);
        m.set(0x0000, 0x00);
        assert!(!m.ram_enable);
    }

    #[test]
    fn rom_only_ignores_bank_commands() {
        let mut m = mmu(0x00, 0x00, 0x00);
        m.set(0x2000, 0x05);
        assert_eq!(m.rom_bank, 0x01);
        assert_eq!(m.get(0x4000), 0x01);
    }

    #[test]
    fn echo_ram_mirrors_both_directions() {
        let mut m = mmu(0x00, 0x00, 0x00);
        for a in (0xe000u16..0xfe00).step_by(0x1ff) {
            m.set(a, 0x5a);
            assert_eq!(m.get(a - 0x2000), 0x5a);
            m.set(a - 0x2000, 0xa5);
            assert_eq!(m.get(a), 0xa5);
        }
    }

    #[test]
    fn unusable_region_drops_writes() {
        let mut m = mmu(0x00, 0x00, 0x00);
        m.set(0xfea0, 0x12);
        assert_eq!(m.get(0xfea0), 0xff);
    }

    #[test]
    fn divider_and_ly_writes_reset_to_zero() {
        let mut m = mmu(0x00, 0x00, 0x00);
        m.next(1024);
        assert_ne!(m.get(0xff04), 0x00);
        m.set(0xff04, 0x7b);
        assert_eq!(m.get(0xff04), 0x00);
        m.next(456 * 3);
        assert_ne!(m.get(0xff44), 0x00);
        m.set(0xff44, 0x7b);
        assert_eq!(m.get(0xff44), 0x00);
    }

    #[test]
    fn post_boot_io_defaults() {
        let m = mmu(0x00, 0x00, 0x00);
        assert_eq!(m.get(0xff40), 0x91);
        assert_eq!(m.get(0xff47), 0xfc);
        assert_eq!(m.get(0xffff), 0x00);
        assert_eq!(m.get(0xff05), 0x00);
        assert_eq!(m.get(0xff10), 0x80);
        assert_eq!(m.get(0xff26), 0xf1);
    }

    #[test]
    fn oam_dma_copies_into_sprite_table() {
        let mut m = mmu(0x00, 0x00, 0x00);
        for i in 0..0xa0 {
            m.set(0xc000 + i, i as u8);
        }
        m.set(0xff46, 0xc0);
        for i in 0..0xa0 {
            assert_eq!(m.get(0xfe00 + i), i as u8);
        }
    }

    #[test]
    fn word_accessors_are_little_endian() {
        let mut m = mmu(0x00, 0x00, 0x00);
        m.set_word(0xc100, 0xbeef);
        assert_eq!(m.get(0xc100), 0xef);
        assert_eq!(m.get(0xc101), 0xbe);
        assert_eq!(m.get_word(0xc100), 0xbeef);
    }
}
