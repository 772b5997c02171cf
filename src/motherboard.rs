// The assembled machine: one CPU wired to one bus, clocked cooperatively.
// The host drives it a frame at a time and reads the framebuffer back
// between frames.
use super::cartridge::Cartridge;
use super::cpu::Cpu;
use super::error::Result;
use super::intf::Flag;
use super::joypad::JoypadKey;
use super::mmu::Mmu;
use super::ppu::{SCREEN_H, SCREEN_W};
use std::path::Path;

// 4194304 Hz over a 60 Hz refresh.
pub const FRAME_CYCLES: u32 = 69_905;

pub struct MotherBoard {
    pub mmu: Mmu,
    pub cpu: Cpu,
}

impl MotherBoard {
    pub fn power_up(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { mmu: Mmu::power_up(path)?, cpu: Cpu::power_up() })
    }

    pub fn with_cartridge(cartridge: Cartridge) -> Self {
        Self { mmu: Mmu::with_cartridge(cartridge), cpu: Cpu::power_up() }
    }

    // One instruction (or interrupt service, or halted idle step), with the
    // timer and PPU trailing by the same cycle count. Interrupt flags they
    // raise are examined before the next opcode is fetched.
    pub fn do_cycle(&mut self) -> Result<u32> {
        let cycles = self.cpu.next(&mut self.mmu)?;
        self.mmu.next(cycles);
        Ok(cycles)
    }

    // Run one frame's worth of cycles and report how many were actually
    // spent; the overshoot is at most one instruction.
    pub fn run_frame(&mut self) -> Result<u32> {
        let mut cycles = 0;
        while cycles < FRAME_CYCLES {
            cycles += self.do_cycle()?;
        }
        Ok(cycles)
    }

    // True once per completed frame; reading it rearms the flag.
    pub fn check_and_reset_updated(&mut self) -> bool {
        let v = self.mmu.ppu.updated;
        self.mmu.ppu.updated = false;
        v
    }

    pub fn framebuffer(&self) -> &[[[u8; 3]; SCREEN_W]; SCREEN_H] {
        &self.mmu.ppu.data
    }

    // The host-facing interrupt request channel, e.g. for serial transfer
    // completion.
    pub fn request_interrupt(&mut self, flag: Flag) {
        self.mmu.intf.borrow_mut().hi(flag);
    }

    pub fn keydown(&mut self, key: JoypadKey) {
        self.mmu.joypad.keydown(key);
    }

    pub fn keyup(&mut self, key: JoypadKey) {
        self.mmu.joypad.keyup(key);
    }

    pub fn title(&self) -> &str {
        self.mmu.cartridge.title()
    }
}
