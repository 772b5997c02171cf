use dmg::motherboard::MotherBoard;

#[cfg(feature = "gui")]
fn main() {
    use dmg::joypad::JoypadKey;
    use dmg::ppu::{SCREEN_H, SCREEN_W};

    rog::reg("dmg");
    rog::reg("dmg::cartridge");

    let mut rom = String::from("");
    let mut c_scale = 2;
    {
        let mut ap = argparse::ArgumentParser::new();
        ap.set_description("DMG emulator");
        ap.refer(&mut c_scale).add_option(
            &["-x", "--scale-factor"],
            argparse::Store,
            "Scale the video by a factor of 1, 2, 4, or 8",
        );
        ap.refer(&mut rom).add_argument("rom", argparse::Store, "Rom name");
        ap.parse_args_or_exit();
    }

    let mut mbrd = match MotherBoard::power_up(&rom) {
        Ok(mbrd) => mbrd,
        Err(e) => {
            rog::println!("{}: {}", rom, e);
            std::process::exit(1);
        }
    };

    let mut option = minifb::WindowOptions::default();
    option.resize = true;
    option.scale = match c_scale {
        1 => minifb::Scale::X1,
        2 => minifb::Scale::X2,
        4 => minifb::Scale::X4,
        8 => minifb::Scale::X8,
        _ => {
            rog::println!("Supported scale: 1, 2, 4 or 8");
            std::process::exit(1);
        }
    };
    let mut window =
        minifb::Window::new(format!("DMG - {}", mbrd.title()).as_str(), SCREEN_W, SCREEN_H, option).unwrap();
    let mut window_buffer = vec![0x00; SCREEN_W * SCREEN_H];
    window.update_with_buffer(window_buffer.as_slice()).unwrap();

    let keys = [
        (minifb::Key::Right, JoypadKey::Right),
        (minifb::Key::Up, JoypadKey::Up),
        (minifb::Key::Left, JoypadKey::Left),
        (minifb::Key::Down, JoypadKey::Down),
        (minifb::Key::Z, JoypadKey::A),
        (minifb::Key::X, JoypadKey::B),
        (minifb::Key::Space, JoypadKey::Select),
        (minifb::Key::Enter, JoypadKey::Start),
    ];
    let frame_duration = std::time::Duration::from_nanos(1_000_000_000 / 60);
    while window.is_open() && !window.is_key_down(minifb::Key::Escape) {
        let begin = std::time::Instant::now();

        if let Err(e) = mbrd.run_frame() {
            rog::println!("{}", e);
            break;
        }

        if mbrd.check_and_reset_updated() {
            let mut i: usize = 0;
            for l in mbrd.framebuffer().iter() {
                for w in l.iter() {
                    let r = u32::from(w[0]) << 16;
                    let g = u32::from(w[1]) << 8;
                    let b = u32::from(w[2]);

                    window_buffer[i] = 0xff00_0000 | r | g | b;
                    i += 1;
                }
            }
            window.update_with_buffer(window_buffer.as_slice()).unwrap();
        }

        for (rk, vk) in &keys {
            if window.is_key_down(*rk) {
                mbrd.keydown(*vk);
            } else {
                mbrd.keyup(*vk);
            }
        }

        // 60 Hz pacing is the host's job, not the core's.
        let elapsed = begin.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}

// Headless frontend: run a fixed number of frames, then dump a coarse ascii
// rendering of the final framebuffer. Enough to watch a rom boot without a
// window system.
#[cfg(not(feature = "gui"))]
fn main() {
    rog::reg("dmg");
    rog::reg("dmg::cartridge");

    let mut rom = String::from("");
    let mut c_frames = 600usize;
    {
        let mut ap = argparse::ArgumentParser::new();
        ap.set_description("DMG emulator (headless)");
        ap.refer(&mut c_frames)
            .add_option(&["-n", "--frames"], argparse::Store, "Number of frames to run");
        ap.refer(&mut rom).add_argument("rom", argparse::Store, "Rom name");
        ap.parse_args_or_exit();
    }

    if let Err(e) = run_headless(&rom, c_frames) {
        rog::println!("{}: {}", rom, e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "gui"))]
fn run_headless(rom: &str, frames: usize) -> dmg::error::Result<()> {
    let mut mbrd = MotherBoard::power_up(rom)?;
    for _ in 0..frames {
        mbrd.run_frame()?;
    }
    let shades = [' ', '.', '+', '#'];
    for line in mbrd.framebuffer().iter().step_by(2) {
        let row: String = line
            .iter()
            .step_by(2)
            .map(|w| shades[match w[0] {
                0xff => 0,
                0xcc => 1,
                0x77 => 2,
                _ => 3,
            }])
            .collect();
        rog::println!("{}", row);
    }
    Ok(())
}
