use super::*;

pub(crate) fn write_md_header(buf: &mut [u8], region: &str, serial: &str) {
    let header = &mut buf[0x100..0x200];
    for b in header.iter_mut() {
        *b = b' ';
    }
    header[0x00..0x0F].copy_from_slice(b"SEGA MEGA DRIVE");
    header[0x10..0x20].copy_from_slice(b"(C)SEGA 1992.MAR");
    header[0x20..0x2C].copy_from_slice(b"SONIC THE  H");
    header[0x50..0x5F].copy_from_slice(b"SONIC THE HEDGE");
    header[0x80..0x80 + serial.len()].copy_from_slice(serial.as_bytes());
    header[0x8E..0x90].copy_from_slice(&0xABCDu16.to_be_bytes());
    header[0x90] = b'J';
    header[0xA0..0xA4].copy_from_slice(&0u32.to_be_bytes());
    header[0xA4..0xA8].copy_from_slice(&0x7FFFFu32.to_be_bytes());
    header[0xA8..0xAC].copy_from_slice(&0xFF0000u32.to_be_bytes());
    header[0xAC..0xB0].copy_from_slice(&0xFFFFFFu32.to_be_bytes());
    header[0xF0..0xF3].copy_from_slice(region.as_bytes());
}

fn make_md_rom(region: &str) -> Vec<u8> {
    let mut rom = vec![0u8; 512 * 1024];
    write_md_header(&mut rom, region, "GM 00001009-00");
    rom
}

/// Interleave a plain ROM into SMD format.
fn to_smd(plain: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 512];
    out[1] = 0x03;
    out[8] = 0xAA;
    out[9] = 0xBB;
    for block in plain.chunks(16 * 1024) {
        let mut interleaved = vec![0u8; block.len()];
        let half = block.len() / 2;
        for i in 0..half {
            interleaved[i] = block[i * 2 + 1];
            interleaved[half + i] = block[i * 2];
        }
        out.extend_from_slice(&interleaved);
    }
    out
}

#[test]
fn parses_plain_rom() {
    let rom = make_md_rom("JUE");
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.header.system_type, "SEGA MEGA DRIVE");
    assert_eq!(info.header.serial_number, "GM 00001009-00");
    assert_eq!(info.serial(), "GM 00001009-00");
    assert_eq!(info.title(), "SONIC THE HEDGE");
    assert_eq!(info.header.checksum, 0xABCD);
    assert_eq!(
        info.regions,
        vec![Region::Japan, Region::Americas, Region::Europe]
    );
    assert!(!info.is_32x);
    assert!(!info.interleaved);
    assert_eq!(info.platform(), Platform::MegaDrive);
}

#[test]
fn hex_style_region_field() {
    // '5' = Japan + Americas.
    let rom = make_md_rom("5  ");
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.regions, vec![Region::Japan, Region::Americas]);
}

#[test]
fn detects_32x() {
    let mut rom = make_md_rom("U  ");
    rom[0x3C0..0x3C4].copy_from_slice(b"MARS");
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert!(info.is_32x);
    assert_eq!(info.platform(), Platform::Sega32x);
}

#[test]
fn smd_round_trips_header_fields() {
    let plain = make_md_rom("JUE");
    let direct = parse(&plain.as_slice(), plain.len() as u64).unwrap();

    let smd = to_smd(&plain);
    let interleaved = parse(&smd.as_slice(), smd.len() as u64).unwrap();

    assert!(interleaved.interleaved);
    assert_eq!(interleaved.header.serial_number, direct.header.serial_number);
    assert_eq!(interleaved.header.overseas_title, direct.header.overseas_title);
    assert_eq!(interleaved.regions, direct.regions);
    assert_eq!(interleaved.header.checksum, direct.header.checksum);
}

#[test]
fn smd_with_bad_copier_header_is_invalid() {
    let plain = make_md_rom("JUE");
    let mut smd = to_smd(&plain);
    smd[8] = 0x00;
    let err = parse(&smd.as_slice(), smd.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn missing_magic_is_invalid() {
    let rom = vec![0u8; 512 * 1024];
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn domestic_title_decodes_shift_jis() {
    let mut rom = make_md_rom("J  ");
    // "ソニック" in Shift-JIS, padded with spaces.
    let sonic = [0x83u8, 0x5C, 0x83, 0x6A, 0x83, 0x62, 0x83, 0x4E];
    rom[0x120..0x120 + sonic.len()].copy_from_slice(&sonic);
    for b in rom[0x120 + sonic.len()..0x150].iter_mut() {
        *b = b' ';
    }
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.header.domestic_title, "ソニック");
}
