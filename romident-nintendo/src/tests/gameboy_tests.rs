use super::*;

/// Build a minimal 32 KB ROM with a valid logo and header checksum.
fn make_gb_rom(title: &str, cgb_flag: u8) -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];

    // Entry point: NOP + JP 0x0150
    rom[0x0100] = 0x00;
    rom[0x0101] = 0xC3;
    rom[0x0102] = 0x50;
    rom[0x0103] = 0x01;

    rom[0x0104..0x0134].copy_from_slice(&NINTENDO_LOGO);

    let bytes = title.as_bytes();
    rom[0x0134..0x0134 + bytes.len()].copy_from_slice(bytes);

    rom[0x0143] = cgb_flag;
    rom[0x0146] = 0x00; // no SGB
    rom[0x0147] = 0x00; // ROM only
    rom[0x0148] = 0x00; // 32 KB
    rom[0x0149] = 0x00; // no RAM
    rom[0x014A] = 0x01; // overseas
    rom[0x014B] = 0x01; // old licensee: Nintendo
    rom[0x014C] = 0x00; // version

    let mut checksum: u8 = 0;
    for &b in &rom[0x0134..=0x014C] {
        checksum = checksum.wrapping_sub(b).wrapping_sub(1);
    }
    rom[0x014D] = checksum;
    rom
}

#[test]
fn parses_dmg_header() {
    let rom = make_gb_rom("TIC-TAC-TOE", 0x00);
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.title, "TIC-TAC-TOE");
    assert!(!info.color);
    assert_eq!(info.platform(), Platform::GameBoy);
    assert_eq!(info.rom_size, 32 * 1024);
    assert_eq!(info.ram_size, 0);
    assert!(info.header_checksum_valid);
    assert_eq!(info.licensee_code, "01");
    assert!(info.regions().is_empty());
}

#[test]
fn cgb_flag_selects_gbc_platform() {
    for flag in [0x80u8, 0xC0] {
        let rom = make_gb_rom("COLORGAME", flag);
        let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
        assert!(info.color);
        assert_eq!(info.platform(), Platform::GameBoyColor);
    }
}

#[test]
fn cgb_layout_splits_title_and_manufacturer() {
    let mut rom = make_gb_rom("ELEVENCHARS", 0x80);
    // Manufacturer code occupies 0x13F..0x143 in the CGB layout.
    rom[0x013F..0x0143].copy_from_slice(b"BXYZ");
    // Recompute the checksum after the edit.
    let mut checksum: u8 = 0;
    for &b in &rom[0x0134..=0x014C] {
        checksum = checksum.wrapping_sub(b).wrapping_sub(1);
    }
    rom[0x014D] = checksum;

    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.title, "ELEVENCHARS");
    assert_eq!(info.manufacturer_code, "BXYZ");
}

#[test]
fn japan_destination_maps_to_region() {
    let mut rom = make_gb_rom("KAERU", 0x00);
    rom[0x014A] = 0x00;
    let mut checksum: u8 = 0;
    for &b in &rom[0x0134..=0x014C] {
        checksum = checksum.wrapping_sub(b).wrapping_sub(1);
    }
    rom[0x014D] = checksum;

    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.regions(), vec![Region::Japan]);
}

#[test]
fn bad_checksum_is_reported_not_fatal() {
    let mut rom = make_gb_rom("BADSUM", 0x00);
    rom[0x014D] ^= 0xFF;
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert!(!info.header_checksum_valid);
}

#[test]
fn missing_logo_is_invalid() {
    let mut rom = make_gb_rom("NOLOGO", 0x00);
    rom[0x0110] ^= 0xFF;
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn tiny_file_is_invalid() {
    let rom = vec![0u8; 0x120];
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}
