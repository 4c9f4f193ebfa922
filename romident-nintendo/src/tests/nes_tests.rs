use super::*;

fn make_ines_header() -> Vec<u8> {
    let mut rom = vec![0u8; 16 + 2 * 16384 + 8192];
    rom[0..4].copy_from_slice(b"NES\x1A");
    rom[4] = 2; // 32 KB PRG
    rom[5] = 1; // 8 KB CHR
    rom[6] = 0x12; // mapper low nibble 1, battery
    rom[7] = 0x40; // mapper high nibble 4
    rom
}

#[test]
fn parses_ines() {
    let rom = make_ines_header();
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.format, NesFormat::Ines);
    assert_eq!(info.prg_rom_size, 32 * 1024);
    assert_eq!(info.chr_rom_size, 8 * 1024);
    assert_eq!(info.mapper, 0x41);
    assert!(info.battery);
    assert!(!info.trainer);
    assert_eq!(info.platform(), Platform::Nes);
}

#[test]
fn parses_nes20_mapper_and_submapper() {
    let mut rom = make_ines_header();
    rom[7] = 0x48; // NES 2.0 marker + mapper bits
    rom[8] = 0x52; // submapper 5, mapper plane 2
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.format, NesFormat::Nes20);
    // mapper = low nibble 1 | high nibble 4 | plane 2 << 8
    assert_eq!(info.mapper, 0x241);
    assert_eq!(info.submapper, 5);
}

#[test]
fn nes20_exponent_multiplier_sizes() {
    let mut rom = make_ines_header();
    rom[7] = 0x08;
    // PRG MSB nibble = 0xF: size = (1 << exponent) * multiplier
    // lsb = 0b000010_01: exponent 2, multiplier 3 -> 12 bytes
    rom[4] = 0b0000_1001;
    rom[9] = 0x0F;
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.prg_rom_size, (1 << 2) * 3);
}

#[test]
fn nes20_ram_shift_sizes() {
    let mut rom = make_ines_header();
    rom[7] = 0x08;
    rom[10] = 0x71; // prg ram shift 1, prg nvram shift 7
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.prg_ram_size, 128);
    assert_eq!(info.prg_nvram_size, 64 << 7);
    assert_eq!(info.chr_ram_size, 0);
}

#[test]
fn bad_magic_is_invalid() {
    let mut rom = make_ines_header();
    rom[3] = 0x00;
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn tiny_file_is_invalid() {
    let rom = b"NES".to_vec();
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}
