use super::*;

fn make_nds_rom(game_code: &str, unit_code: u8, capacity: u8) -> Vec<u8> {
    let mut rom = vec![0u8; 128 * 1024];
    rom[0x00..0x09].copy_from_slice(b"TESTTITLE");
    rom[0x0C..0x10].copy_from_slice(game_code.as_bytes());
    rom[0x10..0x12].copy_from_slice(b"01");
    rom[0x12] = unit_code;
    rom[0x14] = capacity;
    rom[0x1E] = 0;
    rom
}

#[test]
fn parses_ds_header() {
    let rom = make_nds_rom("AXXE", 0x00, 0);
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.game_code, "AXXE");
    assert_eq!(info.destination, 'E');
    assert_eq!(info.rom_size, 131072);
    assert_eq!(info.platform(), Platform::Ds);
    assert_eq!(info.serial(), "NTR-AXXE");
    assert_eq!(info.regions(), vec![Region::Usa]);
}

#[test]
fn dsi_unit_code_selects_dsi() {
    let rom = make_nds_rom("TWLJ", 0x03, 3);
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.platform(), Platform::Dsi);
    assert_eq!(info.rom_size, 128 * 1024 << 3);
    assert_eq!(info.regions(), vec![Region::Japan]);
}

#[test]
fn hybrid_unit_code_stays_ds() {
    let rom = make_nds_rom("AAAP", 0x02, 1);
    let info = parse(&rom.as_slice(), rom.len() as u64).unwrap();
    assert_eq!(info.platform(), Platform::Ds);
}

#[test]
fn bad_unit_code_is_invalid() {
    let rom = make_nds_rom("AXXE", 0x07, 0);
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn oversized_capacity_is_invalid() {
    let rom = make_nds_rom("AXXE", 0x00, 0x10);
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn non_alphanumeric_game_code_is_invalid() {
    let mut rom = make_nds_rom("AXXE", 0x00, 0);
    rom[0x0D] = 0x01;
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn tiny_file_is_invalid() {
    let rom = vec![0u8; 8];
    let err = parse(&rom.as_slice(), rom.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}
