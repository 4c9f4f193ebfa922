use super::*;

fn make_disc_header(game_id: &str, wii: bool, title: &str) -> Vec<u8> {
    let mut buf = vec![0u8; 0x60];
    buf[0x00..0x06].copy_from_slice(game_id.as_bytes());
    buf[0x06] = 0; // disc number
    buf[0x07] = 0; // version
    if wii {
        buf[0x18..0x1C].copy_from_slice(&0x5D1C_9EA3u32.to_be_bytes());
    } else {
        buf[0x1C..0x20].copy_from_slice(&0xC233_9F3Du32.to_be_bytes());
    }
    let t = title.as_bytes();
    buf[0x20..0x20 + t.len()].copy_from_slice(t);
    buf
}

#[test]
fn parses_gamecube_header() {
    let disc = make_disc_header("GALE01", false, "SUPER SMASH BROS Melee");
    let info = parse(&disc.as_slice(), disc.len() as u64).unwrap();
    assert_eq!(info.platform(), Platform::GameCube);
    assert_eq!(info.game_id, "GALE01");
    assert_eq!(info.serial(), "GALE01");
    assert_eq!(info.title, "SUPER SMASH BROS Melee");
    assert_eq!(info.region, Region::Usa);
    assert!(!info.wii);
}

#[test]
fn parses_wii_header() {
    let disc = make_disc_header("RSPP01", true, "Wii Sports");
    let info = parse(&disc.as_slice(), disc.len() as u64).unwrap();
    assert_eq!(info.platform(), Platform::Wii);
    assert_eq!(info.region, Region::Europe);
}

#[test]
fn both_magics_set_is_invalid() {
    let mut disc = make_disc_header("GALE01", false, "X");
    disc[0x18..0x1C].copy_from_slice(&0x5D1C_9EA3u32.to_be_bytes());
    let err = parse(&disc.as_slice(), disc.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn no_magic_is_invalid() {
    let disc = vec![0u8; 0x60];
    let err = parse(&disc.as_slice(), disc.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn rvz_embeds_disc_header() {
    let disc = make_disc_header("GM4E01", false, "Mario Kart Double Dash");
    let mut rvz = vec![0u8; 0x58];
    rvz[0..4].copy_from_slice(b"RVZ\x01");
    rvz.extend_from_slice(&disc);
    rvz.resize(0x200, 0);

    let info = parse_rvz(&rvz.as_slice(), rvz.len() as u64).unwrap();
    assert_eq!(info.game_id, "GM4E01");
    assert_eq!(info.platform(), Platform::GameCube);
    assert_eq!(info.title, "Mario Kart Double Dash");
}

#[test]
fn wia_magic_accepted() {
    let disc = make_disc_header("RSPE01", true, "Wii Sports");
    let mut wia = vec![0u8; 0x58];
    wia[0..4].copy_from_slice(b"WIA\x01");
    wia.extend_from_slice(&disc);
    wia.resize(0x200, 0);

    let info = parse_rvz(&wia.as_slice(), wia.len() as u64).unwrap();
    assert_eq!(info.platform(), Platform::Wii);
}

#[test]
fn rvz_bad_magic_is_invalid() {
    let rvz = vec![0u8; 0x200];
    let err = parse_rvz(&rvz.as_slice(), rvz.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn plain_iso_without_magic_rejected_as_gcm() {
    // An ISO 9660 image has no magic at 0x18/0x1C.
    let mut iso = vec![0u8; 0x9000];
    iso[0x8001..0x8006].copy_from_slice(b"CD001");
    let err = parse(&iso.as_slice(), iso.len() as u64).unwrap_err();
    assert!(err.is_invalid());
}
