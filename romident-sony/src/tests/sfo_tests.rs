use super::*;

/// Assemble a PARAM.SFO blob from (key, value) pairs.
pub(crate) fn build_sfo(pairs: &[(&str, SfoValue)]) -> Vec<u8> {
    let mut keys = Vec::new();
    let mut values = Vec::new();
    let mut index = Vec::new();

    for (key, value) in pairs {
        let key_offset = keys.len() as u16;
        keys.extend_from_slice(key.as_bytes());
        keys.push(0);

        let data_offset = values.len() as u32;
        let (format, len) = match value {
            SfoValue::Text(s) => {
                values.extend_from_slice(s.as_bytes());
                values.push(0);
                (0x0204u16, s.len() as u32 + 1)
            }
            SfoValue::Number(n) => {
                values.extend_from_slice(&n.to_le_bytes());
                (0x0404u16, 4u32)
            }
        };

        index.extend_from_slice(&key_offset.to_le_bytes());
        index.extend_from_slice(&format.to_le_bytes());
        index.extend_from_slice(&len.to_le_bytes());
        index.extend_from_slice(&len.to_le_bytes()); // max len
        index.extend_from_slice(&data_offset.to_le_bytes());
    }

    let key_table = 0x14 + index.len();
    let data_table = key_table + keys.len();

    let mut out = Vec::new();
    out.extend_from_slice(b"\x00PSF");
    out.extend_from_slice(&0x0101u32.to_le_bytes()); // version 1.1
    out.extend_from_slice(&(key_table as u32).to_le_bytes());
    out.extend_from_slice(&(data_table as u32).to_le_bytes());
    out.extend_from_slice(&(pairs.len() as u32).to_le_bytes());
    out.extend_from_slice(&index);
    out.extend_from_slice(&keys);
    out.extend_from_slice(&values);
    out
}

fn text(s: &str) -> SfoValue {
    SfoValue::Text(s.to_string())
}

#[test]
fn parses_psp_sfo() {
    let sfo = build_sfo(&[
        ("CATEGORY", text("UG")),
        ("DISC_ID", text("ULUS10041")),
        ("TITLE", text("GRAND THEFT AUTO")),
    ]);
    let info = parse(&sfo).unwrap();
    assert_eq!(info.platform(), Platform::Psp);
    assert_eq!(info.title, "GRAND THEFT AUTO");
    assert_eq!(info.serial(), "ULUS10041");
    assert_eq!(info.category.as_deref(), Some("UG"));
    assert_eq!(info.regions(), vec![Region::Usa]);
}

#[test]
fn parses_ps3_sfo_via_title_id() {
    let sfo = build_sfo(&[
        ("TITLE", text("FLOWER")),
        ("TITLE_ID", text("NPEA00012")),
    ]);
    let info = parse(&sfo).unwrap();
    assert_eq!(info.platform(), Platform::Ps3);
    assert_eq!(info.serial(), "NPEA00012");
    assert_eq!(info.regions(), vec![Region::Europe]);
}

#[test]
fn vita_system_ver_decodes_and_forces_platform() {
    let sfo = build_sfo(&[
        ("PSP2_SYSTEM_VER", SfoValue::Number(0x0360_0000)),
        ("TITLE", text("VITA GAME")),
        ("TITLE_ID", text("PCSE00123")),
    ]);
    let info = parse(&sfo).unwrap();
    assert_eq!(info.platform(), Platform::Vita);
    assert_eq!(info.system_version.as_deref(), Some("3.60"));
    assert_eq!(info.regions(), vec![Region::Usa]);
}

#[test]
fn inclusive_vita_prefixes_accepted() {
    for prefix in ["PCSE", "PCSF", "PCSA", "PCSB", "PCSG"] {
        let sfo = build_sfo(&[("TITLE_ID", text(&format!("{prefix}00001")))]);
        let info = parse(&sfo).unwrap();
        assert_eq!(info.platform(), Platform::Vita, "{prefix}");
    }
}

#[test]
fn ps4_prefix() {
    let sfo = build_sfo(&[("TITLE_ID", text("CUSA00419"))]);
    let info = parse(&sfo).unwrap();
    assert_eq!(info.platform(), Platform::Ps4);
    assert!(info.regions().is_empty());
}

#[test]
fn unknown_prefix_is_invalid() {
    let sfo = build_sfo(&[("TITLE_ID", text("XXXX00000"))]);
    let err = parse(&sfo).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn bad_magic_is_invalid() {
    let err = parse(b"\x00PSXjunkjunkjunkjunkjunk").unwrap_err();
    assert!(err.is_invalid());
}

#[test]
fn truncated_index_is_corrupt() {
    let mut sfo = build_sfo(&[("TITLE_ID", text("ULUS00001"))]);
    sfo.truncate(0x18);
    let err = parse(&sfo).unwrap_err();
    assert!(matches!(err, IdentError::Corrupt(_)));
}

#[test]
fn number_entries_survive_in_map() {
    let sfo = build_sfo(&[
        ("PARENTAL_LEVEL", SfoValue::Number(5)),
        ("TITLE_ID", text("BLUS30443")),
    ]);
    let info = parse(&sfo).unwrap();
    assert_eq!(
        info.entries.get("PARENTAL_LEVEL"),
        Some(&SfoValue::Number(5))
    );
    assert_eq!(info.platform(), Platform::Ps3);
    assert_eq!(info.regions(), vec![Region::Usa]);
}
