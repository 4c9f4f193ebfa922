//! CHD metadata list and CD track layout.

use romident_core::{IdentError, ReadAt, read_vec_at};

use crate::header::make_tag;

/// CD track metadata, current format.
pub const TAG_CHT2: u32 = make_tag(b"CHT2");
/// CD track metadata, older format without pregap/postgap fields.
pub const TAG_CHTR: u32 = make_tag(b"CHTR");
/// GD-ROM track metadata.
pub const TAG_CHGT: u32 = make_tag(b"CHGT");
/// GD-ROM track metadata, older format.
pub const TAG_CHGD: u32 = make_tag(b"CHGD");

/// Upper bound on metadata entries walked; a longer chain means a cycle or
/// garbage next-pointers.
const MAX_METADATA_ENTRIES: usize = 256;

/// One entry of the CHD metadata list.
#[derive(Debug, Clone)]
pub struct MetadataEntry {
    pub tag: u32,
    pub flags: u8,
    pub data: Vec<u8>,
}

/// Walk the metadata list starting at `meta_offset` (0 = empty).
///
/// Each entry is a 16-byte header `{tag u32 BE, flags u8 + length u24 BE,
/// next u64 BE}` followed by `length` bytes of payload.
pub fn read_metadata(
    reader: &dyn ReadAt,
    meta_offset: u64,
) -> Result<Vec<MetadataEntry>, IdentError> {
    let mut entries = Vec::new();
    let mut offset = meta_offset;

    while offset != 0 {
        if entries.len() >= MAX_METADATA_ENTRIES {
            return Err(IdentError::corrupt("CHD metadata list does not terminate"));
        }
        let head = read_vec_at(reader, offset, 16)
            .map_err(|_| IdentError::corrupt("CHD metadata header is truncated"))?;
        let tag = u32::from_be_bytes(head[0..4].try_into().unwrap());
        let flags = head[4];
        let length = u32::from_be_bytes([0, head[5], head[6], head[7]]);
        let next = u64::from_be_bytes(head[8..16].try_into().unwrap());

        let data = read_vec_at(reader, offset + 16, length as usize)
            .map_err(|_| IdentError::corrupt("CHD metadata payload is truncated"))?;
        entries.push(MetadataEntry { tag, flags, data });
        offset = next;
    }

    Ok(entries)
}

/// A CD track described by `CHT2`/`CHTR`/`CHGT` metadata.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    pub number: u32,
    /// Track type string as stored ("MODE1_RAW", "AUDIO", ...).
    pub track_type: String,
    /// Subchannel type string ("NONE", "RW", ...).
    pub subtype: String,
    pub frames: u32,
    pub pregap: u32,
    pub postgap: u32,
    /// GD-ROM pad frames (CHGT only).
    pub pad: u32,
}

impl TrackInfo {
    /// Bytes of usable data per frame for this track type.
    pub fn data_size(&self) -> u32 {
        match self.track_type.as_str() {
            "MODE1" | "MODE2_FORM1" => 2048,
            "MODE2" | "MODE2_FORM_MIX" => 2336,
            "MODE2_FORM2" => 2324,
            _ => 2352, // MODE1_RAW, MODE2_RAW, AUDIO
        }
    }

    pub fn is_audio(&self) -> bool {
        self.track_type == "AUDIO"
    }
}

/// Parse the track list from the metadata entries.
///
/// Tracks must number contiguously from 1. Returns an empty list when no
/// track metadata is present (hard-disk images).
pub fn parse_tracks(entries: &[MetadataEntry]) -> Result<Vec<TrackInfo>, IdentError> {
    let mut tracks = Vec::new();
    for entry in entries {
        match entry.tag {
            TAG_CHT2 | TAG_CHTR | TAG_CHGT | TAG_CHGD => {
                if let Some(track) = parse_track_text(&entry.data) {
                    tracks.push(track);
                } else {
                    return Err(IdentError::corrupt("unparseable CHD track metadata"));
                }
            }
            _ => {}
        }
    }

    tracks.sort_by_key(|t| t.number);
    for (i, track) in tracks.iter().enumerate() {
        if track.number != i as u32 + 1 {
            return Err(IdentError::corrupt("CHD track numbers are not contiguous"));
        }
    }
    Ok(tracks)
}

/// Parse one `KEY:VALUE`-token track entry, e.g.
/// `TRACK:1 TYPE:MODE1_RAW SUBTYPE:NONE FRAMES:1234 PREGAP:0 ... POSTGAP:0`.
fn parse_track_text(data: &[u8]) -> Option<TrackInfo> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let text = std::str::from_utf8(&data[..end]).ok()?;

    let mut number = None;
    let mut track_type = None;
    let mut subtype = String::from("NONE");
    let mut frames = None;
    let mut pregap = 0;
    let mut postgap = 0;
    let mut pad = 0;

    for token in text.split_whitespace() {
        let Some((key, value)) = token.split_once(':') else {
            continue;
        };
        match key {
            "TRACK" => number = value.parse().ok(),
            "TYPE" => track_type = Some(value.to_string()),
            "SUBTYPE" => subtype = value.to_string(),
            "FRAMES" => frames = value.parse().ok(),
            "PREGAP" => pregap = value.parse().ok()?,
            "POSTGAP" => postgap = value.parse().ok()?,
            "PAD" => pad = value.parse().ok()?,
            _ => {}
        }
    }

    Some(TrackInfo {
        number: number?,
        track_type: track_type?,
        subtype,
        frames: frames?,
        pregap,
        postgap,
        pad,
    })
}
