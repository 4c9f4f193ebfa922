use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The kinds of content hashes an identified item can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum HashKind {
    /// SHA-1 of the file bytes.
    #[serde(rename = "sha1")]
    Sha1,
    /// MD5 of the file bytes.
    #[serde(rename = "md5")]
    Md5,
    /// CRC-32 (IEEE) of the file bytes.
    #[serde(rename = "crc32")]
    Crc32,
    /// CRC-32 copied from ZIP central-directory metadata (uncompressed data).
    #[serde(rename = "zip-crc32")]
    ZipCrc32,
    /// SHA-1 of the raw (decompressed) contents, from the CHD header.
    #[serde(rename = "chd-uncompressed-sha1")]
    ChdUncompressedSha1,
    /// SHA-1 of the compressed CHD stream, from the CHD header.
    #[serde(rename = "chd-compressed-sha1")]
    ChdCompressedSha1,
}

impl HashKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
            Self::Crc32 => "crc32",
            Self::ZipCrc32 => "zip-crc32",
            Self::ChdUncompressedSha1 => "chd-uncompressed-sha1",
            Self::ChdCompressedSha1 => "chd-compressed-sha1",
        }
    }
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Hash values for one item, keyed by kind. Values are lowercase hex with no
/// separators; at most one value per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hashes(BTreeMap<HashKind, String>);

impl Hashes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: HashKind, hex: impl Into<String>) {
        self.0.insert(kind, hex.into());
    }

    pub fn get(&self, kind: HashKind) -> Option<&str> {
        self.0.get(&kind).map(String::as_str)
    }

    pub fn contains(&self, kind: HashKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HashKind, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Copy every entry of `other` into `self`, overwriting duplicates.
    pub fn merge(&mut self, other: &Hashes) {
        for (kind, hex) in other.iter() {
            self.insert(kind, hex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut hashes = Hashes::new();
        hashes.insert(HashKind::Crc32, "775ae755");
        assert_eq!(hashes.get(HashKind::Crc32), Some("775ae755"));
        assert_eq!(hashes.get(HashKind::Sha1), None);
        assert_eq!(hashes.len(), 1);
    }

    #[test]
    fn serializes_with_kind_names() {
        let mut hashes = Hashes::new();
        hashes.insert(HashKind::ZipCrc32, "deadbeef");
        hashes.insert(HashKind::Sha1, "abc123");
        let json = serde_json::to_value(&hashes).unwrap();
        assert_eq!(json["zip-crc32"], "deadbeef");
        assert_eq!(json["sha1"], "abc123");
    }

    #[test]
    fn merge_overwrites() {
        let mut a = Hashes::new();
        a.insert(HashKind::Crc32, "11111111");
        let mut b = Hashes::new();
        b.insert(HashKind::Crc32, "22222222");
        b.insert(HashKind::Md5, "33");
        a.merge(&b);
        assert_eq!(a.get(HashKind::Crc32), Some("22222222"));
        assert_eq!(a.get(HashKind::Md5), Some("33"));
    }
}
