use serde::{Deserialize, Serialize};

/// Geographic regions for game releases, arranged as a tree rooted at
/// [`Region::World`].
///
/// Continents sit under `World` and countries under their continent, so a
/// release tagged `Japan` can be matched against a filter for `Asia` or
/// `World` via [`Region::is_ancestor_of`]. `Unknown` sits outside the tree
/// and has the empty string as its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    /// World / region-free. Root of the hierarchy.
    World,

    // Continents
    Europe,
    Asia,
    Americas,
    Oceania,
    MiddleEast,
    Africa,

    // Asia
    Japan,
    Korea,
    China,
    Taiwan,
    HongKong,

    // Americas
    Usa,
    Canada,
    Brazil,

    // Oceania
    Australia,
    NewZealand,

    // Europe
    UnitedKingdom,
    France,
    Germany,
    Spain,
    Italy,
    Netherlands,

    /// Unknown region. Not part of the tree.
    Unknown,
}

impl Region {
    /// Canonical region code. `Unknown` is the empty string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::World => "World",
            Self::Europe => "Europe",
            Self::Asia => "Asia",
            Self::Americas => "Americas",
            Self::Oceania => "Oceania",
            Self::MiddleEast => "Middle East",
            Self::Africa => "Africa",
            Self::Japan => "Japan",
            Self::Korea => "Korea",
            Self::China => "China",
            Self::Taiwan => "Taiwan",
            Self::HongKong => "Hong Kong",
            Self::Usa => "USA",
            Self::Canada => "Canada",
            Self::Brazil => "Brazil",
            Self::Australia => "Australia",
            Self::NewZealand => "New Zealand",
            Self::UnitedKingdom => "United Kingdom",
            Self::France => "France",
            Self::Germany => "Germany",
            Self::Spain => "Spain",
            Self::Italy => "Italy",
            Self::Netherlands => "Netherlands",
            Self::Unknown => "",
        }
    }

    /// Parent region in the hierarchy. `World` and `Unknown` have none.
    pub fn parent(&self) -> Option<Region> {
        match self {
            Self::World | Self::Unknown => None,

            Self::Europe
            | Self::Asia
            | Self::Americas
            | Self::Oceania
            | Self::MiddleEast
            | Self::Africa => Some(Self::World),

            Self::Japan | Self::Korea | Self::China | Self::Taiwan | Self::HongKong => {
                Some(Self::Asia)
            }

            Self::Usa | Self::Canada | Self::Brazil => Some(Self::Americas),

            Self::Australia | Self::NewZealand => Some(Self::Oceania),

            Self::UnitedKingdom
            | Self::France
            | Self::Germany
            | Self::Spain
            | Self::Italy
            | Self::Netherlands => Some(Self::Europe),
        }
    }

    /// Chain of ancestors from the immediate parent up to the root.
    pub fn ancestors(&self) -> Vec<Region> {
        let mut chain = Vec::new();
        let mut cur = *self;
        while let Some(parent) = cur.parent() {
            chain.push(parent);
            cur = parent;
        }
        chain
    }

    /// Whether `self` is a strict ancestor of `other`, and at what distance.
    ///
    /// Returns `(true, n)` where `n` is the number of parent edges between
    /// them, or `(false, -1)`. A region is never its own ancestor.
    pub fn is_ancestor_of(&self, other: Region) -> (bool, i32) {
        let mut distance = 0;
        let mut cur = other;
        while let Some(parent) = cur.parent() {
            distance += 1;
            if parent == *self {
                return (true, distance);
            }
            cur = parent;
        }
        (false, -1)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Region] = &[
        Region::World,
        Region::Europe,
        Region::Asia,
        Region::Americas,
        Region::Oceania,
        Region::MiddleEast,
        Region::Africa,
        Region::Japan,
        Region::Korea,
        Region::China,
        Region::Taiwan,
        Region::HongKong,
        Region::Usa,
        Region::Canada,
        Region::Brazil,
        Region::Australia,
        Region::NewZealand,
        Region::UnitedKingdom,
        Region::France,
        Region::Germany,
        Region::Spain,
        Region::Italy,
        Region::Netherlands,
        Region::Unknown,
    ];

    #[test]
    fn never_own_ancestor() {
        for &r in ALL {
            assert_eq!(r.is_ancestor_of(r), (false, -1), "{r:?}");
        }
    }

    #[test]
    fn parent_is_ancestor_at_distance_one() {
        for &r in ALL {
            if let Some(parent) = r.parent() {
                assert_eq!(parent.is_ancestor_of(r), (true, 1), "{r:?}");
            }
        }
    }

    #[test]
    fn world_is_ancestor_of_countries_at_distance_two() {
        assert_eq!(Region::World.is_ancestor_of(Region::Japan), (true, 2));
        assert_eq!(Region::World.is_ancestor_of(Region::Usa), (true, 2));
        assert_eq!(Region::World.is_ancestor_of(Region::Germany), (true, 2));
    }

    #[test]
    fn unrelated_regions_are_not_ancestors() {
        assert_eq!(Region::Asia.is_ancestor_of(Region::Usa), (false, -1));
        assert_eq!(Region::Japan.is_ancestor_of(Region::Asia), (false, -1));
    }

    #[test]
    fn ancestors_chain() {
        assert_eq!(Region::Japan.ancestors(), vec![Region::Asia, Region::World]);
        assert_eq!(Region::Europe.ancestors(), vec![Region::World]);
        assert!(Region::World.ancestors().is_empty());
        assert!(Region::Unknown.ancestors().is_empty());
    }

    #[test]
    fn unknown_has_empty_code() {
        assert_eq!(Region::Unknown.code(), "");
    }
}
