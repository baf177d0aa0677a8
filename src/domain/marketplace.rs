//! Target marketplaces and the rules keyed on them

use std::fmt;
use std::str::FromStr;

use crate::error::PackError;

/// A target deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Marketplace {
    Xsoar,
    XsoarSaas,
    XsoarOnPrem,
    MarketplaceV2,
    Xpanse,
    Platform,
}

impl Marketplace {
    pub const ALL: [Marketplace; 6] = [
        Marketplace::Xsoar,
        Marketplace::XsoarSaas,
        Marketplace::XsoarOnPrem,
        Marketplace::MarketplaceV2,
        Marketplace::Xpanse,
        Marketplace::Platform,
    ];

    /// Name as written in content files and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Marketplace::Xsoar => "xsoar",
            Marketplace::XsoarSaas => "xsoar_saas",
            Marketplace::XsoarOnPrem => "xsoar_on_prem",
            Marketplace::MarketplaceV2 => "marketplacev2",
            Marketplace::Xpanse => "xpanse",
            Marketplace::Platform => "platform",
        }
    }

    /// Default storage bucket for README image URLs
    pub fn default_bucket(self) -> &'static str {
        match self {
            Marketplace::Xsoar | Marketplace::XsoarOnPrem => "marketplace-dist",
            Marketplace::MarketplaceV2 => "marketplace-v2-dist",
            Marketplace::Xpanse => "xpanse-dist",
            Marketplace::XsoarSaas => "marketplace-saas-dist",
            Marketplace::Platform => "marketplace-cortex-content",
        }
    }

    /// Whether content declared for `self` ships to `target`.
    ///
    /// `xsoar` covers both xsoar variants; `xsoar_on_prem` also covers plain `xsoar`.
    pub fn covers(self, target: Marketplace) -> bool {
        match self {
            Marketplace::Xsoar => matches!(
                target,
                Marketplace::Xsoar | Marketplace::XsoarSaas | Marketplace::XsoarOnPrem
            ),
            Marketplace::XsoarOnPrem => {
                matches!(target, Marketplace::XsoarOnPrem | Marketplace::Xsoar)
            }
            other => other == target,
        }
    }

    pub fn is_xsoar_family(self) -> bool {
        matches!(
            self,
            Marketplace::Xsoar | Marketplace::XsoarSaas | Marketplace::XsoarOnPrem
        )
    }

    /// Whether README images are served through the marketplace file API
    pub fn serves_images_via_api(self) -> bool {
        matches!(self, Marketplace::MarketplaceV2 | Marketplace::XsoarSaas)
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marketplace {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xsoar" => Ok(Marketplace::Xsoar),
            "xsoar_saas" => Ok(Marketplace::XsoarSaas),
            "xsoar_on_prem" => Ok(Marketplace::XsoarOnPrem),
            "marketplacev2" | "xsiam" => Ok(Marketplace::MarketplaceV2),
            "xpanse" => Ok(Marketplace::Xpanse),
            "platform" => Ok(Marketplace::Platform),
            _ => Err(PackError::UnknownMarketplace {
                value: s.to_string(),
            }),
        }
    }
}

/// Key suffixes selecting marketplace-specific values, most specific first
pub const KEY_SUFFIXES: [&str; 6] = [
    ":xsoar_on_prem",
    ":xsoar_saas",
    ":marketplacev2",
    ":xpanse",
    ":xsoar",
    "_x2",
];

/// Split a key into its base and suffix, if it carries one
pub fn split_suffix(key: &str) -> Option<(&str, &'static str)> {
    KEY_SUFFIXES.iter().find_map(|suffix| {
        key.strip_suffix(suffix)
            .filter(|base| !base.is_empty())
            .map(|base| (base, *suffix))
    })
}

/// Whether a key suffix applies to `target`, and how strongly.
///
/// Higher ranks override lower ones when several suffixes match.
pub fn suffix_rank(suffix: &str, target: Marketplace) -> Option<u8> {
    match (suffix, target) {
        (":xsoar_saas", Marketplace::XsoarSaas)
        | (":xsoar_on_prem", Marketplace::XsoarOnPrem)
        | (":marketplacev2", Marketplace::MarketplaceV2)
        | (":xpanse", Marketplace::Xpanse) => Some(3),
        (":xsoar", t) if t.is_xsoar_family() => Some(2),
        ("_x2", Marketplace::MarketplaceV2) => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_marketplace() {
        assert_eq!("xsoar".parse::<Marketplace>().unwrap(), Marketplace::Xsoar);
        assert_eq!(
            "marketplacev2".parse::<Marketplace>().unwrap(),
            Marketplace::MarketplaceV2
        );
        assert_eq!(
            "XSOAR_SAAS".parse::<Marketplace>().unwrap(),
            Marketplace::XsoarSaas
        );
        assert!(matches!(
            "bogus".parse::<Marketplace>(),
            Err(PackError::UnknownMarketplace { .. })
        ));
    }

    #[test]
    fn test_round_trip_names() {
        for mp in Marketplace::ALL {
            assert_eq!(mp.as_str().parse::<Marketplace>().unwrap(), mp);
        }
    }

    #[test]
    fn test_covers() {
        assert!(Marketplace::Xsoar.covers(Marketplace::XsoarSaas));
        assert!(Marketplace::Xsoar.covers(Marketplace::XsoarOnPrem));
        assert!(Marketplace::XsoarOnPrem.covers(Marketplace::Xsoar));
        assert!(!Marketplace::XsoarSaas.covers(Marketplace::Xsoar));
        assert!(!Marketplace::MarketplaceV2.covers(Marketplace::Platform));
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("id:xsoar"), Some(("id", ":xsoar")));
        assert_eq!(split_suffix("id:xsoar_saas"), Some(("id", ":xsoar_saas")));
        assert_eq!(split_suffix("name_x2"), Some(("name", "_x2")));
        assert_eq!(split_suffix("id"), None);
        assert_eq!(split_suffix(":xsoar"), None);
    }

    #[test]
    fn test_suffix_rank() {
        assert_eq!(suffix_rank(":xsoar", Marketplace::XsoarSaas), Some(2));
        assert_eq!(suffix_rank(":xsoar_saas", Marketplace::XsoarSaas), Some(3));
        assert_eq!(suffix_rank(":xsoar", Marketplace::MarketplaceV2), None);
        assert_eq!(suffix_rank("_x2", Marketplace::MarketplaceV2), Some(1));
        assert_eq!(suffix_rank(":xpanse", Marketplace::Xsoar), None);
    }
}
