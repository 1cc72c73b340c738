use iplandscape_model::{OTHER, UNKNOWN};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Region labels known to the built-in table.
pub const REGIONS: [&str; 5] = [
    "North America",
    "Europe",
    "Asia Pacific",
    "Middle East & Africa",
    "Latin America",
];

const BUILTIN: &[(&str, &[&str])] = &[
    ("North America", &["US", "CA", "MX"]),
    (
        "Europe",
        &[
            "GB", "UK", "DE", "FR", "IT", "ES", "NL", "BE", "CH", "AT", "SE", "NO", "DK", "FI",
            "PL", "IE", "PT", "GR", "CZ", "HU",
        ],
    ),
    (
        "Asia Pacific",
        &[
            "CN", "JP", "KR", "IN", "AU", "NZ", "SG", "TW", "HK", "MY", "TH", "PH", "ID", "VN",
        ],
    ),
    ("Middle East & Africa", &["AE", "SA", "IL", "ZA", "EG", "TR"]),
    ("Latin America", &["BR", "AR", "CL", "CO", "PE"]),
];

/// Static country code to region lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTable {
    /// Keys are uppercased codes
    regions: HashMap<String, String>,
}

impl RegionTable {
    pub fn new<C, R>(entries: impl IntoIterator<Item = (C, R)>) -> Self
    where
        C: AsRef<str>,
        R: Into<String>,
    {
        Self {
            regions: entries
                .into_iter()
                .map(|(code, region)| (code.as_ref().trim().to_uppercase(), region.into()))
                .collect(),
        }
    }

    /// Map a country code to its region.
    ///
    /// Absent or blank input gives `"Unknown"`; a code missing from the
    /// table gives `"Other"`.
    pub fn map(&self, country: Option<&str>) -> &str {
        let code = country.map(str::trim).unwrap_or_default();
        if code.is_empty() {
            return UNKNOWN;
        }

        self.regions
            .get(&code.to_uppercase())
            .map_or(OTHER, String::as_str)
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .flat_map(|(region, codes)| codes.iter().map(move |code| (*code, *region))),
        )
    }
}

/// Map against the built-in table.
pub fn map_region(country: Option<&str>) -> &'static str {
    static DEFAULT: OnceLock<RegionTable> = OnceLock::new();
    DEFAULT.get_or_init(RegionTable::default).map(country)
}
