use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::models::{SurfaceClass, SurfaceCode};

/// Canonical name used when the service tagged a segment with nothing.
pub const UNSPECIFIED_SURFACE: &str = "unspecified";
pub const UNKNOWN_SURFACE: &str = "unknown";

/// openrouteservice surface codes 0..=18.
static DEFAULT_SURFACES: Lazy<HashMap<i64, &'static str>> = Lazy::new(|| {
    [
        (0, "unknown"),
        (1, "paved"),
        (2, "unpaved"),
        (3, "asphalt"),
        (4, "concrete"),
        (5, "cobblestone"),
        (6, "metal"),
        (7, "wood"),
        (8, "compacted"),
        (9, "fine_gravel"),
        (10, "gravel"),
        (11, "dirt"),
        (12, "ground"),
        (13, "ice"),
        (14, "paving_stones"),
        (15, "sand"),
        (16, "woodchips"),
        (17, "grass"),
        (18, "grass_paver"),
    ]
    .into_iter()
    .collect()
});

const UNPAVED_SURFACES: [&str; 15] = [
    "unpaved",
    "compacted",
    "dirt",
    "earth",
    "gravel",
    "fine_gravel",
    "grass",
    "ground",
    "sand",
    "wood",
    "mud",
    "clay",
    "salt",
    "ice",
    "snow",
];

/// Surface lookup for one routing response.
///
/// The default table is shared and read-only; names supplied by the service
/// for a particular response live in `overrides` and die with it.
#[derive(Debug, Clone, Default)]
pub struct SurfaceTaxonomy {
    overrides: HashMap<i64, String>,
}

impl SurfaceTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: AsRef<str>,
    {
        let overrides = entries
            .into_iter()
            .map(|(code, name)| (code, normalize_name(name.as_ref())))
            .filter(|(_, name)| !name.is_empty())
            .collect();
        Self { overrides }
    }

    /// Canonical name for a service tag.
    pub fn resolve(&self, code: &SurfaceCode) -> String {
        match code.numeric() {
            Some(value) => self
                .overrides
                .get(&value)
                .cloned()
                .or_else(|| DEFAULT_SURFACES.get(&value).map(|name| name.to_string()))
                .unwrap_or_else(|| UNKNOWN_SURFACE.to_string()),
            None => {
                let tag = code.to_string();
                let tag = tag.trim();
                if tag.is_empty() {
                    UNSPECIFIED_SURFACE.to_string()
                } else {
                    tag.to_string()
                }
            }
        }
    }
}

/// Paved unless the canonical name is in the fixed unpaved set.
pub fn classify(name: &str) -> SurfaceClass {
    let normalized = normalize_name(name);
    if UNPAVED_SURFACES.contains(&normalized.as_str()) {
        SurfaceClass::Unpaved
    } else {
        SurfaceClass::Paved
    }
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_all_codes() {
        let expected = [
            "unknown",
            "paved",
            "unpaved",
            "asphalt",
            "concrete",
            "cobblestone",
            "metal",
            "wood",
            "compacted",
            "fine_gravel",
            "gravel",
            "dirt",
            "ground",
            "ice",
            "paving_stones",
            "sand",
            "woodchips",
            "grass",
            "grass_paver",
        ];
        let taxonomy = SurfaceTaxonomy::new();
        for (code, name) in expected.iter().enumerate() {
            assert_eq!(
                taxonomy.resolve(&SurfaceCode::Numeric(code as i64)),
                *name,
                "code {code}"
            );
        }
        assert_eq!(taxonomy.resolve(&SurfaceCode::Numeric(19)), UNKNOWN_SURFACE);
    }

    #[test]
    fn code_zero_is_unknown_and_paved() {
        let name = SurfaceTaxonomy::new().resolve(&SurfaceCode::Numeric(0));
        assert_eq!(name, "unknown");
        assert_eq!(classify(&name), SurfaceClass::Paved);
    }

    #[test]
    fn overrides_take_precedence_for_that_response_only() {
        let custom = SurfaceTaxonomy::with_overrides([(3, "Fine Gravel")]);
        assert_eq!(custom.resolve(&SurfaceCode::Numeric(3)), "fine_gravel");

        let fresh = SurfaceTaxonomy::new();
        assert_eq!(fresh.resolve(&SurfaceCode::Numeric(3)), "asphalt");
    }

    #[test]
    fn numeric_strings_use_the_table() {
        let taxonomy = SurfaceTaxonomy::new();
        assert_eq!(taxonomy.resolve(&SurfaceCode::Tag("10".into())), "gravel");
    }

    #[test]
    fn free_tags_pass_through() {
        let taxonomy = SurfaceTaxonomy::new();
        assert_eq!(taxonomy.resolve(&SurfaceCode::Tag("laterite".into())), "laterite");
        assert_eq!(taxonomy.resolve(&SurfaceCode::Tag("  ".into())), UNSPECIFIED_SURFACE);
    }

    #[test]
    fn unknown_numeric_code_resolves_to_unknown() {
        let taxonomy = SurfaceTaxonomy::new();
        assert_eq!(taxonomy.resolve(&SurfaceCode::Numeric(97)), UNKNOWN_SURFACE);
    }

    #[test]
    fn unpaved_set_classifies_as_unpaved() {
        for name in UNPAVED_SURFACES {
            assert_eq!(classify(name), SurfaceClass::Unpaved, "{name}");
        }
        assert_eq!(classify("Fine Gravel"), SurfaceClass::Unpaved);
    }

    #[test]
    fn everything_else_is_paved() {
        for name in [
            "asphalt",
            "concrete",
            "paving_stones",
            "grass_paver",
            "woodchips",
            "unknown",
            UNSPECIFIED_SURFACE,
            "",
            "laterite",
        ] {
            assert_eq!(classify(name), SurfaceClass::Paved, "{name}");
        }
    }
}
