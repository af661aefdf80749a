//! The fixed catalog of solar periods.
//!
//! Accessories store the selected period as an index into [`SolarPeriod::ALL`],
//! so the order of this catalog is part of the persisted format and must never
//! change. Names follow the suncalc convention and are matched
//! case-insensitively when read from configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named astronomical event of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolarPeriod {
    /// Top edge of the sun appears on the horizon.
    Sunrise,
    /// Bottom edge of the sun touches the horizon.
    SunriseEnd,
    /// Morning golden hour ends (sun at +6°).
    GoldenHourEnd,
    /// Sun at its highest point.
    SolarNoon,
    /// Evening golden hour starts (sun at +6°).
    GoldenHour,
    /// Bottom edge of the sun touches the horizon.
    SunsetStart,
    /// Sun disappears below the horizon.
    Sunset,
    /// Civil dusk (sun at -6°).
    Dusk,
    /// Nautical dusk (sun at -12°).
    NauticalDusk,
    /// Astronomical dusk, night starts (sun at -18°).
    Night,
    /// Darkest moment of the night.
    Nadir,
    /// Astronomical dawn, night ends (sun at -18°).
    NightEnd,
    /// Nautical dawn (sun at -12°).
    NauticalDawn,
    /// Civil dawn (sun at -6°).
    Dawn,
}

impl SolarPeriod {
    /// Catalog order. Index `i` of a stored configuration refers to `ALL[i]`.
    pub const ALL: [SolarPeriod; 14] = [
        SolarPeriod::Sunrise,
        SolarPeriod::SunriseEnd,
        SolarPeriod::GoldenHourEnd,
        SolarPeriod::SolarNoon,
        SolarPeriod::GoldenHour,
        SolarPeriod::SunsetStart,
        SolarPeriod::Sunset,
        SolarPeriod::Dusk,
        SolarPeriod::NauticalDusk,
        SolarPeriod::Night,
        SolarPeriod::Nadir,
        SolarPeriod::NightEnd,
        SolarPeriod::NauticalDawn,
        SolarPeriod::Dawn,
    ];

    /// Look up a period by catalog index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this period in the catalog.
    pub fn index(self) -> usize {
        // ALL lists every variant in declaration order
        self as usize
    }

    /// Canonical (suncalc) name of the period.
    pub fn name(self) -> &'static str {
        match self {
            SolarPeriod::Sunrise => "sunrise",
            SolarPeriod::SunriseEnd => "sunriseEnd",
            SolarPeriod::GoldenHourEnd => "goldenHourEnd",
            SolarPeriod::SolarNoon => "solarNoon",
            SolarPeriod::GoldenHour => "goldenHour",
            SolarPeriod::SunsetStart => "sunsetStart",
            SolarPeriod::Sunset => "sunset",
            SolarPeriod::Dusk => "dusk",
            SolarPeriod::NauticalDusk => "nauticalDusk",
            SolarPeriod::Night => "night",
            SolarPeriod::Nadir => "nadir",
            SolarPeriod::NightEnd => "nightEnd",
            SolarPeriod::NauticalDawn => "nauticalDawn",
            SolarPeriod::Dawn => "dawn",
        }
    }

    /// One-line explanation for listings.
    pub fn description(self) -> &'static str {
        match self {
            SolarPeriod::Sunrise => "top of the sun appears on the horizon",
            SolarPeriod::SunriseEnd => "bottom of the sun clears the horizon",
            SolarPeriod::GoldenHourEnd => "morning golden hour ends (+6°)",
            SolarPeriod::SolarNoon => "sun at its highest point",
            SolarPeriod::GoldenHour => "evening golden hour starts (+6°)",
            SolarPeriod::SunsetStart => "bottom of the sun touches the horizon",
            SolarPeriod::Sunset => "sun disappears below the horizon",
            SolarPeriod::Dusk => "civil dusk (-6°)",
            SolarPeriod::NauticalDusk => "nautical dusk (-12°)",
            SolarPeriod::Night => "astronomical dusk, night starts (-18°)",
            SolarPeriod::Nadir => "darkest moment of the night",
            SolarPeriod::NightEnd => "astronomical dawn, night ends (-18°)",
            SolarPeriod::NauticalDawn => "nautical dawn (-12°)",
            SolarPeriod::Dawn => "civil dawn (-6°)",
        }
    }

    /// Find a period by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|period| period.name().eq_ignore_ascii_case(wanted))
    }

    /// Resolve a configured period name to its catalog index.
    ///
    /// Unknown names resolve to index 0. The second element tells the caller
    /// whether the name matched, so the fallback can be reported.
    pub fn resolve_index(name: &str) -> (usize, bool) {
        match Self::from_name(name) {
            Some(period) => (period.index(), true),
            None => (0, false),
        }
    }
}

impl fmt::Display for SolarPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_indices_match_declaration_order() {
        for (i, period) in SolarPeriod::ALL.iter().enumerate() {
            assert_eq!(period.index(), i, "{period} is out of order");
            assert_eq!(SolarPeriod::from_index(i), Some(*period));
        }
        assert_eq!(SolarPeriod::from_index(SolarPeriod::ALL.len()), None);
    }

    #[test]
    fn test_names_resolve_case_insensitively() {
        assert_eq!(SolarPeriod::from_name("SUNSET"), Some(SolarPeriod::Sunset));
        assert_eq!(
            SolarPeriod::from_name("goldenhourend"),
            Some(SolarPeriod::GoldenHourEnd)
        );
        assert_eq!(
            SolarPeriod::from_name("  solarNoon "),
            Some(SolarPeriod::SolarNoon)
        );
    }

    #[test]
    fn test_unknown_name_falls_back_to_first_entry() {
        assert_eq!(SolarPeriod::resolve_index("teatime"), (0, false));
        assert_eq!(SolarPeriod::resolve_index(""), (0, false));
        assert_eq!(
            SolarPeriod::resolve_index("Dusk"),
            (SolarPeriod::Dusk.index(), true)
        );
    }

    #[test]
    fn test_serde_uses_catalog_names() {
        let json = serde_json::to_string(&SolarPeriod::NauticalDawn).unwrap();
        assert_eq!(json, "\"nauticalDawn\"");
        let back: SolarPeriod = serde_json::from_str("\"sunriseEnd\"").unwrap();
        assert_eq!(back, SolarPeriod::SunriseEnd);
    }
}
