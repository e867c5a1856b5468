//! Built-in master styles.

/// A predefined whole-image style filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterStyle {
    pub id: &'static str,
    pub label: &'static str,
    pub instruction: &'static str,
}

pub const MASTER_STYLES: &[MasterStyle] = &[
    MasterStyle {
        id: "minimal-white",
        label: "Minimal White",
        instruction: "Re-render as a minimalist architectural photograph: white render and pale stone, \
                      clean lines, soft diffuse daylight, restrained landscaping, calm neutral palette.",
    },
    MasterStyle {
        id: "brutalist-concrete",
        label: "Brutalist Concrete",
        instruction: "Re-render with board-formed exposed concrete, deep recesses and heavy cantilevers, \
                      dramatic raking light and a moody overcast sky.",
    },
    MasterStyle {
        id: "nordic-timber",
        label: "Nordic Timber",
        instruction: "Re-render with vertical light timber cladding, black window frames, \
                      birch and pine surroundings and cool Scandinavian daylight.",
    },
    MasterStyle {
        id: "glass-curtain",
        label: "Glass Curtain Wall",
        instruction: "Re-render with a high-performance glass curtain wall and slim metal mullions, \
                      crisp sky reflections and a polished contemporary urban setting.",
    },
    MasterStyle {
        id: "tropical-modern",
        label: "Tropical Modern",
        instruction: "Re-render as tropical modernism: deep overhangs, teak screens, lush planting, \
                      water features and warm humid afternoon light.",
    },
    MasterStyle {
        id: "watercolor-sketch",
        label: "Watercolor Presentation",
        instruction: "Re-render as a refined architectural watercolor presentation drawing with \
                      loose washes, fine ink linework and white paper showing through.",
    },
    MasterStyle {
        id: "dusk-cinematic",
        label: "Cinematic Dusk",
        instruction: "Re-render at blue hour with cinematic color grading, glowing interiors, \
                      light trails on nearby roads and a deep gradient sky.",
    },
];

/// Looks a style up by id, ignoring case.
pub fn find_style(id: &str) -> Option<&'static MasterStyle> {
    MASTER_STYLES.iter().find(|s| s.id.eq_ignore_ascii_case(id.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<_> = MASTER_STYLES.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), MASTER_STYLES.len());
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        assert_eq!(find_style(" Nordic-Timber ").map(|s| s.label), Some("Nordic Timber"));
        assert!(find_style("baroque").is_none());
    }
}
