use std::fmt;

use crate::style::TextState;

/// Identifier of one loaded font face.
///
/// The numbering is shared with the font loader: each id names exactly one
/// family/weight/style combination in its atlas table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FontId {
    /// Logical body family, regular.
    Normal = 0,
    /// Logical heading family, regular.
    Large = 1,
    NormalBold = 2,
    NormalItalic = 3,
    NormalBoldItalic = 4,
    LargeBold = 5,
    LargeItalic = 6,
    LargeBoldItalic = 7,
    Monospace = 8,
}

impl FontId {
    pub const ALL: [FontId; 9] = [
        FontId::Normal,
        FontId::Large,
        FontId::NormalBold,
        FontId::NormalItalic,
        FontId::NormalBoldItalic,
        FontId::LargeBold,
        FontId::LargeItalic,
        FontId::LargeBoldItalic,
        FontId::Monospace,
    ];

    /// Slot in the font loader's atlas table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// What the font loader has to rasterize for this id.
    pub fn face_request(self) -> FaceRequest {
        let (family, size_px) = match self {
            FontId::Monospace => (MONOSPACE_FAMILY, 18),
            FontId::Large | FontId::LargeBold | FontId::LargeItalic | FontId::LargeBoldItalic => {
                (SANS_FAMILY, 48)
            }
            _ => (SANS_FAMILY, 18),
        };
        let weight = match self {
            FontId::NormalBold
            | FontId::NormalBoldItalic
            | FontId::LargeBold
            | FontId::LargeBoldItalic => BOLD_WEIGHT,
            _ => NORMAL_WEIGHT,
        };
        let italic = matches!(
            self,
            FontId::NormalItalic
                | FontId::NormalBoldItalic
                | FontId::LargeItalic
                | FontId::LargeBoldItalic
        );
        FaceRequest {
            family,
            size_px,
            weight,
            italic,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FontId::Normal => "normal",
            FontId::Large => "large",
            FontId::NormalBold => "normal-bold",
            FontId::NormalItalic => "normal-italic",
            FontId::NormalBoldItalic => "normal-bold-italic",
            FontId::LargeBold => "large-bold",
            FontId::LargeItalic => "large-italic",
            FontId::LargeBoldItalic => "large-bold-italic",
            FontId::Monospace => "mono",
        }
    }
}

impl fmt::Display for FontId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const SANS_FAMILY: &str =
    "-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Noto Sans SC', sans-serif";
const MONOSPACE_FAMILY: &str = "ui-monospace, SFMono-Regular, Menlo, Monaco, Consolas, \
     'Liberation Mono', 'Courier New', monospace";
const NORMAL_WEIGHT: u16 = 300;
const BOLD_WEIGHT: u16 = 500;

/// A font face as the external font loader must produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRequest {
    /// CSS font-family stack.
    pub family: &'static str,
    pub size_px: u16,
    pub weight: u16,
    pub italic: bool,
}

/// Pick the concrete face for a logical family under the given text state.
///
/// Monospace wins over everything. Otherwise [`FontId::Normal`] and
/// [`FontId::Large`] each select among their plain, bold, italic and
/// bold-italic faces; any other id is returned as is.
pub fn resolve(family: FontId, state: &TextState) -> FontId {
    if state.monospace {
        return FontId::Monospace;
    }

    match (family, state.bold, state.italic) {
        (FontId::Normal, true, true) => FontId::NormalBoldItalic,
        (FontId::Normal, true, false) => FontId::NormalBold,
        (FontId::Normal, false, true) => FontId::NormalItalic,
        (FontId::Large, true, true) => FontId::LargeBoldItalic,
        (FontId::Large, true, false) => FontId::LargeBold,
        (FontId::Large, false, true) => FontId::LargeItalic,
        (other, _, _) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(bold: bool, italic: bool, monospace: bool) -> TextState {
        TextState {
            bold,
            italic,
            monospace,
            ..TextState::default()
        }
    }

    #[test]
    fn normal_family_variants() {
        assert_eq!(resolve(FontId::Normal, &state(false, false, false)), FontId::Normal);
        assert_eq!(resolve(FontId::Normal, &state(true, false, false)), FontId::NormalBold);
        assert_eq!(resolve(FontId::Normal, &state(false, true, false)), FontId::NormalItalic);
        assert_eq!(
            resolve(FontId::Normal, &state(true, true, false)),
            FontId::NormalBoldItalic
        );
    }

    #[test]
    fn large_family_variants() {
        assert_eq!(resolve(FontId::Large, &state(false, false, false)), FontId::Large);
        assert_eq!(resolve(FontId::Large, &state(true, false, false)), FontId::LargeBold);
        assert_eq!(resolve(FontId::Large, &state(false, true, false)), FontId::LargeItalic);
        assert_eq!(
            resolve(FontId::Large, &state(true, true, false)),
            FontId::LargeBoldItalic
        );
    }

    #[test]
    fn monospace_overrides_everything() {
        for family in FontId::ALL {
            assert_eq!(resolve(family, &state(true, true, true)), FontId::Monospace);
            assert_eq!(resolve(family, &state(false, false, true)), FontId::Monospace);
        }
    }

    #[test]
    fn unknown_family_passes_through() {
        assert_eq!(resolve(FontId::LargeBold, &state(false, true, false)), FontId::LargeBold);
        assert_eq!(resolve(FontId::Monospace, &state(true, false, false)), FontId::Monospace);
    }

    #[test]
    fn ids_match_loader_slots() {
        for (slot, id) in FontId::ALL.iter().enumerate() {
            assert_eq!(id.index(), slot);
        }
    }

    #[test]
    fn face_requests() {
        let bold_big = FontId::LargeBoldItalic.face_request();
        assert_eq!(bold_big.size_px, 48);
        assert_eq!(bold_big.weight, 500);
        assert!(bold_big.italic);

        let mono = FontId::Monospace.face_request();
        assert!(mono.family.ends_with("monospace"));
        assert_eq!(mono.weight, 300);
        assert!(!mono.italic);
    }
}
