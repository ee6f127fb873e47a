//! Per-role visual styles.

use crate::message::Role;

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Presentation of one span of text. The default value is unstyled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub color: Option<Rgb>,
    pub size: Option<u16>,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(color: Rgb, size: u16) -> Self {
        Self {
            color: Some(color),
            size: Some(size),
            bold: false,
        }
    }

    /// The same style with bold weight.
    pub fn bolded(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// One style per role. Fixed when a display is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProfile {
    pub user: TextStyle,
    pub assistant: TextStyle,
    pub system: TextStyle,
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            user: TextStyle::new(Rgb(135, 206, 235), 18),
            assistant: TextStyle::new(Rgb(255, 182, 193), 18),
            system: TextStyle::new(Rgb(255, 207, 72), 17),
        }
    }
}

impl StyleProfile {
    pub fn for_role(&self, role: Role) -> TextStyle {
        match role {
            Role::User => self.user,
            Role::Assistant => self.assistant,
            Role::System => self.system,
        }
    }
}
