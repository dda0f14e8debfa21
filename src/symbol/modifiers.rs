use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Declaration modifiers that are not about visibility.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const STATIC   = 0b0000_0001;
        const ABSTRACT = 0b0000_0010;
        const FINAL    = 0b0000_0100;
        const READONLY = 0b0000_1000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Visibility: u32 {
        const PUBLIC    = 0b0001;
        const PROTECTED = 0b0010;
        const PRIVATE   = 0b0100;
    }
}

/// One modifier keyword as it appears in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierWord {
    Modifier(Modifiers),
    Visibility(Visibility),
}

impl ModifierWord {
    pub fn parse(keyword: &str) -> Option<Self> {
        let word = match keyword.trim().to_ascii_lowercase().as_str() {
            "static" => Self::Modifier(Modifiers::STATIC),
            "abstract" => Self::Modifier(Modifiers::ABSTRACT),
            "final" => Self::Modifier(Modifiers::FINAL),
            "readonly" => Self::Modifier(Modifiers::READONLY),
            "public" | "var" => Self::Visibility(Visibility::PUBLIC),
            "protected" => Self::Visibility(Visibility::PROTECTED),
            "private" => Self::Visibility(Visibility::PRIVATE),
            _ => return None,
        };
        Some(word)
    }
}

impl Visibility {
    pub fn keyword(&self) -> &'static str {
        if self.contains(Visibility::PRIVATE) {
            "private"
        } else if self.contains(Visibility::PROTECTED) {
            "protected"
        } else {
            "public"
        }
    }
}
