use std::{fmt, str::FromStr};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };
}

/// A key code together with the exact set of modifiers held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: u32,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub const fn new(key: u32, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub const fn key_only(key: u32) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

/// Parses `[modifier+]*key`, where the key is a numeric key code or a single letter
/// (`"D"`, `"shift+68"`, `"ctrl+alt+m"`).
impl FromStr for KeyChord {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key = parts
            .pop()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("Missing key in '{s}'"))?;

        let mut modifiers = Modifiers::NONE;
        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                other => return Err(anyhow!("Unknown modifier '{other}' in '{s}'")),
            }
        }

        let mut chars = key.chars();
        let key = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase() as u32,
            _ => key
                .parse()
                .with_context(|| format!("Invalid key code '{key}'"))?,
        };
        Ok(Self::new(key, modifiers))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.alt {
            write!(f, "alt+")?;
        }
        if self.modifiers.shift {
            write!(f, "shift+")?;
        }
        if self.modifiers.meta {
            write!(f, "meta+")?;
        }
        write!(f, "{}", self.key)
    }
}
