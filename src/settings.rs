use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::keys::{KeyChord, Modifiers};

pub const MIN_SPEED: f64 = 0.07;
pub const MAX_SPEED: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Faster,
    Slower,
    SetSpeed,
    Reset,
    Fast,
    Pause,
    Muted,
    Louder,
    Softer,
    Advance,
    Rewind,
    Mark,
    Jump,
    Display,

    /// Any action name this version does not know about.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// The step or target used when a binding carries no value.
    pub fn default_value(self) -> Option<f64> {
        match self {
            Self::Faster | Self::Slower | Self::Louder | Self::Softer => Some(0.1),
            Self::Advance | Self::Rewind => Some(10.0),
            Self::Fast => Some(1.8),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub key: u32,

    #[serde(default)]
    pub modifiers: Modifiers,

    pub action: Action,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Binding {
    pub fn new(key: u32, action: Action, value: Option<f64>) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
            action,
            value,
        }
    }

    pub fn chord(&self) -> KeyChord {
        KeyChord::new(self.key, self.modifiers)
    }
}

/// The settings snapshot shared by the router and the dispatcher.
///
/// It is loaded once before any element is controlled. Afterwards only
/// `last_speed` changes, as a side effect of speed actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_speed: f64,
    pub reset_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub key_bindings: Vec<Binding>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_speed: 1.0,
            reset_speed: 1.0,
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            key_bindings: default_bindings(),
        }
    }
}

impl Settings {
    /// The first binding for `chord`. Later duplicates are never consulted.
    pub fn find_binding(&self, chord: KeyChord) -> Option<&Binding> {
        self.key_bindings.iter().find(|b| b.chord() == chord)
    }

    /// Pairs of `(winner, shadowed)` indices for bindings that can never match because
    /// an earlier binding uses the same chord.
    pub fn shadowed_bindings(&self) -> Vec<(usize, usize)> {
        let mut shadowed = vec![];
        for (index, binding) in self.key_bindings.iter().enumerate() {
            if let Some(winner) = self.key_bindings[..index]
                .iter()
                .position(|b| b.chord() == binding.chord())
            {
                shadowed.push((winner, index));
            }
        }
        shadowed
    }

    pub fn warn_shadowed_bindings(&self) {
        for (winner, index) in self.shadowed_bindings() {
            let binding = &self.key_bindings[index];
            log::warn!(
                "Key binding #{index} ({:?} on {}) is shadowed by binding #{winner} and will never trigger",
                binding.action,
                binding.chord()
            );
        }
    }

    /// Rejects settings the dispatcher cannot apply: speed bounds that are not finite,
    /// not positive or out of order, non-finite speeds, and non-finite binding values.
    pub fn validate(&self) -> anyhow::Result<()> {
        let (min, max) = (self.min_speed, self.max_speed);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            bail!("Invalid speed bounds: min_speed = {min}, max_speed = {max}");
        }
        let speeds = [
            ("last_speed", self.last_speed),
            ("reset_speed", self.reset_speed),
        ];
        for (name, speed) in speeds {
            if !speed.is_finite() {
                bail!("Invalid {name}: {speed}");
            }
        }
        for (index, binding) in self.key_bindings.iter().enumerate() {
            if let Some(value) = binding.value.filter(|v| !v.is_finite()) {
                bail!(
                    "Invalid value {value} for key binding #{index} ({:?} on {})",
                    binding.action,
                    binding.chord()
                );
            }
        }
        Ok(())
    }

    /// Clamps `speed` to the configured bounds. Never panics, even on bounds that
    /// [`Self::validate`] would reject.
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        speed.min(self.max_speed).max(self.min_speed)
    }
}

pub fn default_bindings() -> Vec<Binding> {
    vec![
        Binding::new(83, Action::Slower, Some(0.1)),
        Binding::new(68, Action::Faster, Some(0.1)),
        Binding::new(90, Action::Rewind, Some(10.0)),
        Binding::new(88, Action::Advance, Some(10.0)),
        Binding::new(82, Action::Reset, Some(1.0)),
        Binding::new(71, Action::Fast, Some(1.8)),
        Binding::new(86, Action::Display, None),
        Binding::new(77, Action::Mark, None),
        Binding::new(74, Action::Jump, None),
    ]
}
