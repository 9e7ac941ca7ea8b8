//! Import of settings in the shape the browser extension persists them.

use std::{fs::File, io::Read, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    keys::Modifiers,
    settings::{Action, Binding, Settings},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredKeyBindingV1 {
    pub action: Action,
    pub key: u32,

    #[serde(default)]
    pub value: Option<f64>,

    #[serde(default)]
    pub ctrl: bool,

    #[serde(default)]
    pub shift: bool,

    #[serde(default)]
    pub alt: bool,

    #[serde(default)]
    pub meta: bool,
}

impl From<StoredKeyBindingV1> for Binding {
    fn from(value: StoredKeyBindingV1) -> Self {
        Self {
            key: value.key,
            modifiers: Modifiers {
                ctrl: value.ctrl,
                shift: value.shift,
                alt: value.alt,
                meta: value.meta,
            },
            action: value.action,
            value: value.value,
        }
    }
}

impl From<Binding> for StoredKeyBindingV1 {
    fn from(value: Binding) -> Self {
        Self {
            action: value.action,
            key: value.key,
            value: value.value,
            ctrl: value.modifiers.ctrl,
            shift: value.modifiers.shift,
            alt: value.modifiers.alt,
            meta: value.modifiers.meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettingsV1 {
    #[serde(default)]
    pub last_speed: Option<f64>,

    #[serde(default)]
    pub reset_speed: Option<f64>,

    #[serde(default)]
    pub key_bindings: Option<Vec<StoredKeyBindingV1>>,
}

impl From<StoredSettingsV1> for Settings {
    fn from(value: StoredSettingsV1) -> Self {
        let defaults = Settings::default();
        Self {
            last_speed: value.last_speed.unwrap_or(defaults.last_speed),
            reset_speed: value.reset_speed.unwrap_or(defaults.reset_speed),
            key_bindings: value
                .key_bindings
                .map(|bindings| bindings.into_iter().map(From::from).collect())
                .unwrap_or(defaults.key_bindings),
            ..defaults
        }
    }
}

impl From<Settings> for StoredSettingsV1 {
    fn from(value: Settings) -> Self {
        Self {
            last_speed: Some(value.last_speed),
            reset_speed: Some(value.reset_speed),
            key_bindings: Some(value.key_bindings.into_iter().map(From::from).collect()),
        }
    }
}

pub fn read(file: &mut impl Read) -> anyhow::Result<Settings> {
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .context("Failed to read stored settings")?;

    let stored: StoredSettingsV1 =
        serde_json::from_str(&contents).context("Failed to parse stored settings")?;
    let settings = Settings::from(stored);
    settings.validate().context("Invalid stored settings")?;
    settings.warn_shadowed_bindings();
    Ok(settings)
}

pub fn read_path(path: impl AsRef<Path>) -> anyhow::Result<Settings> {
    let mut file = File::open(path).context("Failed to open stored settings")?;
    read(&mut file)
}
