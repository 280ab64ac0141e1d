use crate::error::{PracticeError, Result};
use crate::sorting::Sorter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_TARGET_SPEED: u32 = 75;
pub const DEFAULT_GROUP_SIZE: usize = 30;
pub const DEFAULT_UNBEATEN_WORD_PERCENTAGE: u32 = 60;
pub const UNBEATEN_WORD_PERCENTAGE_RANGE: std::ops::RangeInclusive<u32> = 10..=90;

/// Config keys the engine understands. Any other key is stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ConfigKey {
    #[strum(serialize = "sorter")]
    Sorter,
    #[strum(serialize = "targetSpeed")]
    TargetSpeed,
    #[strum(serialize = "groupSize")]
    GroupSize,
    #[strum(serialize = "animationsEnabled")]
    AnimationsEnabled,
    #[strum(serialize = "unbeatenWordPercentage")]
    UnbeatenWordPercentage,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::Sorter,
        ConfigKey::TargetSpeed,
        ConfigKey::GroupSize,
        ConfigKey::AnimationsEnabled,
        ConfigKey::UnbeatenWordPercentage,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.to_string() == name)
    }

    /// Check a candidate value before it is stored.
    pub fn validate(&self, value: &str) -> Result<()> {
        let reject =
            |reason: &str| Err(PracticeError::invalid_config(self.to_string(), value, reason));

        match self {
            ConfigKey::Sorter => Ok(()),
            ConfigKey::TargetSpeed | ConfigKey::GroupSize => match value.trim().parse::<u32>() {
                Ok(v) if v >= 1 => Ok(()),
                _ => reject("must be a whole number of at least 1"),
            },
            ConfigKey::AnimationsEnabled => match value {
                "0" | "1" => Ok(()),
                _ => reject("must be \"0\" or \"1\""),
            },
            ConfigKey::UnbeatenWordPercentage => match value.trim().parse::<u32>() {
                Ok(v) if UNBEATEN_WORD_PERCENTAGE_RANGE.contains(&v) => Ok(()),
                _ => reject("must be a whole number between 10 and 90"),
            },
        }
    }
}

/// Payload of a config-key-changed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChange {
    pub key: String,
    pub original: String,
    pub new_value: String,
}

impl ConfigChange {
    pub fn config_key(&self) -> Option<ConfigKey> {
        ConfigKey::from_name(&self.key)
    }
}

/// Typed, read-only view over the string config map.
///
/// Missing, empty or unparseable values read back as the default.
#[derive(Debug, Clone, Copy)]
pub struct PracticeConfig<'a> {
    values: &'a BTreeMap<String, String>,
}

impl<'a> PracticeConfig<'a> {
    pub fn new(values: &'a BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    fn parse_positive<T>(&self, key: ConfigKey) -> Option<T>
    where
        T: std::str::FromStr + PartialOrd + From<u8>,
    {
        self.get(&key.to_string())
            .and_then(|v| v.trim().parse::<T>().ok())
            .filter(|v| *v >= T::from(1))
    }

    pub fn sorter(&self) -> Sorter {
        Sorter::from_name(self.get(&ConfigKey::Sorter.to_string()).unwrap_or_default())
    }

    pub fn target_speed(&self) -> u32 {
        self.parse_positive(ConfigKey::TargetSpeed)
            .unwrap_or(DEFAULT_TARGET_SPEED)
    }

    pub fn group_size(&self) -> usize {
        self.parse_positive::<u32>(ConfigKey::GroupSize)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_GROUP_SIZE)
    }

    pub fn animations_enabled(&self) -> bool {
        self.get(&ConfigKey::AnimationsEnabled.to_string()) != Some("0")
    }

    pub fn unbeaten_word_percentage(&self) -> u32 {
        self.get(&ConfigKey::UnbeatenWordPercentage.to_string())
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| UNBEATEN_WORD_PERCENTAGE_RANGE.contains(v))
            .unwrap_or(DEFAULT_UNBEATEN_WORD_PERCENTAGE)
    }
}
