/*!
    Format profiles: ordered key/value configuration for an output file.
*/

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use ffmpeg_types::{Error, Result};

/// Key holding the machine identifier of a profile.
pub const PROFILE_IDENTIFICATOR: &str = "avProfileName";
/// Key holding the human readable name of a profile.
pub const PROFILE_IDENTIFICATOR_HUMAN: &str = "avProfileLongName";
/// Key holding the profile type.
pub const PROFILE_TYPE: &str = "avProfileType";
/// Value of [`PROFILE_TYPE`] for format profiles.
pub const PROFILE_TYPE_FORMAT: &str = "avProfileTypeFormat";
/// Key holding the container format name.
pub const PROFILE_FORMAT: &str = "format";

/**
    Keys that identify a profile and are never applied as format options.
*/
pub const RESERVED_KEYS: [&str; 4] = [
    PROFILE_IDENTIFICATOR,
    PROFILE_IDENTIFICATOR_HUMAN,
    PROFILE_TYPE,
    PROFILE_FORMAT,
];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/**
    An ordered set of key/value pairs.

    Keys are unique; inserting an existing key replaces its value in place,
    keeping the original position. Serializes as a map and keeps the source
    order when deserialized.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Profile {
    entries: Vec<(String, String)>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Start a format profile with its identification keys filled in.
    */
    pub fn format(id: &str, human_name: &str, format: &str) -> Self {
        Self::new()
            .with(PROFILE_IDENTIFICATOR, id)
            .with(PROFILE_IDENTIFICATOR_HUMAN, human_name)
            .with(PROFILE_TYPE, PROFILE_TYPE_FORMAT)
            .with(PROFILE_FORMAT, format)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /**
        Insert or replace a value. Returns the previous value, if any.
    */
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /**
        The container format declared by the profile.
    */
    pub fn format_name(&self) -> Option<&str> {
        self.get(PROFILE_FORMAT)
    }

    /**
        The entries that are format options, i.e. everything but the reserved keys.
    */
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !is_reserved_key(k))
    }
}

/**
    Validate that a profile describes a container format.

    The identification keys must be present, the type must be
    [`PROFILE_TYPE_FORMAT`] and a format name must be given.
*/
pub fn check_format_profile(profile: &Profile) -> Result<()> {
    for key in [PROFILE_IDENTIFICATOR, PROFILE_IDENTIFICATOR_HUMAN, PROFILE_TYPE] {
        if !profile.contains_key(key) {
            return Err(Error::configuration(format!("format profile is missing '{key}'")));
        }
    }

    let profile_type = profile.get(PROFILE_TYPE).unwrap_or_default();
    if profile_type != PROFILE_TYPE_FORMAT {
        return Err(Error::configuration(format!(
            "profile type is '{profile_type}', expected '{PROFILE_TYPE_FORMAT}'"
        )));
    }

    match profile.format_name() {
        Some(format) if !format.is_empty() => Ok(()),
        _ => Err(Error::configuration(format!(
            "format profile is missing '{PROFILE_FORMAT}'"
        ))),
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Profile {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut profile = Profile::new();
        for (k, v) in iter {
            profile.insert(k, v);
        }
        profile
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

impl Serialize for Profile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Profile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ProfileVisitor;

        impl<'de> Visitor<'de> for ProfileVisitor {
            type Value = Profile;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of profile keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Profile, A::Error> {
                let mut profile = Profile::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    profile.insert(key, value);
                }
                Ok(profile)
            }
        }

        deserializer.deserialize_map(ProfileVisitor)
    }
}
