//! Institutional formatting profiles and their table-of-contents skeletons

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DiplomError;

/// Institutional formatting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Gost,
    Msu,
    Hse,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Gost, Profile::Msu, Profile::Hse];

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Gost => "gost",
            Profile::Msu => "msu",
            Profile::Hse => "hse",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = DiplomError;

    /// Exact, case-sensitive match against the known tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gost" => Ok(Profile::Gost),
            "msu" => Ok(Profile::Msu),
            "hse" => Ok(Profile::Hse),
            other => Err(DiplomError::UnrecognizedProfile {
                token: other.to_string(),
            }),
        }
    }
}

const GOST: [&str; 7] = [
    "Введение",
    "Глава 1. Теоретические основы",
    "Глава 2. Аналитическая часть",
    "Глава 3. Практическая часть",
    "Заключение",
    "Список литературы",
    "Приложения",
];

const MSU: [&str; 7] = [
    "Введение",
    "Глава 1. Теоретико-методологические основания",
    "Глава 2. Аналитическая часть",
    "Глава 3. Проектные решения и рекомендации",
    "Заключение",
    "Список литературы",
    "Приложения",
];

const HSE: [&str; 7] = [
    "Введение",
    "Раздел 1. Теоретический обзор",
    "Раздел 2. Методология и анализ данных",
    "Раздел 3. Практическая часть и результаты",
    "Заключение",
    "Список литературы",
    "Приложения",
];

/// Ordered section titles for a document's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutlineSkeleton(Vec<String>);

impl OutlineSkeleton {
    pub fn sections(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Resolve the skeleton for a validated profile.
pub fn resolve(profile: Profile) -> OutlineSkeleton {
    let titles: &[&str] = match profile {
        Profile::Gost => &GOST,
        Profile::Msu => &MSU,
        Profile::Hse => &HSE,
    };
    OutlineSkeleton(titles.iter().map(|s| s.to_string()).collect())
}

/// Resolve from a raw token. Unknown tokens get the gost skeleton.
///
/// Validated requests never take the fallback branch; unknown profiles are
/// rejected before assembly.
pub fn resolve_token(token: &str) -> OutlineSkeleton {
    match token.parse::<Profile>() {
        Ok(profile) => resolve(profile),
        Err(_) => {
            tracing::warn!("Unrecognized profile '{}', using gost outline", token);
            resolve(Profile::default())
        }
    }
}
