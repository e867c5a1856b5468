//! Structured scene parameters chosen in the UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $key:literal : $phrase:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $key)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable identifier used in settings files and on the command line.
            pub fn key(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            /// Wording used inside prompts.
            pub fn phrase(self) -> &'static str {
                match self {
                    $($name::$variant => $phrase),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.key() == wanted)
                    .ok_or_else(|| {
                        let known: Vec<&str> = $name::ALL.iter().map(|v| v.key()).collect();
                        AppError::validation(format!(
                            "unknown {} '{}', expected one of: {}",
                            stringify!($name).to_ascii_lowercase(),
                            s,
                            known.join(", ")
                        ))
                    })
            }
        }
    };
}

choice_enum!(
    /// Time-of-day lighting.
    Lighting {
        Sunny => "sunny": "bright midday sunlight with crisp shadows",
        Sunset => "sunset": "warm golden-hour sunset light with long soft shadows",
        Night => "night": "night scene with warm interior glow and artificial exterior lighting",
    }
);

choice_enum!(
    /// Which corner the sun shines from, relative to the viewer.
    SunDirection {
        FrontLeft => "front_left": "front-left",
        FrontRight => "front_right": "front-right",
        BackLeft => "back_left": "back-left",
        BackRight => "back_right": "back-right",
    }
);

choice_enum!(
    Weather {
        Clear => "clear": "clear sky",
        Cloudy => "cloudy": "overcast, cloudy sky",
        Rain => "rain": "rain with wet reflective surfaces",
        Snow => "snow": "falling snow with snow-covered ground",
        Fog => "fog": "dense fog softening the background",
        Mist => "mist": "light morning mist",
    }
);

choice_enum!(
    /// Language the refined description is written in.
    Language {
        English => "en": "English",
        TraditionalChinese => "zh_tw": "Traditional Chinese",
        SimplifiedChinese => "zh_cn": "Simplified Chinese",
        Japanese => "ja": "Japanese",
    }
);

/// All scene parameters for one generation. Read-only to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub lighting: Lighting,
    pub sun_direction: SunDirection,
    pub weather: Weather,
    pub language: Language,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            lighting: Lighting::Sunny,
            sun_direction: SunDirection::FrontLeft,
            weather: Weather::Clear,
            language: Language::English,
        }
    }
}

impl GenerationParams {
    /// One-line description of the scene conditions for prompts.
    pub fn scene_description(&self) -> String {
        match self.lighting {
            // no sun to speak of at night
            Lighting::Night => format!("{}; {}.", self.lighting.phrase(), self.weather.phrase()),
            _ => format!(
                "{}, sun from the {}; {}.",
                self.lighting.phrase(),
                self.sun_direction.phrase(),
                self.weather.phrase()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_back() {
        for w in Weather::ALL {
            assert_eq!(w.key().parse::<Weather>().unwrap(), *w);
        }
        assert_eq!("Back-Right".parse::<SunDirection>().unwrap(), SunDirection::BackRight);
        assert_eq!("zh-tw".parse::<Language>().unwrap(), Language::TraditionalChinese);
    }

    #[test]
    fn unknown_values_list_the_choices() {
        let err = "hail".parse::<Weather>().unwrap_err().to_string();
        assert!(err.contains("clear") && err.contains("mist"), "{err}");
    }

    #[test]
    fn night_scenes_do_not_mention_the_sun() {
        let params = GenerationParams {
            lighting: Lighting::Night,
            ..GenerationParams::default()
        };
        assert!(!params.scene_description().contains("sun from"));
        assert!(GenerationParams::default().scene_description().contains("front-left"));
    }

    #[test]
    fn params_serialize_with_their_keys() {
        let json = serde_json::to_string(&GenerationParams::default()).unwrap();
        assert!(json.contains("\"front_left\""), "{json}");
        let back: GenerationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GenerationParams::default());
    }
}
