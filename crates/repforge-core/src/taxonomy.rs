// ABOUTME: Exercise taxonomy constant tables (muscles, equipment, force, mechanic, level, category)
// ABOUTME: Closed enums with stable snake_case keys used for storage, filtering, and localization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Exercise taxonomies
//!
//! Every table is a closed enum whose `as_str` key is what the database stores and what
//! clients send in filters. Parsing is strict: unknown keys are rejected with
//! [`AppError::invalid_input`] rather than silently mapped to a default.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Target muscle group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    /// Abdominals
    Abdominals,
    /// Hip abductors
    Abductors,
    /// Hip adductors
    Adductors,
    /// Biceps
    Biceps,
    /// Calves
    Calves,
    /// Chest
    Chest,
    /// Forearms
    Forearms,
    /// Glutes
    Glutes,
    /// Hamstrings
    Hamstrings,
    /// Latissimus dorsi
    Lats,
    /// Lower back
    LowerBack,
    /// Middle back
    MiddleBack,
    /// Neck
    Neck,
    /// Quadriceps
    Quadriceps,
    /// Shoulders
    Shoulders,
    /// Trapezius
    Traps,
    /// Triceps
    Triceps,
}

impl MuscleGroup {
    /// Every muscle group in display order
    pub const ALL: [Self; 17] = [
        Self::Abdominals,
        Self::Abductors,
        Self::Adductors,
        Self::Biceps,
        Self::Calves,
        Self::Chest,
        Self::Forearms,
        Self::Glutes,
        Self::Hamstrings,
        Self::Lats,
        Self::LowerBack,
        Self::MiddleBack,
        Self::Neck,
        Self::Quadriceps,
        Self::Shoulders,
        Self::Traps,
        Self::Triceps,
    ];

    /// Storage key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Abdominals => "abdominals",
            Self::Abductors => "abductors",
            Self::Adductors => "adductors",
            Self::Biceps => "biceps",
            Self::Calves => "calves",
            Self::Chest => "chest",
            Self::Forearms => "forearms",
            Self::Glutes => "glutes",
            Self::Hamstrings => "hamstrings",
            Self::Lats => "lats",
            Self::LowerBack => "lower_back",
            Self::MiddleBack => "middle_back",
            Self::Neck => "neck",
            Self::Quadriceps => "quadriceps",
            Self::Shoulders => "shoulders",
            Self::Traps => "traps",
            Self::Triceps => "triceps",
        }
    }
}

/// Equipment required to perform an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    /// No equipment
    BodyOnly,
    /// Machine
    Machine,
    /// Anything not listed
    Other,
    /// Foam roller
    FoamRoll,
    /// Kettlebells
    Kettlebells,
    /// Dumbbell
    Dumbbell,
    /// Cable station
    Cable,
    /// Barbell
    Barbell,
    /// Resistance bands
    Bands,
    /// Medicine ball
    MedicineBall,
    /// Exercise (stability) ball
    ExerciseBall,
    /// EZ curl bar
    EZCurlBar,
}

impl Equipment {
    /// Every equipment type in display order
    pub const ALL: [Self; 12] = [
        Self::BodyOnly,
        Self::Machine,
        Self::Other,
        Self::FoamRoll,
        Self::Kettlebells,
        Self::Dumbbell,
        Self::Cable,
        Self::Barbell,
        Self::Bands,
        Self::MedicineBall,
        Self::ExerciseBall,
        Self::EZCurlBar,
    ];

    /// Storage key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BodyOnly => "body_only",
            Self::Machine => "machine",
            Self::Other => "other",
            Self::FoamRoll => "foam_roll",
            Self::Kettlebells => "kettlebells",
            Self::Dumbbell => "dumbbell",
            Self::Cable => "cable",
            Self::Barbell => "barbell",
            Self::Bands => "bands",
            Self::MedicineBall => "medicine_ball",
            Self::ExerciseBall => "exercise_ball",
            Self::EZCurlBar => "e_z_curl_bar",
        }
    }
}

/// Direction of force applied during the movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Force {
    /// Pulling movement
    Pull,
    /// Pushing movement
    Push,
    /// Isometric hold
    Static,
}

impl Force {
    /// Every force type
    pub const ALL: [Self; 3] = [Self::Pull, Self::Push, Self::Static];

    /// Storage key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Static => "static",
        }
    }
}

/// Joint involvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanic {
    /// Multi-joint
    Compound,
    /// Single-joint
    Isolation,
}

impl Mechanic {
    /// Every mechanic type
    pub const ALL: [Self; 2] = [Self::Compound, Self::Isolation];

    /// Storage key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compound => "compound",
            Self::Isolation => "isolation",
        }
    }
}

/// Experience level for exercises and programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// New to training
    #[default]
    Beginner,
    /// Some training history
    Intermediate,
    /// Advanced lifter
    Expert,
}

impl Level {
    /// Every level in ascending order
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    /// Storage key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        }
    }
}

/// Training discipline an exercise belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    /// General strength work
    #[default]
    Strength,
    /// Flexibility work
    Stretching,
    /// Explosive jumps and throws
    Plyometrics,
    /// Strongman events
    Strongman,
    /// Competition powerlifts
    Powerlifting,
    /// Conditioning
    Cardio,
    /// Snatch, clean and jerk
    OlympicWeightlifting,
}

impl ExerciseCategory {
    /// Every category in display order
    pub const ALL: [Self; 7] = [
        Self::Strength,
        Self::Stretching,
        Self::Plyometrics,
        Self::Strongman,
        Self::Powerlifting,
        Self::Cardio,
        Self::OlympicWeightlifting,
    ];

    /// Storage key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Stretching => "stretching",
            Self::Plyometrics => "plyometrics",
            Self::Strongman => "strongman",
            Self::Powerlifting => "powerlifting",
            Self::Cardio => "cardio",
            Self::OlympicWeightlifting => "olympic_weightlifting",
        }
    }
}

/// Implements `Display` and strict `FromStr` over a taxonomy's `ALL` table
macro_rules! taxonomy_key_impls {
    ($($ty:ident => $label:literal),+ $(,)?) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = AppError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let key = s.trim().to_lowercase();
                    Self::ALL
                        .into_iter()
                        .find(|v| v.as_str() == key)
                        .ok_or_else(|| AppError::invalid_input(format!("Invalid {}: {s}", $label)))
                }
            }
        )+
    };
}

taxonomy_key_impls! {
    MuscleGroup => "muscle group",
    Equipment => "equipment",
    Force => "force",
    Mechanic => "mechanic",
    Level => "level",
    ExerciseCategory => "category",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip_through_from_str() {
        for m in MuscleGroup::ALL {
            assert_eq!(m.as_str().parse::<MuscleGroup>().unwrap(), m);
        }
        for e in Equipment::ALL {
            assert_eq!(e.to_string().parse::<Equipment>().unwrap(), e);
        }
    }

    #[test]
    fn test_serde_matches_storage_key() {
        let json = serde_json::to_string(&Equipment::EZCurlBar).unwrap();
        assert_eq!(json, "\"e_z_curl_bar\"");
        let json = serde_json::to_string(&ExerciseCategory::OlympicWeightlifting).unwrap();
        assert_eq!(json, "\"olympic_weightlifting\"");
        let parsed: MuscleGroup = serde_json::from_str("\"lower_back\"").unwrap();
        assert_eq!(parsed, MuscleGroup::LowerBack);
    }

    #[test]
    fn test_parse_is_case_insensitive_but_strict() {
        assert_eq!(" Barbell ".parse::<Equipment>().unwrap(), Equipment::Barbell);
        let err = "kettlebell".parse::<Equipment>().unwrap_err();
        assert!(err.message.contains("equipment"));
        assert!("legs".parse::<MuscleGroup>().is_err());
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(Level::Beginner < Level::Intermediate);
        assert!(Level::Intermediate < Level::Expert);
    }
}
