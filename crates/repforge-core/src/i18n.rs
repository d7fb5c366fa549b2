// ABOUTME: Localization of taxonomy keys into user-facing labels
// ABOUTME: Language negotiation from tags and per-enum label tables for en, fr, es
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::taxonomy::{Equipment, ExerciseCategory, Force, Level, Mechanic, MuscleGroup};

/// Supported UI languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (fallback)
    #[default]
    En,
    /// French
    Fr,
    /// Spanish
    Es,
}

impl Language {
    /// Every supported language
    pub const ALL: [Self; 3] = [Self::En, Self::Fr, Self::Es];

    /// ISO 639-1 code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
        }
    }

    /// Resolve a language tag (`fr`, `fr-CA`, `es_MX`) to a supported language.
    /// Unknown or empty tags fall back to English.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == primary)
            .unwrap_or_default()
    }

    /// Pick the first supported language from an `Accept-Language` header value
    #[must_use]
    pub fn from_accept_language(header: &str) -> Self {
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .map(str::trim)
            .find_map(|tag| {
                let lang = Self::from_tag(tag);
                // `from_tag` falls back to English, so only accept English when asked for
                (lang != Self::En || tag.to_lowercase().starts_with("en")).then_some(lang)
            })
            .unwrap_or_default()
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A constant with a localized label
pub trait Localized {
    /// Label for `lang`
    fn label(&self, lang: Language) -> &'static str;
}

impl Localized for MuscleGroup {
    fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Abdominals, Language::En) => "Abdominals",
            (Self::Abdominals, Language::Fr) => "Abdominaux",
            (Self::Abdominals, Language::Es) => "Abdominales",
            (Self::Abductors, Language::En) => "Abductors",
            (Self::Abductors, Language::Fr) => "Abducteurs",
            (Self::Abductors, Language::Es) => "Abductores",
            (Self::Adductors, Language::En) => "Adductors",
            (Self::Adductors, Language::Fr) => "Adducteurs",
            (Self::Adductors, Language::Es) => "Aductores",
            (Self::Biceps, Language::En | Language::Fr) => "Biceps",
            (Self::Biceps, Language::Es) => "Bíceps",
            (Self::Calves, Language::En) => "Calves",
            (Self::Calves, Language::Fr) => "Mollets",
            (Self::Calves, Language::Es) => "Pantorrillas",
            (Self::Chest, Language::En) => "Chest",
            (Self::Chest, Language::Fr) => "Pectoraux",
            (Self::Chest, Language::Es) => "Pecho",
            (Self::Forearms, Language::En) => "Forearms",
            (Self::Forearms, Language::Fr) => "Avant-bras",
            (Self::Forearms, Language::Es) => "Antebrazos",
            (Self::Glutes, Language::En) => "Glutes",
            (Self::Glutes, Language::Fr) => "Fessiers",
            (Self::Glutes, Language::Es) => "Glúteos",
            (Self::Hamstrings, Language::En) => "Hamstrings",
            (Self::Hamstrings, Language::Fr) => "Ischio-jambiers",
            (Self::Hamstrings, Language::Es) => "Isquiotibiales",
            (Self::Lats, Language::En) => "Lats",
            (Self::Lats, Language::Fr) => "Grands dorsaux",
            (Self::Lats, Language::Es) => "Dorsales",
            (Self::LowerBack, Language::En) => "Lower back",
            (Self::LowerBack, Language::Fr) => "Bas du dos",
            (Self::LowerBack, Language::Es) => "Espalda baja",
            (Self::MiddleBack, Language::En) => "Middle back",
            (Self::MiddleBack, Language::Fr) => "Milieu du dos",
            (Self::MiddleBack, Language::Es) => "Espalda media",
            (Self::Neck, Language::En) => "Neck",
            (Self::Neck, Language::Fr) => "Cou",
            (Self::Neck, Language::Es) => "Cuello",
            (Self::Quadriceps, Language::En | Language::Fr) => "Quadriceps",
            (Self::Quadriceps, Language::Es) => "Cuádriceps",
            (Self::Shoulders, Language::En) => "Shoulders",
            (Self::Shoulders, Language::Fr) => "Épaules",
            (Self::Shoulders, Language::Es) => "Hombros",
            (Self::Traps, Language::En) => "Traps",
            (Self::Traps, Language::Fr) => "Trapèzes",
            (Self::Traps, Language::Es) => "Trapecios",
            (Self::Triceps, Language::En | Language::Fr) => "Triceps",
            (Self::Triceps, Language::Es) => "Tríceps",
        }
    }
}

impl Localized for Equipment {
    fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::BodyOnly, Language::En) => "Body only",
            (Self::BodyOnly, Language::Fr) => "Poids du corps",
            (Self::BodyOnly, Language::Es) => "Peso corporal",
            (Self::Machine, Language::En) => "Machine",
            (Self::Machine, Language::Fr) => "Machine",
            (Self::Machine, Language::Es) => "Máquina",
            (Self::Other, Language::En) => "Other",
            (Self::Other, Language::Fr) => "Autre",
            (Self::Other, Language::Es) => "Otro",
            (Self::FoamRoll, Language::En) => "Foam roll",
            (Self::FoamRoll, Language::Fr) => "Rouleau de massage",
            (Self::FoamRoll, Language::Es) => "Rodillo de espuma",
            (Self::Kettlebells, Language::En) => "Kettlebells",
            (Self::Kettlebells, Language::Fr) => "Kettlebells",
            (Self::Kettlebells, Language::Es) => "Pesas rusas",
            (Self::Dumbbell, Language::En) => "Dumbbell",
            (Self::Dumbbell, Language::Fr) => "Haltère",
            (Self::Dumbbell, Language::Es) => "Mancuerna",
            (Self::Cable, Language::En) => "Cable",
            (Self::Cable, Language::Fr) => "Poulie",
            (Self::Cable, Language::Es) => "Polea",
            (Self::Barbell, Language::En) => "Barbell",
            (Self::Barbell, Language::Fr) => "Barre",
            (Self::Barbell, Language::Es) => "Barra",
            (Self::Bands, Language::En) => "Bands",
            (Self::Bands, Language::Fr) => "Élastiques",
            (Self::Bands, Language::Es) => "Bandas elásticas",
            (Self::MedicineBall, Language::En) => "Medicine ball",
            (Self::MedicineBall, Language::Fr) => "Médecine-ball",
            (Self::MedicineBall, Language::Es) => "Balón medicinal",
            (Self::ExerciseBall, Language::En) => "Exercise ball",
            (Self::ExerciseBall, Language::Fr) => "Ballon de gym",
            (Self::ExerciseBall, Language::Es) => "Pelota de ejercicio",
            (Self::EZCurlBar, Language::En) => "EZ curl bar",
            (Self::EZCurlBar, Language::Fr) => "Barre EZ",
            (Self::EZCurlBar, Language::Es) => "Barra Z",
        }
    }
}

impl Localized for Force {
    fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Pull, Language::En) => "Pull",
            (Self::Pull, Language::Fr) => "Tirage",
            (Self::Pull, Language::Es) => "Tirón",
            (Self::Push, Language::En) => "Push",
            (Self::Push, Language::Fr) => "Poussée",
            (Self::Push, Language::Es) => "Empuje",
            (Self::Static, Language::En) => "Static",
            (Self::Static, Language::Fr) => "Statique",
            (Self::Static, Language::Es) => "Estático",
        }
    }
}

impl Localized for Mechanic {
    fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Compound, Language::En) => "Compound",
            (Self::Compound, Language::Fr) => "Polyarticulaire",
            (Self::Compound, Language::Es) => "Compuesto",
            (Self::Isolation, Language::En) => "Isolation",
            (Self::Isolation, Language::Fr) => "Isolation",
            (Self::Isolation, Language::Es) => "Aislamiento",
        }
    }
}

impl Localized for Level {
    fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Beginner, Language::En) => "Beginner",
            (Self::Beginner, Language::Fr) => "Débutant",
            (Self::Beginner, Language::Es) => "Principiante",
            (Self::Intermediate, Language::En) => "Intermediate",
            (Self::Intermediate, Language::Fr) => "Intermédiaire",
            (Self::Intermediate, Language::Es) => "Intermedio",
            (Self::Expert, Language::En) => "Expert",
            (Self::Expert, Language::Fr) => "Expert",
            (Self::Expert, Language::Es) => "Experto",
        }
    }
}

impl Localized for ExerciseCategory {
    fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Strength, Language::En) => "Strength",
            (Self::Strength, Language::Fr) => "Force",
            (Self::Strength, Language::Es) => "Fuerza",
            (Self::Stretching, Language::En) => "Stretching",
            (Self::Stretching, Language::Fr) => "Étirements",
            (Self::Stretching, Language::Es) => "Estiramientos",
            (Self::Plyometrics, Language::En) => "Plyometrics",
            (Self::Plyometrics, Language::Fr) => "Pliométrie",
            (Self::Plyometrics, Language::Es) => "Pliometría",
            (Self::Strongman, Language::En) => "Strongman",
            (Self::Strongman, Language::Fr) => "Strongman",
            (Self::Strongman, Language::Es) => "Strongman",
            (Self::Powerlifting, Language::En) => "Powerlifting",
            (Self::Powerlifting, Language::Fr) => "Force athlétique",
            (Self::Powerlifting, Language::Es) => "Powerlifting",
            (Self::Cardio, Language::En) => "Cardio",
            (Self::Cardio, Language::Fr) => "Cardio",
            (Self::Cardio, Language::Es) => "Cardio",
            (Self::OlympicWeightlifting, Language::En) => "Olympic weightlifting",
            (Self::OlympicWeightlifting, Language::Fr) => "Haltérophilie",
            (Self::OlympicWeightlifting, Language::Es) => "Halterofilia",
        }
    }
}

/// One localized constant as exposed to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabeledKey {
    /// Storage key
    pub key: String,
    /// Localized label
    pub label: String,
}

impl LabeledKey {
    /// Build from a key and its localized label
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
        }
    }
}

/// Every taxonomy table localized into one language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedTaxonomy {
    /// Language of the labels
    pub language: Language,
    /// Muscle groups
    pub muscles: Vec<LabeledKey>,
    /// Equipment
    pub equipment: Vec<LabeledKey>,
    /// Force types
    pub forces: Vec<LabeledKey>,
    /// Mechanic types
    pub mechanics: Vec<LabeledKey>,
    /// Levels
    pub levels: Vec<LabeledKey>,
    /// Exercise categories
    pub categories: Vec<LabeledKey>,
}

impl LocalizedTaxonomy {
    /// Localize every table into `lang`
    #[must_use]
    pub fn build(lang: Language) -> Self {
        Self {
            language: lang,
            muscles: MuscleGroup::ALL
                .iter()
                .map(|v| LabeledKey::new(v.as_str(), v.label(lang)))
                .collect(),
            equipment: Equipment::ALL
                .iter()
                .map(|v| LabeledKey::new(v.as_str(), v.label(lang)))
                .collect(),
            forces: Force::ALL
                .iter()
                .map(|v| LabeledKey::new(v.as_str(), v.label(lang)))
                .collect(),
            mechanics: Mechanic::ALL
                .iter()
                .map(|v| LabeledKey::new(v.as_str(), v.label(lang)))
                .collect(),
            levels: Level::ALL
                .iter()
                .map(|v| LabeledKey::new(v.as_str(), v.label(lang)))
                .collect(),
            categories: ExerciseCategory::ALL
                .iter()
                .map(|v| LabeledKey::new(v.as_str(), v.label(lang)))
                .collect(),
        }
    }
}
