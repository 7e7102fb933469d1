use std::{fmt, slice::Iter};

use crate::{Name, SeedError, StorageError};

pub trait ExerciseRepository {
    fn read_exercises(&self) -> Result<Vec<Exercise>, StorageError>;
    fn create_exercise(&self, exercise: &Exercise) -> Result<(), StorageError>;
    /// Persists a batch of exercises in a single transaction.
    fn create_exercises(&self, exercises: &[Exercise]) -> Result<(), StorageError>;
    fn replace_exercise(&self, name: &Name, exercise: &Exercise) -> Result<(), StorageError>;
    fn delete_exercise(&self, name: &Name) -> Result<(), StorageError>;
    /// Removes user-uploaded image files associated with an exercise.
    fn delete_images(&self, name: &Name) -> Result<(), StorageError>;
}

/// One-time population of an empty store from bundled exercise definitions.
pub trait ExerciseSeeder<R> {
    fn seed(&self, repository: &R) -> Result<SeedReport, SeedError>;
}

/// Seeder for compositions without bundled assets. Leaves the store empty.
pub struct NoopSeeder;

impl<R> ExerciseSeeder<R> for NoopSeeder {
    fn seed(&self, _repository: &R) -> Result<SeedReport, SeedError> {
        Ok(SeedReport::default())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    /// Reasons for entries that were skipped instead of aborting the seed.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub name: Name,
    pub groups: Vec<MuscleGroup>,
    pub instructions: String,
    pub tips: String,
    pub image_names: Vec<String>,
    pub user_made: bool,
    pub weight_unit: WeightUnit,
    pub details: Vec<ExerciseDetail>,
}

impl Exercise {
    #[must_use]
    pub fn section_key(&self) -> String {
        self.name.section_key()
    }

    /// Comma-joined muscle group tags for list rendering.
    #[must_use]
    pub fn groups_text(&self) -> String {
        self.groups
            .iter()
            .map(|g| g.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Record of one performed set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExerciseDetail {
    pub last: String,
    pub reps: String,
    pub weight: String,
}

impl ExerciseDetail {
    /// Reps times weight, rounded. Zero when either field is non-numeric.
    #[must_use]
    pub fn total_load(&self) -> u32 {
        let Ok(reps) = self.reps.trim().parse::<u32>() else {
            return 0;
        };
        let Ok(weight) = self.weight.trim().parse::<f32>() else {
            return 0;
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        if weight >= 0.0 {
            (reps as f32 * weight).round() as u32
        } else {
            0
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum MuscleGroup {
    Abs,
    Arms,
    Back,
    Calves,
    Chest,
    Glutes,
    Hips,
    Legs,
    Shoulders,
}

impl Property for MuscleGroup {
    fn iter() -> Iter<'static, MuscleGroup> {
        static GROUPS: [MuscleGroup; 9] = [
            MuscleGroup::Abs,
            MuscleGroup::Arms,
            MuscleGroup::Back,
            MuscleGroup::Calves,
            MuscleGroup::Chest,
            MuscleGroup::Glutes,
            MuscleGroup::Hips,
            MuscleGroup::Legs,
            MuscleGroup::Shoulders,
        ];
        GROUPS.iter()
    }

    fn name(self) -> &'static str {
        match self {
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Arms => "Arms",
            MuscleGroup::Back => "Back",
            MuscleGroup::Calves => "Calves",
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::Hips => "Hips",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Shoulders => "Shoulders",
        }
    }
}

impl MuscleGroup {
    /// Parses a comma-separated tag list as found in bundled seed lines.
    pub fn parse_list(tags: &str) -> Result<Vec<MuscleGroup>, MuscleGroupError> {
        tags.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(MuscleGroup::try_from)
            .collect()
    }
}

impl TryFrom<&str> for MuscleGroup {
    type Error = MuscleGroupError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MuscleGroup::iter()
            .find(|group| group.name().eq_ignore_ascii_case(value.trim()))
            .copied()
            .ok_or_else(|| MuscleGroupError::Unknown(value.trim().to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MuscleGroupError {
    #[error("Unknown muscle group \"{0}\"")]
    Unknown(String),
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum WeightUnit {
    #[default]
    Lbs,
    Kgs,
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                WeightUnit::Lbs => "lbs",
                WeightUnit::Kgs => "kgs",
            }
        )
    }
}

impl TryFrom<&str> for WeightUnit {
    type Error = WeightUnitError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "lbs" => Ok(WeightUnit::Lbs),
            "kgs" => Ok(WeightUnit::Kgs),
            _ => Err(WeightUnitError::Unknown(value.trim().to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WeightUnitError {
    #[error("Unknown weight unit \"{0}\"")]
    Unknown(String),
}

pub trait Property: Clone + Copy + Sized {
    fn iter() -> Iter<'static, Self>;
    fn name(self) -> &'static str;
}
