//! Serde records persisted by the store backends.
//!
//! The domain crate stays serialization-free; conversions happen at this
//! boundary. Invalid stored values surface as errors instead of panics.

use chrono::NaiveDate;
use halter_domain as domain;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub exercises: Vec<ExerciseRecord>,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub name: String,
    pub groups: Vec<String>,
    pub instructions: String,
    pub tips: String,
    pub image_names: Vec<String>,
    pub user_made: bool,
    pub weight_unit: String,
    pub details: Vec<ExerciseDetailRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDetailRecord {
    pub last: String,
    pub reps: String,
    pub weight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub name: String,
    pub info: String,
    pub exercises: Vec<ExerciseRecord>,
    pub seconds_elapsed: u64,
    pub completed: Option<NaiveDate>,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RecordError {
    #[error(transparent)]
    Name(#[from] domain::NameError),
    #[error(transparent)]
    MuscleGroup(#[from] domain::MuscleGroupError),
    #[error(transparent)]
    WeightUnit(#[from] domain::WeightUnitError),
}

impl From<RecordError> for domain::StorageError {
    fn from(value: RecordError) -> Self {
        domain::StorageError::Other(Box::new(value))
    }
}

impl From<&domain::Exercise> for ExerciseRecord {
    fn from(value: &domain::Exercise) -> Self {
        use domain::Property;

        Self {
            name: value.name.as_ref().to_string(),
            groups: value.groups.iter().map(|g| g.name().to_string()).collect(),
            instructions: value.instructions.clone(),
            tips: value.tips.clone(),
            image_names: value.image_names.clone(),
            user_made: value.user_made,
            weight_unit: value.weight_unit.to_string(),
            details: value.details.iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<&ExerciseRecord> for domain::Exercise {
    type Error = RecordError;

    fn try_from(value: &ExerciseRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            name: domain::Name::new(&value.name)?,
            groups: value
                .groups
                .iter()
                .map(|g| domain::MuscleGroup::try_from(g.as_str()))
                .collect::<Result<_, _>>()?,
            instructions: value.instructions.clone(),
            tips: value.tips.clone(),
            image_names: value.image_names.clone(),
            user_made: value.user_made,
            weight_unit: domain::WeightUnit::try_from(value.weight_unit.as_str())?,
            details: value.details.iter().map(Into::into).collect(),
        })
    }
}

impl From<&domain::ExerciseDetail> for ExerciseDetailRecord {
    fn from(value: &domain::ExerciseDetail) -> Self {
        Self {
            last: value.last.clone(),
            reps: value.reps.clone(),
            weight: value.weight.clone(),
        }
    }
}

impl From<&ExerciseDetailRecord> for domain::ExerciseDetail {
    fn from(value: &ExerciseDetailRecord) -> Self {
        Self {
            last: value.last.clone(),
            reps: value.reps.clone(),
            weight: value.weight.clone(),
        }
    }
}

impl From<&domain::Session> for SessionRecord {
    fn from(value: &domain::Session) -> Self {
        Self {
            name: value.name.as_ref().to_string(),
            info: value.info.clone(),
            exercises: value.exercises.iter().map(Into::into).collect(),
            seconds_elapsed: value.seconds_elapsed,
            completed: value.completed,
        }
    }
}

impl TryFrom<&SessionRecord> for domain::Session {
    type Error = RecordError;

    fn try_from(value: &SessionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            name: domain::Name::new(&value.name)?,
            info: value.info.clone(),
            exercises: value
                .exercises
                .iter()
                .map(domain::Exercise::try_from)
                .collect::<Result<_, _>>()?,
            seconds_elapsed: value.seconds_elapsed,
            completed: value.completed,
        })
    }
}
