#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod catalog;
pub mod error;
pub mod exercise;
pub mod name;
pub mod observer;
pub mod session;

pub use catalog::{ExerciseCatalog, LoadState};
pub use error::{
    CreateError, DeleteError, LoadError, ReadError, ReorderError, SeedError, StorageError,
    UpdateError,
};
pub use exercise::{
    Exercise, ExerciseDetail, ExerciseRepository, ExerciseSeeder, MuscleGroup, MuscleGroupError,
    NoopSeeder, Property, SeedReport, WeightUnit, WeightUnitError,
};
pub use name::{Name, NameError};
pub use observer::{ObserverID, ObserverRegistry};
pub use session::{Session, SessionList, SessionRepository};

macro_rules! log_on_error {
    ($result:expr, $action:literal, $entity:literal) => {{
        let result = $result;
        if let Err(ref err) = result {
            match err {
                $crate::StorageError::Unavailable => {
                    log::debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    log::error!("failed to {} {}: {err}", $action, $entity);
                }
            }
        }
        result
    }};
}

pub(crate) use log_on_error;
