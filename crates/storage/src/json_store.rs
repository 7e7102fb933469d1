//! JSON-file-backed object store.
//!
//! The whole document lives behind a mutex; every mutation serializes the
//! next document to a temp file and renames it over the target, so a
//! transaction is all-or-nothing even if the process dies mid-write.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use halter_domain as domain;

use crate::{
    model::{ExerciseRecord, SessionRecord, StoreDocument},
    seed::asset_folder_name,
};

pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<StoreDocument>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting from an empty document if the
    /// file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, domain::StorageError> {
        let path = path.into();
        let document = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(box_err)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => StoreDocument::default(),
            Err(err) => return Err(box_err(err)),
        };

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreDocument>, domain::StorageError> {
        self.document
            .lock()
            .map_err(|_| domain::StorageError::Unavailable)
    }

    fn persist(&self, document: &StoreDocument) -> Result<(), domain::StorageError> {
        let content = serde_json::to_string_pretty(document).map_err(box_err)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).map_err(box_err)?;
        fs::rename(&tmp, &self.path).map_err(box_err)?;
        Ok(())
    }

    fn images_dir(&self, name: &domain::Name) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("images")
            .join(asset_folder_name(name.as_ref()))
    }
}

fn box_err(err: impl std::error::Error + 'static) -> domain::StorageError {
    domain::StorageError::Other(Box::new(err))
}

impl domain::ExerciseRepository for JsonFileStore {
    fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::StorageError> {
        let document = self.lock()?;
        document
            .exercises
            .iter()
            .map(|record| domain::Exercise::try_from(record).map_err(Into::into))
            .collect()
    }

    fn create_exercise(&self, exercise: &domain::Exercise) -> Result<(), domain::StorageError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        next.exercises.push(ExerciseRecord::from(exercise));
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn create_exercises(&self, exercises: &[domain::Exercise]) -> Result<(), domain::StorageError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        next.exercises
            .extend(exercises.iter().map(ExerciseRecord::from));
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn replace_exercise(
        &self,
        name: &domain::Name,
        exercise: &domain::Exercise,
    ) -> Result<(), domain::StorageError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let record = ExerciseRecord::from(exercise);
        match next.exercises.iter_mut().find(|r| r.name == name.as_ref()) {
            Some(stored) => *stored = record,
            None => next.exercises.push(record),
        }
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn delete_exercise(&self, name: &domain::Name) -> Result<(), domain::StorageError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        next.exercises.retain(|r| r.name != name.as_ref());
        if next.exercises.len() == guard.exercises.len() {
            return Ok(());
        }
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn delete_images(&self, name: &domain::Name) -> Result<(), domain::StorageError> {
        match fs::remove_dir_all(self.images_dir(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(box_err(err)),
        }
    }
}

impl domain::SessionRepository for JsonFileStore {
    fn read_sessions(&self) -> Result<Vec<domain::Session>, domain::StorageError> {
        let document = self.lock()?;
        document
            .sessions
            .iter()
            .map(|record| domain::Session::try_from(record).map_err(Into::into))
            .collect()
    }

    fn write_sessions(&self, sessions: &[domain::Session]) -> Result<(), domain::StorageError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        next.sessions = sessions.iter().map(SessionRecord::from).collect();
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}
