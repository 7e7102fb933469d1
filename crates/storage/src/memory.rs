//! In-memory object store for tests and ephemeral compositions.

use std::sync::{Mutex, MutexGuard};

use halter_domain as domain;

#[derive(Default)]
pub struct MemoryStore {
    exercises: Mutex<Vec<domain::Exercise>>,
    sessions: Mutex<Vec<domain::Session>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, domain::StorageError> {
    mutex.lock().map_err(|_| domain::StorageError::Unavailable)
}

impl domain::ExerciseRepository for MemoryStore {
    fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::StorageError> {
        Ok(lock(&self.exercises)?.clone())
    }

    fn create_exercise(&self, exercise: &domain::Exercise) -> Result<(), domain::StorageError> {
        lock(&self.exercises)?.push(exercise.clone());
        Ok(())
    }

    fn create_exercises(&self, exercises: &[domain::Exercise]) -> Result<(), domain::StorageError> {
        lock(&self.exercises)?.extend_from_slice(exercises);
        Ok(())
    }

    fn replace_exercise(
        &self,
        name: &domain::Name,
        exercise: &domain::Exercise,
    ) -> Result<(), domain::StorageError> {
        let mut exercises = lock(&self.exercises)?;
        match exercises.iter_mut().find(|e| e.name == *name) {
            Some(stored) => *stored = exercise.clone(),
            None => exercises.push(exercise.clone()),
        }
        Ok(())
    }

    fn delete_exercise(&self, name: &domain::Name) -> Result<(), domain::StorageError> {
        lock(&self.exercises)?.retain(|e| e.name != *name);
        Ok(())
    }

    fn delete_images(&self, _name: &domain::Name) -> Result<(), domain::StorageError> {
        Ok(())
    }
}

impl domain::SessionRepository for MemoryStore {
    fn read_sessions(&self) -> Result<Vec<domain::Session>, domain::StorageError> {
        Ok(lock(&self.sessions)?.clone())
    }

    fn write_sessions(&self, sessions: &[domain::Session]) -> Result<(), domain::StorageError> {
        *lock(&self.sessions)? = sessions.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use halter_domain::{ExerciseRepository, SessionRepository};
    use pretty_assertions::assert_eq;

    use super::*;

    fn exercise(name: &str) -> domain::Exercise {
        domain::Exercise {
            name: domain::Name::new(name).unwrap(),
            groups: vec![],
            instructions: String::new(),
            tips: String::new(),
            image_names: vec![],
            user_made: false,
            weight_unit: domain::WeightUnit::default(),
            details: vec![],
        }
    }

    #[test]
    fn test_exercises() {
        let store = MemoryStore::default();
        store.create_exercise(&exercise("Squat")).unwrap();
        store.create_exercises(&[exercise("Lunge")]).unwrap();

        store
            .replace_exercise(&domain::Name::new("Squat").unwrap(), &exercise("Back Squat"))
            .unwrap();
        store
            .delete_exercise(&domain::Name::new("Lunge").unwrap())
            .unwrap();

        assert_eq!(
            store.read_exercises().unwrap(),
            vec![exercise("Back Squat")]
        );
    }

    #[test]
    fn test_sessions() {
        let store = MemoryStore::default();
        let sessions = vec![domain::Session {
            name: domain::Name::new("Leg Day").unwrap(),
            info: String::new(),
            exercises: vec![],
            seconds_elapsed: 0,
            completed: None,
        }];

        store.write_sessions(&sessions).unwrap();

        assert_eq!(store.read_sessions().unwrap(), sessions);
    }
}
