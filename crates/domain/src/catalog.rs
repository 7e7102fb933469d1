//! Exercise catalog index.
//!
//! Owns the in-memory derived index over the persisted exercise collection:
//! a name-keyed lookup cache, alphabetical section buckets for list
//! rendering, and a transient single-bucket view for active search. All
//! mutations go through this type; writing to the store directly would
//! desynchronize the index.

use std::collections::{BTreeMap, HashMap};

use crate::{
    CreateError, DeleteError, Exercise, ExerciseRepository, ExerciseSeeder, LoadError, Name,
    ReadError, SeedReport, UpdateError, log_on_error,
    observer::{ObserverID, ObserverRegistry},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loaded,
}

/// Transient single-bucket search view. Rebuilt from the canonical buckets
/// after every structural mutation while a filter is active.
struct FilterView {
    text: String,
    key: String,
    names: Vec<Name>,
}

pub struct ExerciseCatalog<R> {
    repository: R,
    exercises: HashMap<Name, Exercise>,
    sections: BTreeMap<String, Vec<Name>>,
    filtered: Option<FilterView>,
    state: LoadState,
    observers: ObserverRegistry,
}

impl<R: ExerciseRepository> ExerciseCatalog<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            exercises: HashMap::new(),
            sections: BTreeMap::new(),
            filtered: None,
            state: LoadState::default(),
            observers: ObserverRegistry::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Populates the index from the store, seeding the store first if it is
    /// empty. Idempotent: a loaded catalog is left untouched.
    pub fn load<S: ExerciseSeeder<R>>(&mut self, seeder: &S) -> Result<SeedReport, LoadError> {
        if self.state == LoadState::Loaded {
            return Ok(SeedReport::default());
        }

        let mut exercises =
            log_on_error!(self.repository.read_exercises(), "read", "exercises")?;
        let mut report = SeedReport::default();

        if exercises.is_empty() {
            report = seeder.seed(&self.repository)?;
            exercises = log_on_error!(self.repository.read_exercises(), "read", "exercises")?;
        }

        for exercise in exercises {
            self.index(exercise);
        }
        self.refresh_filter();

        self.state = LoadState::Loaded;

        Ok(report)
    }

    #[must_use]
    pub fn contains(&self, name: &Name) -> bool {
        self.exercises.contains_key(name)
    }

    pub fn get(&self, name: &Name) -> Result<&Exercise, ReadError> {
        self.exercises.get(name).ok_or(ReadError::NotFound)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    #[must_use]
    pub fn num_sections(&self) -> usize {
        match &self.filtered {
            Some(_) => 1,
            None => self.sections.len(),
        }
    }

    #[must_use]
    pub fn num_exercises_in(&self, section: usize) -> usize {
        self.section_names(section).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn section_title(&self, section: usize) -> Option<&str> {
        match &self.filtered {
            Some(view) => (section == 0).then_some(view.key.as_str()),
            None => self.sections.keys().nth(section).map(String::as_str),
        }
    }

    #[must_use]
    pub fn section_titles(&self) -> Vec<&str> {
        match &self.filtered {
            Some(view) => vec![view.key.as_str()],
            None => self.sections.keys().map(String::as_str).collect(),
        }
    }

    /// Resolves a list position to an exercise, against the search view when
    /// a filter is active.
    #[must_use]
    pub fn exercise_at(&self, section: usize, row: usize) -> Option<&Exercise> {
        let names = self.section_names(section)?;
        self.exercises.get(names.get(row)?)
    }

    /// Exercises in section order, against the search view when a filter is
    /// active.
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        let names: Vec<&Name> = match &self.filtered {
            Some(view) => view.names.iter().collect(),
            None => self.sections.values().flatten().collect(),
        };
        names.into_iter().filter_map(|name| self.exercises.get(name))
    }

    pub fn create(&mut self, exercise: Exercise) -> Result<(), CreateError> {
        if self.exercises.contains_key(&exercise.name) {
            return Err(CreateError::Conflict);
        }

        log_on_error!(
            self.repository.create_exercise(&exercise),
            "create",
            "exercise"
        )?;
        self.index(exercise);
        self.refresh_filter();
        self.observers.notify_stale();

        Ok(())
    }

    pub fn update(&mut self, current: &Name, exercise: Exercise) -> Result<(), UpdateError> {
        if !self.exercises.contains_key(current) {
            return Err(UpdateError::NotFound);
        }

        if *current == exercise.name {
            log_on_error!(
                self.repository.replace_exercise(current, &exercise),
                "replace",
                "exercise"
            )?;
            self.exercises.insert(exercise.name.clone(), exercise);
        } else {
            if self.exercises.contains_key(&exercise.name) {
                return Err(UpdateError::Conflict);
            }
            log_on_error!(
                self.repository.replace_exercise(current, &exercise),
                "replace",
                "exercise"
            )?;
            self.deindex(current);
            self.index(exercise);
        }

        self.refresh_filter();
        self.observers.notify_stale();

        Ok(())
    }

    /// Removes an exercise and its user-uploaded images. Unknown names are a
    /// no-op.
    pub fn remove(&mut self, name: &Name) -> Result<(), DeleteError> {
        let Some(exercise) = self.exercises.get(name) else {
            return Ok(());
        };

        if exercise.user_made {
            log_on_error!(self.repository.delete_images(name), "delete", "images")?;
        }
        log_on_error!(self.repository.delete_exercise(name), "delete", "exercise")?;
        self.deindex(name);
        self.refresh_filter();
        self.observers.notify_stale();

        Ok(())
    }

    /// Replaces the search view with the single bucket keyed by the text's
    /// first character, filtered by case-insensitive name prefix. Empty text
    /// clears the view. The canonical buckets are never touched; while the
    /// filter is active, the view follows subsequent mutations.
    pub fn set_filter(&mut self, text: &str) {
        self.filtered = self.filter_view(text);
    }

    pub fn clear_filter(&mut self) {
        self.filtered = None;
    }

    pub fn register_observer(&mut self, observer: Box<dyn Fn()>) -> ObserverID {
        self.observers.register(observer)
    }

    pub fn unregister_observer(&mut self, id: ObserverID) {
        self.observers.unregister(id);
    }

    pub fn set_active_observer(&mut self, id: Option<ObserverID>) {
        self.observers.set_active(id);
    }

    fn section_names(&self, section: usize) -> Option<&Vec<Name>> {
        match &self.filtered {
            Some(view) => (section == 0).then_some(&view.names),
            None => self.sections.values().nth(section),
        }
    }

    fn filter_view(&self, text: &str) -> Option<FilterView> {
        let first = text.chars().next()?;
        let key = first.to_uppercase().to_string();
        let needle = text.to_lowercase();
        let names = self.sections.get(&key).map_or_else(Vec::new, |names| {
            names
                .iter()
                .filter(|name| name.as_ref().to_lowercase().starts_with(&needle))
                .cloned()
                .collect()
        });

        Some(FilterView {
            text: text.to_string(),
            key,
            names,
        })
    }

    fn refresh_filter(&mut self) {
        if let Some(text) = self.filtered.as_ref().map(|view| view.text.clone()) {
            self.filtered = self.filter_view(&text);
        }
    }

    fn index(&mut self, exercise: Exercise) {
        let names = self.sections.entry(exercise.section_key()).or_default();
        if let Err(position) = names.binary_search(&exercise.name) {
            names.insert(position, exercise.name.clone());
        }
        self.exercises.insert(exercise.name.clone(), exercise);
    }

    fn deindex(&mut self, name: &Name) {
        self.exercises.remove(name);
        let key = name.section_key();
        if let Some(names) = self.sections.get_mut(&key) {
            if let Ok(position) = names.binary_search(name) {
                names.remove(position);
            }
            if names.is_empty() {
                self.sections.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use pretty_assertions::assert_eq;

    use crate::{ExerciseDetail, MuscleGroup, NoopSeeder, SeedError, StorageError, WeightUnit};

    use super::*;

    #[derive(Default)]
    struct FakeRepository {
        exercises: RefCell<Vec<Exercise>>,
        fail_writes: Cell<bool>,
        deleted_images: RefCell<Vec<Name>>,
    }

    impl ExerciseRepository for FakeRepository {
        fn read_exercises(&self) -> Result<Vec<Exercise>, StorageError> {
            Ok(self.exercises.borrow().clone())
        }

        fn create_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
            if self.fail_writes.get() {
                return Err(StorageError::Unavailable);
            }
            self.exercises.borrow_mut().push(exercise.clone());
            Ok(())
        }

        fn create_exercises(&self, exercises: &[Exercise]) -> Result<(), StorageError> {
            if self.fail_writes.get() {
                return Err(StorageError::Unavailable);
            }
            self.exercises.borrow_mut().extend_from_slice(exercises);
            Ok(())
        }

        fn replace_exercise(&self, name: &Name, exercise: &Exercise) -> Result<(), StorageError> {
            if self.fail_writes.get() {
                return Err(StorageError::Unavailable);
            }
            let mut exercises = self.exercises.borrow_mut();
            if let Some(stored) = exercises.iter_mut().find(|e| e.name == *name) {
                *stored = exercise.clone();
            }
            Ok(())
        }

        fn delete_exercise(&self, name: &Name) -> Result<(), StorageError> {
            if self.fail_writes.get() {
                return Err(StorageError::Unavailable);
            }
            self.exercises.borrow_mut().retain(|e| e.name != *name);
            Ok(())
        }

        fn delete_images(&self, name: &Name) -> Result<(), StorageError> {
            self.deleted_images.borrow_mut().push(name.clone());
            Ok(())
        }
    }

    struct FixedSeeder(Vec<Exercise>);

    impl ExerciseSeeder<FakeRepository> for FixedSeeder {
        fn seed(&self, repository: &FakeRepository) -> Result<SeedReport, SeedError> {
            repository.create_exercises(&self.0)?;
            Ok(SeedReport {
                created: self.0.len(),
                skipped: vec![],
            })
        }
    }

    fn exercise(name: &str, groups: Vec<MuscleGroup>) -> Exercise {
        Exercise {
            name: Name::new(name).unwrap(),
            groups,
            instructions: String::new(),
            tips: String::new(),
            image_names: vec![],
            user_made: false,
            weight_unit: WeightUnit::default(),
            details: vec![],
        }
    }

    fn loaded_catalog(names: &[&str]) -> ExerciseCatalog<FakeRepository> {
        let repository = FakeRepository::default();
        for name in names {
            repository
                .create_exercise(&exercise(name, vec![]))
                .unwrap();
        }
        let mut catalog = ExerciseCatalog::new(repository);
        catalog.load(&NoopSeeder).unwrap();
        catalog
    }

    fn enumeration(catalog: &ExerciseCatalog<FakeRepository>) -> Vec<String> {
        catalog
            .exercises()
            .map(|e| e.name.as_ref().to_string())
            .collect()
    }

    fn assert_consistent(catalog: &ExerciseCatalog<FakeRepository>) {
        let mut total = 0;
        for (key, names) in &catalog.sections {
            assert!(!names.is_empty());
            assert!(names.is_sorted());
            for name in names {
                assert_eq!(name.section_key(), *key);
                assert!(catalog.exercises.contains_key(name));
                total += 1;
            }
        }
        assert_eq!(total, catalog.exercises.len());
    }

    #[test]
    fn test_load_seeds_empty_store() {
        let mut catalog = ExerciseCatalog::new(FakeRepository::default());
        let seeder = FixedSeeder(vec![
            exercise("Squat", vec![MuscleGroup::Legs]),
            exercise("Bench Press", vec![MuscleGroup::Chest]),
        ]);

        let report = catalog.load(&seeder).unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.state(), LoadState::Loaded);
        assert_consistent(&catalog);
    }

    #[test]
    fn test_load_skips_seed_when_store_populated() {
        let repository = FakeRepository::default();
        repository.create_exercise(&exercise("Deadlift", vec![])).unwrap();
        let mut catalog = ExerciseCatalog::new(repository);
        let seeder = FixedSeeder(vec![exercise("Squat", vec![])]);

        let report = catalog.load(&seeder).unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(enumeration(&catalog), vec!["Deadlift"]);
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut catalog = loaded_catalog(&["Squat"]);

        catalog.load(&NoopSeeder).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.num_exercises_in(0), 1);
    }

    #[test]
    fn test_create() {
        let mut catalog = loaded_catalog(&[]);

        catalog
            .create(exercise("Squat", vec![MuscleGroup::Legs]))
            .unwrap();

        let name = Name::new("Squat").unwrap();
        assert!(catalog.contains(&name));
        assert_eq!(catalog.get(&name).unwrap().groups_text(), "Legs");
        assert_eq!(catalog.section_titles(), vec!["S"]);
        assert_eq!(catalog.num_exercises_in(0), 1);
        assert_eq!(
            catalog.exercise_at(0, 0).unwrap().name,
            Name::new("Squat").unwrap()
        );
        assert_eq!(catalog.repository.exercises.borrow().len(), 1);
        assert_consistent(&catalog);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let mut catalog = loaded_catalog(&["Squat"]);

        let result = catalog.create(exercise("Squat", vec![]));

        assert!(matches!(result, Err(CreateError::Conflict)));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.repository.exercises.borrow().len(), 1);
    }

    #[test]
    fn test_create_propagates_storage_error() {
        let mut catalog = loaded_catalog(&[]);
        catalog.repository.fail_writes.set(true);

        let result = catalog.create(exercise("Squat", vec![]));

        assert!(matches!(
            result,
            Err(CreateError::Storage(StorageError::Unavailable))
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let catalog = loaded_catalog(&[]);

        assert!(matches!(
            catalog.get(&Name::new("Squat").unwrap()),
            Err(ReadError::NotFound)
        ));
    }

    #[test]
    fn test_sections_sorted() {
        let catalog = loaded_catalog(&["Squat", "Bench Press", "Sumo Deadlift", "Burpee"]);

        assert_eq!(catalog.section_titles(), vec!["B", "S"]);
        assert_eq!(
            enumeration(&catalog),
            vec!["Bench Press", "Burpee", "Squat", "Sumo Deadlift"]
        );
        assert_consistent(&catalog);
    }

    #[test]
    fn test_exercise_at_bounds() {
        let catalog = loaded_catalog(&["Squat"]);

        assert!(catalog.exercise_at(0, 1).is_none());
        assert!(catalog.exercise_at(1, 0).is_none());
    }

    #[test]
    fn test_update_in_place() {
        let mut catalog = loaded_catalog(&["Squat", "Sumo Deadlift"]);
        let mut updated = exercise("Squat", vec![MuscleGroup::Legs, MuscleGroup::Glutes]);
        updated.details.push(ExerciseDetail {
            last: "Jan 1".to_string(),
            reps: "5".to_string(),
            weight: "225".to_string(),
        });

        catalog
            .update(&Name::new("Squat").unwrap(), updated)
            .unwrap();

        assert_eq!(enumeration(&catalog), vec!["Squat", "Sumo Deadlift"]);
        assert_eq!(
            catalog
                .get(&Name::new("Squat").unwrap())
                .unwrap()
                .groups_text(),
            "Legs, Glutes"
        );
        assert_consistent(&catalog);
    }

    #[test]
    fn test_rename_moves_bucket() {
        let mut catalog = loaded_catalog(&["Apple Press"]);

        catalog
            .update(
                &Name::new("Apple Press").unwrap(),
                exercise("Banana Press", vec![]),
            )
            .unwrap();

        assert!(!catalog.contains(&Name::new("Apple Press").unwrap()));
        assert!(catalog.contains(&Name::new("Banana Press").unwrap()));
        assert_eq!(catalog.section_titles(), vec!["B"]);
        assert_consistent(&catalog);
    }

    #[test]
    fn test_rename_conflict_fails() {
        let mut catalog = loaded_catalog(&["Squat", "Deadlift"]);

        let result = catalog.update(&Name::new("Squat").unwrap(), exercise("Deadlift", vec![]));

        assert!(matches!(result, Err(UpdateError::Conflict)));
        assert_eq!(enumeration(&catalog), vec!["Deadlift", "Squat"]);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let mut catalog = loaded_catalog(&[]);

        let result = catalog.update(&Name::new("Squat").unwrap(), exercise("Squat", vec![]));

        assert!(matches!(result, Err(UpdateError::NotFound)));
    }

    #[test]
    fn test_remove() {
        let mut catalog = loaded_catalog(&["Squat", "Sumo Deadlift"]);

        catalog.remove(&Name::new("Squat").unwrap()).unwrap();

        assert_eq!(enumeration(&catalog), vec!["Sumo Deadlift"]);
        assert_eq!(catalog.repository.exercises.borrow().len(), 1);
        assert_consistent(&catalog);
    }

    #[test]
    fn test_remove_drops_empty_section() {
        let mut catalog = loaded_catalog(&["Squat", "Bench Press"]);

        catalog.remove(&Name::new("Squat").unwrap()).unwrap();

        assert_eq!(catalog.section_titles(), vec!["B"]);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut catalog = loaded_catalog(&["Squat"]);

        catalog.remove(&Name::new("Deadlift").unwrap()).unwrap();

        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_remove_user_made_deletes_images() {
        let mut catalog = loaded_catalog(&[]);
        let mut mine = exercise("My Lift", vec![]);
        mine.user_made = true;
        catalog.create(mine).unwrap();
        catalog.create(exercise("Squat", vec![])).unwrap();

        catalog.remove(&Name::new("My Lift").unwrap()).unwrap();
        catalog.remove(&Name::new("Squat").unwrap()).unwrap();

        assert_eq!(
            *catalog.repository.deleted_images.borrow(),
            vec![Name::new("My Lift").unwrap()]
        );
    }

    #[test]
    fn test_filter_prefix_match() {
        let mut catalog = loaded_catalog(&["Squat", "Sumo Deadlift", "squat jump", "Bench Press"]);

        catalog.set_filter("sq");

        assert_eq!(catalog.num_sections(), 1);
        assert_eq!(catalog.section_titles(), vec!["S"]);
        assert_eq!(enumeration(&catalog), vec!["Squat", "squat jump"]);
        assert_eq!(
            catalog.exercise_at(0, 0).unwrap().name,
            Name::new("Squat").unwrap()
        );
        assert_eq!(
            catalog.exercise_at(0, 1).unwrap().name,
            Name::new("squat jump").unwrap()
        );
    }

    #[test]
    fn test_filter_tracks_remove() {
        let mut catalog = loaded_catalog(&["Squat", "Sumo Deadlift"]);
        catalog.set_filter("sq");

        catalog.remove(&Name::new("Squat").unwrap()).unwrap();

        assert_eq!(catalog.num_exercises_in(0), 0);
        assert!(catalog.exercise_at(0, 0).is_none());
        assert_eq!(enumeration(&catalog), Vec::<String>::new());
    }

    #[test]
    fn test_filter_tracks_create() {
        let mut catalog = loaded_catalog(&["Squat"]);
        catalog.set_filter("sq");

        catalog.create(exercise("Squat Jump", vec![])).unwrap();
        catalog.create(exercise("Bench Press", vec![])).unwrap();

        assert_eq!(catalog.num_exercises_in(0), 2);
        assert_eq!(enumeration(&catalog), vec!["Squat", "Squat Jump"]);
    }

    #[test]
    fn test_filter_tracks_rename() {
        let mut catalog = loaded_catalog(&["Squat"]);
        catalog.set_filter("sq");

        catalog
            .update(&Name::new("Squat").unwrap(), exercise("Deadlift", vec![]))
            .unwrap();

        assert_eq!(catalog.num_exercises_in(0), 0);
        assert_eq!(enumeration(&catalog), Vec::<String>::new());
    }

    #[test]
    fn test_filter_without_matching_bucket() {
        let mut catalog = loaded_catalog(&["Squat"]);

        catalog.set_filter("zercher");

        assert_eq!(catalog.num_sections(), 1);
        assert_eq!(catalog.section_titles(), vec!["Z"]);
        assert_eq!(catalog.num_exercises_in(0), 0);
    }

    #[test]
    fn test_filter_round_trip() {
        let mut catalog = loaded_catalog(&["Squat", "Bench Press", "Burpee"]);
        let before = enumeration(&catalog);
        let titles_before: Vec<String> =
            catalog.section_titles().iter().map(|t| (*t).to_string()).collect();

        catalog.set_filter("b");
        catalog.set_filter("");

        assert_eq!(enumeration(&catalog), before);
        assert_eq!(catalog.section_titles(), titles_before);

        catalog.set_filter("b");
        catalog.clear_filter();

        assert_eq!(enumeration(&catalog), before);
    }

    #[test]
    fn test_mutations_notify_observers_except_active() {
        let mut catalog = loaded_catalog(&[]);
        let foreground = Rc::new(Cell::new(0));
        let background = Rc::new(Cell::new(0));
        let foreground_count = Rc::clone(&foreground);
        let background_count = Rc::clone(&background);
        let id = catalog
            .register_observer(Box::new(move || foreground_count.set(foreground_count.get() + 1)));
        catalog
            .register_observer(Box::new(move || background_count.set(background_count.get() + 1)));
        catalog.set_active_observer(Some(id));

        catalog.create(exercise("Squat", vec![])).unwrap();
        catalog
            .update(&Name::new("Squat").unwrap(), exercise("Squat", vec![]))
            .unwrap();
        catalog.remove(&Name::new("Squat").unwrap()).unwrap();

        assert_eq!(foreground.get(), 0);
        assert_eq!(background.get(), 3);
    }
}
