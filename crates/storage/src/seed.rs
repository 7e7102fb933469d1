//! Exercise bulk loader.
//!
//! One-time seed of an empty store from bundled flat-file exercise
//! definitions: one `<group>.txt` file per muscle group with `Name:Groups`
//! lines, plus a per-exercise asset folder holding instruction text, tips
//! text, and images. Malformed or missing entries are skipped and reported
//! instead of aborting the seed.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use halter_domain::{
    Exercise, ExerciseRepository, ExerciseSeeder, MuscleGroup, Name, Property, SeedError,
    SeedReport, WeightUnit,
};
use log::{info, warn};

/// Manifest of expected section titles shipped alongside the seed files.
pub const SECTIONS_MANIFEST: &str = "exercise_sections.txt";

pub struct FlatFileSeeder {
    assets_dir: PathBuf,
}

impl FlatFileSeeder {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    fn exercise_from_line(&self, line: &str, report: &mut SeedReport) -> Option<Exercise> {
        let Some((name_part, groups_part)) = line.split_once(':') else {
            report.skipped.push(format!("malformed line \"{line}\""));
            return None;
        };

        let name = match Name::new(name_part) {
            Ok(name) => name,
            Err(err) => {
                report.skipped.push(format!("\"{name_part}\": {err}"));
                return None;
            }
        };

        let groups = match MuscleGroup::parse_list(groups_part) {
            Ok(groups) => groups,
            Err(err) => {
                report.skipped.push(format!("{name}: {err}"));
                return None;
            }
        };

        let folder = self.assets_dir.join(asset_folder_name(name.as_ref()));
        if !folder.is_dir() {
            report
                .skipped
                .push(format!("{name}: missing asset folder {}", folder.display()));
            return None;
        }

        let Some(instructions) = read_formatted(&folder, "info.txt") else {
            report.skipped.push(format!("{name}: missing info.txt"));
            return None;
        };
        let Some(tips) = read_formatted(&folder, "tips.txt") else {
            report.skipped.push(format!("{name}: missing tips.txt"));
            return None;
        };

        Some(Exercise {
            name,
            groups,
            instructions,
            tips,
            image_names: image_names(&folder),
            user_made: false,
            weight_unit: WeightUnit::default(),
            details: vec![],
        })
    }

    fn manifest_titles(&self, report: &mut SeedReport) -> Vec<String> {
        match fs::read_to_string(self.assets_dir.join(SECTIONS_MANIFEST)) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(err) => {
                report.skipped.push(format!("{SECTIONS_MANIFEST}: {err}"));
                vec![]
            }
        }
    }
}

impl<R: ExerciseRepository> ExerciseSeeder<R> for FlatFileSeeder {
    fn seed(&self, repository: &R) -> Result<SeedReport, SeedError> {
        if !self.assets_dir.is_dir() {
            return Err(SeedError::Assets(self.assets_dir.display().to_string()));
        }

        let mut report = SeedReport::default();
        let mut exercises: Vec<Exercise> = Vec::new();
        let mut seen: HashSet<Name> = HashSet::new();

        for group in MuscleGroup::iter() {
            let file = self
                .assets_dir
                .join(format!("{}.txt", group.name().to_lowercase()));
            let content = match fs::read_to_string(&file) {
                Ok(content) => content,
                Err(err) => {
                    report.skipped.push(format!("{}: {err}", file.display()));
                    continue;
                }
            };

            for line in content.lines().filter(|line| !line.trim().is_empty()) {
                let Some(exercise) = self.exercise_from_line(line, &mut report) else {
                    continue;
                };
                if seen.insert(exercise.name.clone()) {
                    exercises.push(exercise);
                } else {
                    report
                        .skipped
                        .push(format!("{}: duplicate name", exercise.name));
                }
            }
        }

        let titles = self.manifest_titles(&mut report);
        for exercise in &exercises {
            let key = exercise.section_key();
            if !titles.is_empty() && !titles.contains(&key) {
                warn!("section {key} of {} not in manifest", exercise.name);
            }
        }

        repository.create_exercises(&exercises)?;
        report.created = exercises.len();
        info!(
            "seeded {} exercises, {} entries skipped",
            report.created,
            report.skipped.len()
        );

        Ok(report)
    }
}

/// Folder holding an exercise's bundled assets: lowercased name with path
/// separators replaced.
#[must_use]
pub fn asset_folder_name(name: &str) -> String {
    name.to_lowercase().replace('/', "_")
}

/// Reads the first file in `folder` whose name contains `suffix` and
/// reformats it with a blank line between paragraphs. The trailing empty
/// line, if any, is stripped.
fn read_formatted(folder: &Path, suffix: &str) -> Option<String> {
    let path = folder
        .read_dir()
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(suffix))
        })?;
    Some(format_paragraphs(&fs::read_to_string(path).ok()?))
}

fn format_paragraphs(content: &str) -> String {
    let mut lines: Vec<&str> = content.lines().collect();
    while lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n\n")
}

fn image_names(folder: &Path) -> Vec<String> {
    let Ok(entries) = folder.read_dir() else {
        return vec![];
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".png") || name.ends_with(".jpg"))
        .collect();
    names.sort();
    names
}
