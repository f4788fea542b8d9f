//! Records pulled out of the portal pages.

use serde::{Deserialize, Serialize};

/// Placeholder for any value the portal didn't show.
pub const ABSENT: &str = "-";

fn or_absent(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| ABSENT.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub campus_banner: String,
    pub id_number: String,
    pub full_name: String,
    pub program_name: String,
    pub study_plan: String,
    pub gpa: String,
}

impl StudentProfile {
    /// Missing or blank values become [`ABSENT`].
    pub fn new(
        campus_banner: Option<String>,
        id_number: Option<String>,
        full_name: Option<String>,
        program_name: Option<String>,
        study_plan: Option<String>,
        gpa: Option<String>,
    ) -> Self {
        Self {
            campus_banner: or_absent(campus_banner),
            id_number: or_absent(id_number),
            full_name: or_absent(full_name),
            program_name: or_absent(program_name),
            study_plan: or_absent(study_plan),
            gpa: or_absent(gpa),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub group_code: String,
    pub subject_name: String,
    pub professor_name: String,
    pub building: String,
    pub room: String,
    /// Monday through Friday.
    pub weekday_slots: [String; 5],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeEntry {
    pub group_code: String,
    pub subject_name: String,
    pub first_partial: String,
    pub second_partial: String,
    pub third_partial: String,
    pub extra: String,
    pub final_grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub code: String,
    pub subject_name: String,
    pub date: String,
    pub term: String,
    pub evaluation_type: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLevel {
    pub number: u32,
    pub label: String,
    pub classes: Vec<TranscriptEntry>,
}

/// The kardex: classes grouped by academic level, in the order the levels were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    levels: Vec<TranscriptLevel>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a level under `label`, relabelling it if it already exists.
    pub fn add_level(&mut self, number: u32, label: impl Into<String>) {
        let label = label.into();
        match self.level_mut(number) {
            Some(level) => level.label = label,
            None => self.levels.push(TranscriptLevel {
                number,
                label,
                classes: Vec::new(),
            }),
        }
    }

    /// Appends a class to `level`, creating the level on first use.
    pub fn add_class(&mut self, level: u32, entry: TranscriptEntry) {
        if self.level_mut(level).is_none() {
            self.add_level(level, ABSENT);
        }
        if let Some(bucket) = self.level_mut(level) {
            bucket.classes.push(entry);
        }
    }

    /// Number of levels.
    pub fn size(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, number: u32) -> Option<&TranscriptLevel> {
        self.levels.iter().find(|l| l.number == number)
    }

    pub fn level_classes(&self, number: u32) -> Option<&[TranscriptEntry]> {
        self.level(number).map(|l| l.classes.as_slice())
    }

    pub fn levels(&self) -> impl Iterator<Item = &TranscriptLevel> {
        self.levels.iter()
    }

    fn level_mut(&mut self, number: u32) -> Option<&mut TranscriptLevel> {
        self.levels.iter_mut().find(|l| l.number == number)
    }
}
