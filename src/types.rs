//! Shared enumerations used across modules
//!
//! Wire spellings match what the web frontend sends and renders
//! ("Reading/Writing", "Needs Clarification", grades as "9".."12").

use serde::{Deserialize, Serialize};

/// School subject a query or material belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Mathematics,
    English,
    Science,
    History,
    Chemistry,
    Physics,
    Biology,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::English => "English",
            Subject::Science => "Science",
            Subject::History => "History",
            Subject::Chemistry => "Chemistry",
            Subject::Physics => "Physics",
            Subject::Biology => "Biology",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Mathematics" => Some(Subject::Mathematics),
            "English" => Some(Subject::English),
            "Science" => Some(Subject::Science),
            "History" => Some(Subject::History),
            "Chemistry" => Some(Subject::Chemistry),
            "Physics" => Some(Subject::Physics),
            "Biology" => Some(Subject::Biology),
            _ => None,
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// High-school grade level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Grade {
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "11")]
    Eleven,
    #[serde(rename = "12")]
    Twelve,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Nine => "9",
            Grade::Ten => "10",
            Grade::Eleven => "11",
            Grade::Twelve => "12",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "9" => Some(Grade::Nine),
            "10" => Some(Grade::Ten),
            "11" => Some(Grade::Eleven),
            "12" => Some(Grade::Twelve),
            _ => None,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred learning style
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum LearningStyle {
    #[default]
    Visual,
    Auditory,
    #[serde(rename = "Reading/Writing")]
    ReadingWriting,
    Kinesthetic,
}

impl LearningStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStyle::Visual => "Visual",
            LearningStyle::Auditory => "Auditory",
            LearningStyle::ReadingWriting => "Reading/Writing",
            LearningStyle::Kinesthetic => "Kinesthetic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Visual" => Some(LearningStyle::Visual),
            "Auditory" => Some(LearningStyle::Auditory),
            "Reading/Writing" => Some(LearningStyle::ReadingWriting),
            "Kinesthetic" => Some(LearningStyle::Kinesthetic),
            _ => None,
        }
    }
}

impl std::fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Beginner" => Some(Difficulty::Beginner),
            "Intermediate" => Some(Difficulty::Intermediate),
            "Advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution state of a query
///
/// Queries are persisted together with their answer, so everything written
/// today is `Resolved`; the other states exist for stored data and clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ResolutionStatus {
    #[default]
    Pending,
    Resolved,
    #[serde(rename = "Needs Clarification")]
    NeedsClarification,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Pending => "Pending",
            ResolutionStatus::Resolved => "Resolved",
            ResolutionStatus::NeedsClarification => "Needs Clarification",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(ResolutionStatus::Pending),
            "Resolved" => Some(ResolutionStatus::Resolved),
            "Needs Clarification" => Some(ResolutionStatus::NeedsClarification),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_frontend() {
        assert_eq!(serde_json::to_string(&Grade::Ten).unwrap(), "\"10\"");
        assert_eq!(
            serde_json::to_string(&LearningStyle::ReadingWriting).unwrap(),
            "\"Reading/Writing\""
        );
        assert_eq!(
            serde_json::to_string(&ResolutionStatus::NeedsClarification).unwrap(),
            "\"Needs Clarification\""
        );
        let subject: Subject = serde_json::from_str("\"Physics\"").unwrap();
        assert_eq!(subject, Subject::Physics);
    }

    #[test]
    fn test_parse_matches_as_str() {
        for subject in [Subject::Mathematics, Subject::English, Subject::Biology] {
            assert_eq!(Subject::parse(subject.as_str()), Some(subject));
        }
        assert_eq!(Grade::parse(" 12 "), Some(Grade::Twelve));
        assert_eq!(Grade::parse("8"), None);
        assert_eq!(Difficulty::default(), Difficulty::Intermediate);
        assert_eq!(ResolutionStatus::parse("Resolved"), Some(ResolutionStatus::Resolved));
    }
}
