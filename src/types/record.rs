//! Input records for score prediction

use crate::error::ValidationError;
use crate::types::table::FeatureTable;
use serde::{Deserialize, Serialize};

/// Values offered for `gender`
pub const GENDERS: [&str; 2] = ["male", "female"];

/// Values offered for `race_ethnicity`
pub const RACE_ETHNICITIES: [&str; 5] = ["group A", "group B", "group C", "group D", "group E"];

/// Values offered for `parental_level_of_education`
pub const PARENTAL_EDUCATION_LEVELS: [&str; 6] = [
    "some high school",
    "high school",
    "some college",
    "associate's degree",
    "bachelor's degree",
    "master's degree",
];

/// Values offered for `lunch`
pub const LUNCH_TYPES: [&str; 2] = ["standard", "free/reduced"];

/// Values offered for `test_preparation_course`
pub const TEST_PREPARATION_COURSES: [&str; 2] = ["none", "completed"];

/// A form submission exactly as the caller received it.
///
/// Every field is kept as the raw string so it can be shown back to the user
/// unchanged when validation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub gender: String,
    #[serde(alias = "race_ethnicity")]
    pub ethnicity: String,
    pub parental_level_of_education: String,
    pub lunch: String,
    pub test_preparation_course: String,
    pub reading_score: String,
    pub writing_score: String,
}

impl RawRecord {
    /// True when at least one field is empty
    pub fn has_empty_field(&self) -> bool {
        self.fields().iter().any(|(_, value)| value.is_empty())
    }

    fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("gender", &self.gender),
            ("race_ethnicity", &self.ethnicity),
            ("parental_level_of_education", &self.parental_level_of_education),
            ("lunch", &self.lunch),
            ("test_preparation_course", &self.test_preparation_course),
            ("reading_score", &self.reading_score),
            ("writing_score", &self.writing_score),
        ]
    }
}

/// Validated attributes of one student.
///
/// Categorical values are not checked against the known vocabularies here;
/// an unseen category is reported by the transformer at prediction time.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    gender: String,
    race_ethnicity: String,
    parental_level_of_education: String,
    lunch: String,
    test_preparation_course: String,
    reading_score: f64,
    writing_score: f64,
}

impl InputRecord {
    /// Build a record from already-converted values.
    pub fn new(
        gender: impl Into<String>,
        race_ethnicity: impl Into<String>,
        parental_level_of_education: impl Into<String>,
        lunch: impl Into<String>,
        test_preparation_course: impl Into<String>,
        reading_score: f64,
        writing_score: f64,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            gender: required("gender", gender.into())?,
            race_ethnicity: required("race_ethnicity", race_ethnicity.into())?,
            parental_level_of_education: required(
                "parental_level_of_education",
                parental_level_of_education.into(),
            )?,
            lunch: required("lunch", lunch.into())?,
            test_preparation_course: required(
                "test_preparation_course",
                test_preparation_course.into(),
            )?,
            reading_score: finite("reading_score", reading_score)?,
            writing_score: finite("writing_score", writing_score)?,
        };
        Ok(record)
    }

    /// Build a record from raw form strings, parsing both scores.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, ValidationError> {
        if let Some((field, _)) = raw.fields().into_iter().find(|(_, v)| v.is_empty()) {
            return Err(ValidationError::MissingField(field));
        }

        let reading_score = parse_score("reading_score", &raw.reading_score)?;
        let writing_score = parse_score("writing_score", &raw.writing_score)?;

        Self::new(
            raw.gender.as_str(),
            raw.ethnicity.as_str(),
            raw.parental_level_of_education.as_str(),
            raw.lunch.as_str(),
            raw.test_preparation_course.as_str(),
            reading_score,
            writing_score,
        )
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn race_ethnicity(&self) -> &str {
        &self.race_ethnicity
    }

    pub fn parental_level_of_education(&self) -> &str {
        &self.parental_level_of_education
    }

    pub fn lunch(&self) -> &str {
        &self.lunch
    }

    pub fn test_preparation_course(&self) -> &str {
        &self.test_preparation_course
    }

    pub fn reading_score(&self) -> f64 {
        self.reading_score
    }

    pub fn writing_score(&self) -> f64 {
        self.writing_score
    }

    /// Materialize this record as a one-row feature table.
    pub fn to_feature_table(&self) -> FeatureTable {
        crate::feature_materializer::FeatureMaterializer::new().materialize(self)
    }
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}

fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field, value });
    }
    Ok(value)
}

fn parse_score(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        })?;
    finite(field, value)
}
