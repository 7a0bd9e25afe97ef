//! Fixed-schema feature table handed to the transformer

use std::fmt;
use std::str::FromStr;

/// Columns of the feature table, in the order the transformer was fit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Gender,
    RaceEthnicity,
    ParentalLevelOfEducation,
    Lunch,
    TestPreparationCourse,
    ReadingScore,
    WritingScore,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Gender,
        Column::RaceEthnicity,
        Column::ParentalLevelOfEducation,
        Column::Lunch,
        Column::TestPreparationCourse,
        Column::ReadingScore,
        Column::WritingScore,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Column::Gender => "gender",
            Column::RaceEthnicity => "race_ethnicity",
            Column::ParentalLevelOfEducation => "parental_level_of_education",
            Column::Lunch => "lunch",
            Column::TestPreparationCourse => "test_preparation_course",
            Column::ReadingScore => "reading_score",
            Column::WritingScore => "writing_score",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Column::ReadingScore | Column::WritingScore)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| format!("unknown column `{s}`"))
    }
}

/// Column names in table order.
pub const COLUMNS: [&str; 7] = [
    Column::Gender.name(),
    Column::RaceEthnicity.name(),
    Column::ParentalLevelOfEducation.name(),
    Column::Lunch.name(),
    Column::TestPreparationCourse.name(),
    Column::ReadingScore.name(),
    Column::WritingScore.name(),
];

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            Cell::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(_) => None,
        }
    }
}

/// One row of the table, indexed by [`Column::index`].
pub type Row = [Cell; 7];

/// Rows of the seven input columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<Row>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rows: usize) -> Self {
        Self {
            rows: Vec::with_capacity(rows),
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &'static [&'static str; 7] {
        &COLUMNS
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, column: Column) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[column.index()])
    }

    /// Look up a column by its name.
    pub fn column_by_name(&self, name: &str) -> Option<Column> {
        name.parse().ok()
    }
}
