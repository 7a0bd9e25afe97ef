//! End-to-end checks against the artifacts shipped in `artifacts/`

use score_predictor::error::{ArtifactKind, PredictionError, ValidationError};
use score_predictor::form::{FormState, SubmitOutcome};
use score_predictor::models::{ArtifactLoader, PredictPipeline};
use score_predictor::types::record::{
    InputRecord, RawRecord, GENDERS, LUNCH_TYPES, PARENTAL_EDUCATION_LEVELS, RACE_ETHNICITIES,
    TEST_PREPARATION_COURSES,
};
use score_predictor::{AppConfig, FeatureMaterializer};
use std::fs;
use std::path::{Path, PathBuf};

fn artifacts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts")
}

fn pipeline() -> PredictPipeline {
    PredictPipeline::reloading(ArtifactLoader::from_dir(artifacts_dir()))
}

fn scenario() -> InputRecord {
    InputRecord::new(
        "female",
        "group B",
        "bachelor's degree",
        "standard",
        "completed",
        72.0,
        74.0,
    )
    .unwrap()
}

#[test]
fn valid_record_yields_one_prediction() {
    let table = scenario().to_feature_table();
    let predictions = pipeline().predict(&table).unwrap();
    assert_eq!(predictions.len(), 1);
}

#[test]
fn scenario_prediction_is_finite_and_in_range() {
    let score = pipeline().predict_record(&scenario()).unwrap();
    assert!(score.is_finite());
    assert!((0.0..=100.0).contains(&score), "score {score} outside [0, 100]");
    assert!((score - 62.7458).abs() < 1e-3, "unexpected score {score}");
}

#[test]
fn predictions_are_deterministic() {
    let pipeline = pipeline();
    let first = pipeline.predict(&scenario().to_feature_table()).unwrap();
    let second = pipeline.predict(&scenario().to_feature_table()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn every_known_category_is_encodable() {
    let pipeline = pipeline();
    let materializer = FeatureMaterializer::new();
    let mut records = Vec::new();
    for gender in GENDERS {
        for race in RACE_ETHNICITIES {
            for education in PARENTAL_EDUCATION_LEVELS {
                for lunch in LUNCH_TYPES {
                    for prep in TEST_PREPARATION_COURSES {
                        records.push(
                            InputRecord::new(gender, race, education, lunch, prep, 70.0, 70.0)
                                .unwrap(),
                        );
                    }
                }
            }
        }
    }

    let table = materializer.materialize_all(&records);
    let predictions = pipeline.predict(&table).unwrap();
    assert_eq!(predictions.len(), records.len());
    assert!(predictions.iter().all(|p| p.is_finite()));
}

#[test]
fn malformed_scores_are_validation_errors() {
    let mut raw = RawRecord {
        gender: "female".into(),
        ethnicity: "group B".into(),
        parental_level_of_education: "bachelor's degree".into(),
        lunch: "standard".into(),
        test_preparation_course: "completed".into(),
        reading_score: "abc".into(),
        writing_score: "74".into(),
    };
    assert!(matches!(
        InputRecord::from_raw(&raw),
        Err(ValidationError::InvalidNumber { field: "reading_score", .. })
    ));

    raw.reading_score = String::new();
    assert!(matches!(
        InputRecord::from_raw(&raw),
        Err(ValidationError::MissingField("reading_score"))
    ));
}

#[test]
fn missing_model_is_artifact_load_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(
        artifacts_dir().join("preprocessor.json"),
        dir.path().join("preprocessor.json"),
    )
    .unwrap();

    let pipeline = PredictPipeline::reloading(ArtifactLoader::from_dir(dir.path()));
    let err = pipeline.predict_record(&scenario()).unwrap_err();
    match err {
        PredictionError::ArtifactLoad(load) => assert_eq!(load.kind(), ArtifactKind::Model),
        other => panic!("expected an artifact load error, got {other:?}"),
    }
}

#[test]
fn out_of_vocabulary_category_is_not_fatal() {
    let record = InputRecord::new("female", "group F", "bachelor's degree", "standard", "none", 72.0, 74.0)
        .unwrap();
    let err = pipeline().predict_record(&record).unwrap_err();
    assert!(matches!(err, PredictionError::Transform(_)));
    assert!(!err.is_fatal());
}

#[test]
fn shipped_config_builds_a_working_pipeline() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut config = AppConfig::load_from_path(root.join("config/config.toml")).unwrap();
    config.artifacts.dir = artifacts_dir().to_string_lossy().into_owned();

    let pipeline = PredictPipeline::new(&config);
    pipeline.warm_up().unwrap();

    let mut state = FormState::new();
    let raw = RawRecord {
        gender: "male".into(),
        ethnicity: "group E".into(),
        parental_level_of_education: "master's degree".into(),
        lunch: "free/reduced".into(),
        test_preparation_course: "none".into(),
        reading_score: "88".into(),
        writing_score: " 90 ".into(),
    };
    assert_eq!(state.submit(raw, &pipeline), SubmitOutcome::Predicted);
    assert!(state.summary().is_some());
    assert_eq!(state.form_data.writing_score, " 90 ");
}
