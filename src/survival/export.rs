//! CSV artifact writers for test-set predictions

use crate::{Error, Result};
use std::fs;
use std::fmt::Write as _;
use std::path::Path;

/// `submission.csv`: one hard {0,1} prediction per passenger at the
/// given threshold.
pub fn write_submission(
    path: &Path,
    passenger_ids: &[i64],
    probabilities: &[f32],
    threshold: f32,
) -> Result<()> {
    if passenger_ids.len() != probabilities.len() {
        return Err(Error::Training(format!(
            "ids/probabilities misaligned: {} vs {}",
            passenger_ids.len(),
            probabilities.len()
        )));
    }
    let mut out = String::from("PassengerId,Survived\n");
    for (id, &prob) in passenger_ids.iter().zip(probabilities.iter()) {
        let survived = if prob >= threshold { 1 } else { 0 };
        let _ = writeln!(out, "{id},{survived}");
    }
    fs::write(path, out)?;
    Ok(())
}

/// `probabilities.csv`: raw survival probability per passenger,
/// six decimal places.
pub fn write_probabilities(path: &Path, passenger_ids: &[i64], probabilities: &[f32]) -> Result<()> {
    if passenger_ids.len() != probabilities.len() {
        return Err(Error::Training(format!(
            "ids/probabilities misaligned: {} vs {}",
            passenger_ids.len(),
            probabilities.len()
        )));
    }
    let mut out = String::from("PassengerId,Probability\n");
    for (id, &prob) in passenger_ids.iter().zip(probabilities.iter()) {
        let _ = writeln!(out, "{id},{prob:.6}");
    }
    fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn submission_applies_default_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        write_submission(&path, &[892, 893, 894], &[0.7, 0.5, 0.49], 0.5).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "PassengerId,Survived\n892,1\n893,1\n894,0\n");
    }

    #[test]
    fn probabilities_use_six_decimals() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probabilities.csv");
        write_probabilities(&path, &[892], &[0.123456789]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "PassengerId,Probability\n892,0.123457\n");
    }

    #[test]
    fn misaligned_lengths_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        assert!(write_submission(&path, &[1, 2], &[0.5], 0.5).is_err());
    }
}
