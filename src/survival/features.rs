//! Feature engineering: imputation statistics fitted on training rows
//! only, then row-to-vector transformation shared by train and test data.

use super::csv::Row;
use crate::{Error, Result};

const DEFAULT_AGE: f64 = 30.0;
const DEFAULT_FARE: f64 = 32.0;
const DEFAULT_EMBARKED: &str = "S";
const STD_FLOOR: f64 = 1e-6;

/// Statistics computed once from training rows and reused for test rows
#[derive(Debug, Clone, PartialEq)]
pub struct ImputationStats {
    pub age_median: f64,
    pub age_std: f64,
    pub fare_median: f64,
    pub fare_std: f64,
    pub embarked_mode: String,
}

/// Even-length input takes the mean of the two middle values
fn median(values: &mut Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Most frequent value; ties break to whichever value first reached the
/// winning count during the scan.
fn mode<'a, I: Iterator<Item = &'a str>>(values: I) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut best: Option<&str> = None;
    let mut best_count = 0usize;
    for v in values {
        let count = match counts.iter_mut().find(|(k, _)| *k == v) {
            Some((_, c)) => {
                *c += 1;
                *c
            }
            None => {
                counts.push((v, 1));
                1
            }
        };
        if count > best_count {
            best_count = count;
            best = Some(v);
        }
    }
    best.map(str::to_string)
}

fn plausible_age(row: &Row) -> Option<f64> {
    row.number("Age").filter(|&a| (1.0..=100.0).contains(&a))
}

fn plausible_fare(row: &Row) -> Option<f64> {
    row.number("Fare").filter(|&f| f >= 1.0)
}

/// Maps rows to fixed-order feature vectors.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    stats: ImputationStats,
    family_features: bool,
}

impl Preprocessor {
    /// Compute imputation statistics from training rows only.
    pub fn fit(rows: &[Row], family_features: bool) -> Self {
        let mut ages: Vec<f64> = rows.iter().filter_map(plausible_age).collect();
        let mut fares: Vec<f64> = rows.iter().filter_map(plausible_fare).collect();

        let stats = ImputationStats {
            age_median: median(&mut ages).unwrap_or(DEFAULT_AGE),
            age_std: std_dev(&ages).unwrap_or(1.0).max(STD_FLOOR),
            fare_median: median(&mut fares).unwrap_or(DEFAULT_FARE),
            fare_std: std_dev(&fares).unwrap_or(1.0).max(STD_FLOOR),
            embarked_mode: mode(rows.iter().filter_map(|r| r.text("Embarked")))
                .unwrap_or_else(|| DEFAULT_EMBARKED.to_string()),
        };

        Self {
            stats,
            family_features,
        }
    }

    pub fn stats(&self) -> &ImputationStats {
        &self.stats
    }

    pub fn family_features(&self) -> bool {
        self.family_features
    }

    pub fn feature_count(&self) -> usize {
        if self.family_features {
            14
        } else {
            12
        }
    }

    /// Index-aligned human names for the feature vector
    pub fn feature_names(&self) -> Vec<&'static str> {
        let mut names = vec![
            "Age (standardized)",
            "Fare (standardized)",
            "SibSp",
            "Parch",
            "Pclass=1",
            "Pclass=2",
            "Pclass=3",
            "Sex=male",
            "Sex=female",
            "Embarked=C",
            "Embarked=Q",
            "Embarked=S",
        ];
        if self.family_features {
            names.push("FamilySize");
            names.push("IsAlone");
        }
        names
    }

    /// Transform one row into its feature vector.
    ///
    /// Missing or implausible Age/Fare values are imputed with the fitted
    /// medians before standardization; unknown categorical values fall to
    /// their default category so each one-hot block still sums to 1.
    pub fn transform(&self, row: &Row) -> Result<Vec<f32>> {
        let age = plausible_age(row).unwrap_or(self.stats.age_median);
        let fare = plausible_fare(row).unwrap_or(self.stats.fare_median);
        let age_std = (age - self.stats.age_median) / self.stats.age_std;
        let fare_std = (fare - self.stats.fare_median) / self.stats.fare_std;
        if !age_std.is_finite() || !fare_std.is_finite() {
            return Err(Error::FeatureExtraction(format!(
                "non-finite standardized value for passenger {:?}",
                row.number("PassengerId")
            )));
        }

        let sibsp = row.number("SibSp").unwrap_or(0.0);
        let parch = row.number("Parch").unwrap_or(0.0);

        let pclass = match row.number("Pclass") {
            Some(p) if p == 1.0 => 0,
            Some(p) if p == 2.0 => 1,
            _ => 2,
        };
        let mut pclass_hot = [0.0f32; 3];
        pclass_hot[pclass] = 1.0;

        let sex_female = row
            .text("Sex")
            .map(|s| s.eq_ignore_ascii_case("female"))
            .unwrap_or(false);
        let sex_hot = if sex_female { [0.0, 1.0] } else { [1.0, 0.0] };

        let embarked = row
            .text("Embarked")
            .unwrap_or(self.stats.embarked_mode.as_str());
        let embarked_idx = match embarked {
            "C" => 0,
            "Q" => 1,
            "S" => 2,
            _ => match self.stats.embarked_mode.as_str() {
                "C" => 0,
                "Q" => 1,
                _ => 2,
            },
        };
        let mut embarked_hot = [0.0f32; 3];
        embarked_hot[embarked_idx] = 1.0;

        let mut features = vec![
            age_std as f32,
            fare_std as f32,
            sibsp as f32,
            parch as f32,
        ];
        features.extend_from_slice(&pclass_hot);
        features.extend_from_slice(&sex_hot);
        features.extend_from_slice(&embarked_hot);

        if self.family_features {
            let family_size = sibsp + parch + 1.0;
            features.push(family_size as f32);
            features.push(if family_size == 1.0 { 1.0 } else { 0.0 });
        }

        debug_assert_eq!(features.len(), self.feature_count());
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survival::csv::parse_csv;
    use approx::assert_relative_eq;

    const TRAIN: &str = "\
PassengerId,Survived,Pclass,Sex,Age,SibSp,Parch,Fare,Embarked
1,0,3,male,22,1,0,7.25,S
2,1,1,female,38,1,0,71.28,C
3,1,3,female,26,0,0,7.92,S
4,1,1,female,35,1,0,53.1,S
5,0,3,male,,0,0,8.05,Q
6,0,3,male,54,0,0,51.86,S";

    fn fitted() -> (Preprocessor, Vec<Row>) {
        let rows = parse_csv(TRAIN).unwrap();
        let pre = Preprocessor::fit(&rows, false);
        (pre, rows)
    }

    #[test]
    fn fit_is_deterministic() {
        let (a, rows) = fitted();
        let b = Preprocessor::fit(&rows, false);
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn median_of_even_count_averages_middles() {
        // Valid ages: 22, 26, 35, 38, 54 -> median 35 (odd count here);
        // fares: 7.25, 7.92, 8.05, 51.86, 53.1, 71.28 -> (8.05+51.86)/2
        let (pre, _) = fitted();
        assert_relative_eq!(pre.stats().age_median, 35.0);
        assert_relative_eq!(pre.stats().fare_median, (8.05 + 51.86) / 2.0);
    }

    #[test]
    fn mode_tie_goes_to_first_value_reaching_the_count() {
        // Q and C both end at 2, but C is the first to reach 2.
        let rows = parse_csv("Embarked\nQ\nC\nC\nQ").unwrap();
        let pre = Preprocessor::fit(&rows, false);
        assert_eq!(pre.stats().embarked_mode, "C");
    }

    #[test]
    fn missing_age_imputes_median_pre_standardization() {
        let (pre, rows) = fitted();
        // Row 5 has no Age: standardized age must be exactly 0.
        let v = pre.transform(&rows[4]).unwrap();
        assert_relative_eq!(v[0], 0.0);
    }

    #[test]
    fn one_hot_blocks_sum_to_one() {
        let (pre, _) = fitted();
        // Unrecognized category values fall back to their defaults.
        let odd = parse_csv(
            "PassengerId,Pclass,Sex,Age,SibSp,Parch,Fare,Embarked\n9,7,robot,40,0,0,10,X",
        )
        .unwrap();
        let v = pre.transform(&odd[0]).unwrap();
        let pclass: f32 = v[4..7].iter().sum();
        let sex: f32 = v[7..9].iter().sum();
        let embarked: f32 = v[9..12].iter().sum();
        assert_relative_eq!(pclass, 1.0);
        assert_relative_eq!(sex, 1.0);
        assert_relative_eq!(embarked, 1.0);
    }

    #[test]
    fn defaults_apply_when_no_valid_values_exist() {
        let rows = parse_csv("PassengerId,Age,Fare,Embarked\n1,,,").unwrap();
        let pre = Preprocessor::fit(&rows, false);
        assert_relative_eq!(pre.stats().age_median, 30.0);
        assert_relative_eq!(pre.stats().fare_median, 32.0);
        assert_eq!(pre.stats().embarked_mode, "S");
    }

    #[test]
    fn family_features_extend_the_vector() {
        let (_, rows) = fitted();
        let pre = Preprocessor::fit(&rows, true);
        let v = pre.transform(&rows[0]).unwrap();
        assert_eq!(v.len(), 14);
        // SibSp=1, Parch=0 -> family of 2, not alone
        assert_relative_eq!(v[12], 2.0);
        assert_relative_eq!(v[13], 0.0);
        assert_eq!(pre.feature_names().len(), 14);
    }
}
