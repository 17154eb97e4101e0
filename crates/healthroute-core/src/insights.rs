//! Dashboard insights derived from stored observations.

use std::collections::HashMap;

use crate::models::{NutrientObservation, NutrientStatus};

/// Score shown before any lab values exist.
pub const DEFAULT_SCORE: u32 = 92;

/// Card title for a status.
pub fn status_title(status: NutrientStatus) -> &'static str {
    match status {
        NutrientStatus::Normal => "Optimization",
        NutrientStatus::Deficient => "Deficiency Alert",
        NutrientStatus::Excess => "Excess Alert",
        NutrientStatus::Unknown => "Analysis",
    }
}

/// Guidance sentence for one observation.
pub fn status_message(observation: &NutrientObservation) -> String {
    let subject = format!(
        "Your {} levels ({} {})",
        observation.nutrient, observation.value, observation.unit
    );
    match observation.status {
        NutrientStatus::Normal => format!(
            "{} are within the normal range. Continue with your current diet and supplementation.",
            subject
        ),
        NutrientStatus::Deficient => format!(
            "{} are below the recommended range. Consider increasing intake through diet or supplements.",
            subject
        ),
        NutrientStatus::Excess => format!(
            "{} are above the recommended range. Consider reducing intake to maintain optimal health.",
            subject
        ),
        NutrientStatus::Unknown => format!("Your {} levels are being monitored.", observation.nutrient),
    }
}

/// Percentage of observations in the normal range, rounded.
pub fn nutrient_score(observations: &[NutrientObservation]) -> u32 {
    if observations.is_empty() {
        return DEFAULT_SCORE;
    }
    let normal = observations
        .iter()
        .filter(|o| o.status == NutrientStatus::Normal)
        .count();
    ((normal as f64 / observations.len() as f64) * 100.0).round() as u32
}

/// Whether the newest observation is normal where the one before was not:
/// "+1", "+0" or "-1".
///
/// "+0%" when there are fewer than two observations.
pub fn score_trend(observations: &[NutrientObservation]) -> String {
    let mut by_date: Vec<&NutrientObservation> = observations.iter().collect();
    by_date.sort_by_key(|o| o.measured_at);

    match by_date.as_slice() {
        [.., previous, latest] => {
            let is_normal = |o: &NutrientObservation| (o.status == NutrientStatus::Normal) as i32;
            format!("{:+}", is_normal(*latest) - is_normal(*previous))
        }
        _ => "+0%".to_string(),
    }
}

/// Newest observation per nutrient, ordered by nutrient name.
pub fn latest_by_nutrient(observations: &[NutrientObservation]) -> Vec<&NutrientObservation> {
    let mut latest: HashMap<&str, &NutrientObservation> = HashMap::new();
    for obs in observations {
        latest
            .entry(obs.nutrient.as_str())
            .and_modify(|current| {
                if obs.measured_at > current.measured_at {
                    *current = obs;
                }
            })
            .or_insert(obs);
    }

    let mut result: Vec<&NutrientObservation> = latest.into_values().collect();
    result.sort_by(|a, b| a.nutrient.cmp(&b.nutrient));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn obs(nutrient: &str, value: f64, status: NutrientStatus, days_ago: i64) -> NutrientObservation {
        NutrientObservation::new(
            "user-1".into(),
            nutrient.into(),
            value,
            "mg/dL".into(),
            status,
            Utc::now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn test_titles() {
        assert_eq!(status_title(NutrientStatus::Normal), "Optimization");
        assert_eq!(status_title(NutrientStatus::Deficient), "Deficiency Alert");
        assert_eq!(status_title(NutrientStatus::Excess), "Excess Alert");
        assert_eq!(status_title(NutrientStatus::Unknown), "Analysis");
    }

    #[test]
    fn test_messages() {
        let low = obs("Calcium", 7.9, NutrientStatus::Deficient, 0);
        assert_eq!(
            status_message(&low),
            "Your Calcium levels (7.9 mg/dL) are below the recommended range. Consider increasing intake through diet or supplements."
        );
        let unknown = obs("Selenium", 120.0, NutrientStatus::Unknown, 0);
        assert_eq!(status_message(&unknown), "Your Selenium levels are being monitored.");
    }

    #[test]
    fn test_score() {
        assert_eq!(nutrient_score(&[]), DEFAULT_SCORE);
        let observations = vec![
            obs("Calcium", 9.0, NutrientStatus::Normal, 0),
            obs("Zinc", 50.0, NutrientStatus::Deficient, 0),
            obs("Iron (Serum)", 100.0, NutrientStatus::Normal, 0),
        ];
        assert_eq!(nutrient_score(&observations), 67);
    }

    #[test]
    fn test_trend() {
        assert_eq!(score_trend(&[]), "+0%");
        assert_eq!(score_trend(&[obs("Calcium", 9.0, NutrientStatus::Normal, 0)]), "+0%");

        let improving = vec![
            obs("Calcium", 9.8, NutrientStatus::Normal, 0),
            obs("Iron (Serum)", 40.0, NutrientStatus::Deficient, 2),
        ];
        assert_eq!(score_trend(&improving), "+1");

        let steady = vec![
            obs("Calcium", 9.0, NutrientStatus::Normal, 5),
            obs("Calcium", 11.0, NutrientStatus::Normal, 0),
        ];
        assert_eq!(score_trend(&steady), "+0");

        let worsening = vec![
            obs("Zinc", 80.0, NutrientStatus::Normal, 9),
            obs("Calcium", 9.0, NutrientStatus::Normal, 5),
            obs("Calcium", 11.2, NutrientStatus::Excess, 0),
        ];
        assert_eq!(score_trend(&worsening), "-1");
    }

    #[test]
    fn test_latest_by_nutrient() {
        let observations = vec![
            obs("Zinc", 70.0, NutrientStatus::Normal, 10),
            obs("Zinc", 80.0, NutrientStatus::Normal, 1),
            obs("Calcium", 9.0, NutrientStatus::Normal, 3),
        ];
        let latest = latest_by_nutrient(&observations);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].nutrient, "Calcium");
        assert_eq!(latest[1].value, 80.0);
    }
}
