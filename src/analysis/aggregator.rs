//! Derived statistical views over the passenger records.
//!
//! Every view is a pure function of the record slice. An empty slice yields
//! an empty or zeroed result, never an error.

use crate::models::{Record, Sex};
use serde::Serialize;
use std::collections::BTreeMap;

/// Inclusive age bins in years, in display order.
pub const AGE_BINS: [(u32, u32); 8] = [
    (0, 10),
    (11, 20),
    (21, 30),
    (31, 40),
    (41, 50),
    (51, 60),
    (61, 70),
    (71, 80),
];

/// Survived vs not survived head count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SurvivalSplit {
    pub survived: usize,
    pub not_survived: usize,
}

/// Survival rate of one ticket class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierRate {
    pub tier: i64,
    /// Percentage in `[0, 100]`.
    pub rate: f64,
}

/// Survival rate of one sex category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SexRate {
    pub sex: Sex,
    pub survived: usize,
    pub total: usize,
    /// Percentage; `NaN` when the category has no records.
    pub rate: f64,
}

/// Outcome counts for one age bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeBin {
    pub low: u32,
    pub high: u32,
    pub survived: usize,
    pub died: usize,
}

impl AgeBin {
    /// Display label such as `"11-20"`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.low, self.high)
    }

    pub fn total(&self) -> usize {
        self.survived + self.died
    }
}

/// Body recovery counts among passengers who did not survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecoveryOutcome {
    pub recovered: usize,
    pub not_recovered: usize,
}

/// Count survivors and non-survivors.
pub fn survival_split(records: &[Record]) -> SurvivalSplit {
    let survived = records.iter().filter(|r| r.outcome).count();

    SurvivalSplit {
        survived,
        not_survived: records.len() - survived,
    }
}

/// Survival percentage per ticket class, ascending by class.
///
/// Only classes that occur in the records are listed. Records without a
/// class are skipped.
pub fn survival_rate_by_class_tier(records: &[Record]) -> Vec<TierRate> {
    let mut tiers: BTreeMap<i64, (usize, usize)> = BTreeMap::new();

    for record in records {
        let Some(tier) = record.class_tier else {
            continue;
        };
        let entry = tiers.entry(tier).or_default();
        entry.1 += 1;
        if record.outcome {
            entry.0 += 1;
        }
    }

    tiers
        .into_iter()
        .map(|(tier, (survived, total))| TierRate {
            tier,
            rate: percentage(survived, total),
        })
        .collect()
}

/// Survival percentage for `female` then `male`.
///
/// Both categories are always listed for a non-empty record set, so a chart
/// keeps stable labels. A category with no records reports a `NaN` rate.
pub fn survival_rate_by_sex(records: &[Record]) -> Vec<SexRate> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut counts = [(0usize, 0usize); 2];

    for record in records {
        let Some(sex) = record.sex else {
            continue;
        };
        let slot = &mut counts[sex_index(sex)];
        slot.1 += 1;
        if record.outcome {
            slot.0 += 1;
        }
    }

    Sex::ALL
        .iter()
        .map(|&sex| {
            let (survived, total) = counts[sex_index(sex)];
            SexRate {
                sex,
                survived,
                total,
                rate: percentage(survived, total),
            }
        })
        .collect()
}

/// Survived and died counts per age bin.
///
/// Records with no age, or an age outside `[0, 80]`, are left out. A
/// fractional age falls into the first bin whose upper bound it does not
/// exceed, so `10.5` lands in `11-20`.
pub fn age_binned_outcome(records: &[Record]) -> Vec<AgeBin> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut bins: Vec<AgeBin> = AGE_BINS
        .iter()
        .map(|&(low, high)| AgeBin {
            low,
            high,
            survived: 0,
            died: 0,
        })
        .collect();

    for record in records {
        let Some(index) = record.age.and_then(age_bin_index) else {
            continue;
        };
        if record.outcome {
            bins[index].survived += 1;
        } else {
            bins[index].died += 1;
        }
    }

    bins
}

/// Body recovered vs not recovered, among non-survivors only.
pub fn recovery_outcome(records: &[Record]) -> RecoveryOutcome {
    let mut outcome = RecoveryOutcome::default();

    for record in records.iter().filter(|r| !r.outcome) {
        if record.body_recovered.is_some() {
            outcome.recovered += 1;
        } else {
            outcome.not_recovered += 1;
        }
    }

    outcome
}

/// Index into [`AGE_BINS`] for an age, or `None` when out of range.
pub fn age_bin_index(age: f64) -> Option<usize> {
    if !(0.0..=80.0).contains(&age) {
        return None;
    }
    AGE_BINS.iter().position(|&(_, high)| age <= f64::from(high))
}

fn sex_index(sex: Sex) -> usize {
    match sex {
        Sex::Female => 0,
        Sex::Male => 1,
    }
}

// NaN when `total` is zero.
fn percentage(part: usize, total: usize) -> f64 {
    100.0 * part as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: bool, tier: i64, sex: Sex, age: Option<f64>, body: Option<i64>) -> Record {
        Record {
            outcome,
            class_tier: Some(tier),
            sex: Some(sex),
            age,
            body_recovered: body,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record(true, 1, Sex::Female, Some(29.0), None),
            record(false, 3, Sex::Male, Some(22.0), Some(7)),
            record(false, 3, Sex::Male, None, None),
            record(true, 2, Sex::Female, Some(80.0), None),
            record(false, 1, Sex::Male, Some(81.0), Some(12)),
            record(true, 3, Sex::Male, Some(0.42), None),
        ]
    }

    #[test]
    fn test_two_record_scenario() {
        let records = vec![
            record(true, 1, Sex::Female, Some(29.0), None),
            record(false, 3, Sex::Male, Some(22.0), Some(7)),
        ];

        assert_eq!(
            survival_split(&records),
            SurvivalSplit {
                survived: 1,
                not_survived: 1
            }
        );
        assert_eq!(
            survival_rate_by_class_tier(&records),
            vec![
                TierRate {
                    tier: 1,
                    rate: 100.0
                },
                TierRate { tier: 3, rate: 0.0 },
            ]
        );
    }

    #[test]
    fn test_survival_split_sums_to_len() {
        let records = sample();
        let split = survival_split(&records);
        assert_eq!(split.survived + split.not_survived, records.len());
        assert_eq!(split.survived, 3);
    }

    #[test]
    fn test_empty_records_yield_neutral_views() {
        assert_eq!(survival_split(&[]), SurvivalSplit::default());
        assert!(survival_rate_by_class_tier(&[]).is_empty());
        assert!(survival_rate_by_sex(&[]).is_empty());
        assert!(age_binned_outcome(&[]).is_empty());
        assert_eq!(recovery_outcome(&[]), RecoveryOutcome::default());
    }

    #[test]
    fn test_tiers_sorted_and_present_only() {
        let mut records = sample();
        records.push(record(true, 10, Sex::Female, None, None));

        let tiers: Vec<i64> = survival_rate_by_class_tier(&records)
            .iter()
            .map(|t| t.tier)
            .collect();
        assert_eq!(tiers, vec![1, 2, 3, 10]);
    }

    #[test]
    fn test_tier_rate_values() {
        let rates = survival_rate_by_class_tier(&sample());
        let class3 = rates.iter().find(|t| t.tier == 3).unwrap();
        assert!((class3.rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_records_without_tier_are_skipped() {
        let mut untiered = record(true, 0, Sex::Female, None, None);
        untiered.class_tier = None;

        let rates = survival_rate_by_class_tier(&[untiered]);
        assert!(rates.is_empty());
    }

    #[test]
    fn test_sex_categories_fixed_order() {
        let rates = survival_rate_by_sex(&sample());
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].sex, Sex::Female);
        assert_eq!(rates[1].sex, Sex::Male);
        assert_eq!(rates[0].rate, 100.0);
        assert_eq!(rates[1].rate, 25.0);
    }

    #[test]
    fn test_sex_missing_category_is_nan() {
        let records = vec![record(true, 1, Sex::Male, None, None)];
        let rates = survival_rate_by_sex(&records);

        assert_eq!(rates[0].sex, Sex::Female);
        assert_eq!(rates[0].total, 0);
        assert!(rates[0].rate.is_nan());
        assert_eq!(rates[1].rate, 100.0);
    }

    #[test]
    fn test_age_bin_boundaries() {
        assert_eq!(age_bin_index(0.0), Some(0));
        assert_eq!(age_bin_index(10.0), Some(0));
        assert_eq!(age_bin_index(10.5), Some(1));
        assert_eq!(age_bin_index(11.0), Some(1));
        assert_eq!(age_bin_index(80.0), Some(7));
        assert_eq!(age_bin_index(80.5), None);
        assert_eq!(age_bin_index(-1.0), None);
        assert_eq!(age_bin_index(f64::NAN), None);
    }

    #[test]
    fn test_age_bins_exclude_missing_and_out_of_range() {
        let records = sample();
        let bins = age_binned_outcome(&records);
        assert_eq!(bins.len(), 8);
        assert_eq!(bins[0].label(), "0-10");
        assert_eq!(bins[7].label(), "71-80");

        let binned: usize = bins.iter().map(AgeBin::total).sum();
        // One record has no age, one is 81.
        assert_eq!(binned, records.len() - 2);
        assert_eq!(bins[0].survived, 1);
        assert_eq!(bins[2].survived, 1);
        assert_eq!(bins[2].died, 1);
        assert_eq!(bins[7].survived, 1);
    }

    #[test]
    fn test_age_bins_total_equals_len_when_all_in_range() {
        let records = vec![
            record(true, 1, Sex::Female, Some(5.0), None),
            record(false, 2, Sex::Male, Some(45.0), None),
            record(false, 2, Sex::Male, Some(70.0), None),
        ];
        let binned: usize = age_binned_outcome(&records).iter().map(AgeBin::total).sum();
        assert_eq!(binned, records.len());
    }

    #[test]
    fn test_recovery_only_counts_non_survivors() {
        let outcome = recovery_outcome(&sample());
        assert_eq!(
            outcome,
            RecoveryOutcome {
                recovered: 2,
                not_recovered: 1
            }
        );
    }

    #[test]
    fn test_unusable_body_counts_as_not_recovered() {
        let rows = serde_json::json!([
            { "survived": 0, "body": "n/a" },
            { "survived": 0, "body": "" },
            { "survived": 0, "body": "135" }
        ]);
        let records: Vec<Record> = rows
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|row| row.as_object().and_then(Record::from_row))
            .collect();

        assert_eq!(
            recovery_outcome(&records),
            RecoveryOutcome {
                recovered: 1,
                not_recovered: 2
            }
        );
    }

    #[test]
    fn test_views_are_idempotent() {
        let records = sample();
        assert_eq!(survival_split(&records), survival_split(&records));
        assert_eq!(
            survival_rate_by_class_tier(&records),
            survival_rate_by_class_tier(&records)
        );
        assert_eq!(age_binned_outcome(&records), age_binned_outcome(&records));
        assert_eq!(recovery_outcome(&records), recovery_outcome(&records));

        let first: Vec<u64> = survival_rate_by_sex(&records)
            .iter()
            .map(|r| r.rate.to_bits())
            .collect();
        let second: Vec<u64> = survival_rate_by_sex(&records)
            .iter()
            .map(|r| r.rate.to_bits())
            .collect();
        assert_eq!(first, second);
    }
}
