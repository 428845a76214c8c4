use crate::data::CountryFeature;
use crate::stats::StatRecord;
use crate::style::{ramp_index, StyleCache};
use std::collections::HashMap;

/// Join fetched statistics onto the boundary features.
///
/// The observed spread comes from a stable ascending sort of the records by
/// total confirmed (ties keep their feed order); first and last give min/max.
/// Each feature is matched by exact country-code equality and, on a match,
/// gets the record plus a style from the shared cache. Unmatched features are
/// left untouched; sparse coverage is expected, not an error.
pub fn enrich(features: &mut [CountryFeature], records: Vec<StatRecord>, cache: &mut StyleCache) {
    let records = sort_by_confirmed(records);
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return;
    };
    let (min, max) = (first.confirmed(), last.confirmed());

    // First record wins on duplicate codes, matching a first-match lookup.
    let mut by_code: HashMap<&str, &StatRecord> = HashMap::with_capacity(records.len());
    for record in &records {
        by_code.entry(record.country_code.as_str()).or_insert(record);
    }

    for feature in features.iter_mut() {
        if feature.iso_a2.is_empty() {
            continue;
        }
        if let Some(&record) = by_code.get(feature.iso_a2.as_str()) {
            let index = ramp_index(record.confirmed(), min, max);
            feature.style = Some(cache.get(index));
            feature.stats = Some(record.clone());
        }
    }
}

/// Stable ascending sort by total confirmed.
fn sort_by_confirmed(mut records: Vec<StatRecord>) -> Vec<StatRecord> {
    records.sort_by_key(StatRecord::confirmed);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::RAMP_STEPS;
    use std::rc::Rc;

    fn record(code: &str, confirmed: u64) -> StatRecord {
        StatRecord {
            country_code: code.to_string(),
            total_confirmed: Some(confirmed),
            total_deaths: Some(confirmed / 10),
            new_confirmed: Some(1),
            new_deaths: Some(0),
            date: Some("2020-04-05T22:45:05Z".to_string()),
        }
    }

    fn square(name: &str, iso: &str) -> CountryFeature {
        CountryFeature::new(name, iso, vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]])
    }

    #[test]
    fn test_scenario_us_fr_de() {
        let mut features = vec![
            square("United States", "US"),
            square("France", "FR"),
            square("Germany", "DE"),
        ];
        let mut cache = StyleCache::new();
        enrich(
            &mut features,
            vec![record("US", 100), record("FR", 10)],
            &mut cache,
        );

        // min=10, max=100: US at the top of the ramp, FR at the bottom.
        let us_style = features[0].style.as_ref().unwrap();
        let fr_style = features[1].style.as_ref().unwrap();
        assert!(Rc::ptr_eq(us_style, &cache.get(RAMP_STEPS - 1)));
        assert!(Rc::ptr_eq(fr_style, &cache.get(0)));

        assert!(features[2].stats.is_none());
        assert!(features[2].style.is_none());
    }

    #[test]
    fn test_unmatched_feature_left_alone() {
        let mut features = vec![square("Atlantis", "AT")];
        let mut cache = StyleCache::new();
        enrich(&mut features, vec![record("US", 100), record("FR", 10)], &mut cache);
        assert!(features[0].stats.is_none());
        assert!(features[0].style.is_none());
    }

    #[test]
    fn test_empty_records_is_noop() {
        let mut features = vec![square("France", "FR")];
        let mut cache = StyleCache::new();
        enrich(&mut features, vec![], &mut cache);
        assert!(features[0].stats.is_none());
        assert_eq!(cache.built(), 0);
    }

    #[test]
    fn test_empty_code_never_matches() {
        let mut features = vec![square("Nameless", "")];
        let mut cache = StyleCache::new();
        // A record with an empty code must not attach to code-less features.
        enrich(&mut features, vec![record("", 50), record("US", 100)], &mut cache);
        assert!(features[0].stats.is_none());
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let sorted = sort_by_confirmed(vec![
            record("AA", 50),
            record("BB", 10),
            record("CC", 50),
        ]);
        let codes: Vec<&str> = sorted.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, ["BB", "AA", "CC"]);
    }

    #[test]
    fn test_all_equal_totals_map_to_middle() {
        let mut features = vec![square("France", "FR"), square("Germany", "DE")];
        let mut cache = StyleCache::new();
        enrich(&mut features, vec![record("FR", 7), record("DE", 7)], &mut cache);
        let expected = cache.get(RAMP_STEPS / 2);
        assert!(Rc::ptr_eq(features[0].style.as_ref().unwrap(), &expected));
        assert!(Rc::ptr_eq(features[1].style.as_ref().unwrap(), &expected));
    }
}
