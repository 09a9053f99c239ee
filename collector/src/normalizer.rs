//! Flattens category-specific traffic records into canonical rows.
//!
//! Each category opens with one header or summary row; an empty record set yields only that row.

use crate::{
    metrics::{
        CanonicalRow,
        Cell,
        RawRecords,
        TrafficSample,
        TrafficSeries,
    },
    row,
};
use chrono::{
    DateTime,
    Duration,
    Utc,
};

const DATE_FORMAT: &str = "%m/%d/%y";

pub fn normalize(records: &RawRecords) -> Vec<CanonicalRow> {
    let category = records.category();
    match records {
        RawRecords::Referrers(referrers) => {
            let mut rows = vec![row![category.to_string()]];
            rows.extend(
                referrers
                    .iter()
                    .map(|r| row!["", r.count, r.uniques, "", r.referrer.as_str()]),
            );
            rows
        }
        RawRecords::Paths(paths) => {
            let mut rows = vec![row![category.to_string()]];
            rows.extend(
                paths
                    .iter()
                    .map(|p| row!["", p.count, p.uniques, "", p.path.as_str()]),
            );
            rows
        }
        RawRecords::Views(views) => {
            let mut rows = vec![row![
                "views: total_count",
                views.daily.count,
                views.daily.uniques
            ]];
            rows.extend(
                views
                    .daily
                    .samples
                    .iter()
                    .map(|sample| row!["", sample.count, "", format_date(sample.timestamp)]),
            );
            if let Some(weekly) = &views.weekly {
                rows.extend(weekly_rows(weekly));
            }
            rows
        }
        RawRecords::Clones(clones) => {
            let mut rows = vec![row!["clones: total_count", clones.count]];
            rows.extend(
                clones
                    .samples
                    .iter()
                    .map(|sample| row!["", sample.count, sample.uniques, format_date(sample.timestamp)]),
            );
            rows
        }
    }
}

/// The single row emitted per repository in simplified mode.
pub fn simplified_row(display_name: &str, clones: &TrafficSeries) -> CanonicalRow {
    row![display_name, clones.count, clones.uniques]
}

pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(DATE_FORMAT).to_string()
}

/// Each week is rendered on its own; neighbouring windows are not checked for gaps or overlap.
fn weekly_rows(weekly: &TrafficSeries) -> impl Iterator<Item = CanonicalRow> + '_ {
    weekly.samples.iter().map(|sample| {
        let (start, end) = week_window(sample);
        CanonicalRow::new(vec![
            Cell::Empty,
            Cell::count(sample.count),
            Cell::Empty,
            Cell::text(format!("{}-{}", format_date(start), format_date(end))),
        ])
    })
}

fn week_window(sample: &TrafficSample) -> (DateTime<Utc>, DateTime<Utc>) {
    (sample.timestamp, sample.timestamp + Duration::days(7))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{
        ContentPath,
        MetricCategory,
        Referrer,
        ViewTraffic,
    };
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    fn sample(day: &str, count: u64, uniques: u64) -> TrafficSample {
        TrafficSample {
            timestamp: format!("{day}T00:00:00Z").parse().unwrap(),
            count,
            uniques,
        }
    }

    #[test]
    fn empty_records_yield_only_the_leading_row() {
        for category in MetricCategory::iter() {
            let rows = normalize(&RawRecords::empty(category));
            assert_eq!(rows.len(), 1, "{category}");
        }
        assert_eq!(
            normalize(&RawRecords::empty(MetricCategory::Paths)),
            vec![row!["paths"]]
        );
    }

    #[test]
    fn daily_views() {
        let views = RawRecords::Views(ViewTraffic {
            daily: TrafficSeries {
                count: 8,
                uniques: 2,
                samples: vec![sample("2021-06-01", 3, 1), sample("2021-06-02", 5, 2)],
            },
            weekly: None,
        });
        assert_eq!(
            normalize(&views),
            vec![
                row!["views: total_count", 8u64, 2u64],
                row!["", 3u64, "", "06/01/21"],
                row!["", 5u64, "", "06/02/21"],
            ]
        );
    }

    #[test]
    fn weekly_views_span_seven_days() {
        let views = RawRecords::Views(ViewTraffic {
            daily: TrafficSeries::default(),
            weekly: Some(TrafficSeries {
                count: 12,
                uniques: 4,
                // Deliberately overlapping windows; each is rendered on its own.
                samples: vec![sample("2021-05-31", 7, 3), sample("2021-06-03", 5, 1)],
            }),
        });
        let rows = normalize(&views);
        assert_eq!(
            rows[1..].to_vec(),
            vec![
                row!["", 7u64, "", "05/31/21-06/07/21"],
                row!["", 5u64, "", "06/03/21-06/10/21"],
            ]
        );

        let (start, end) = week_window(&sample("2021-12-29", 1, 1));
        assert_eq!(end - start, Duration::days(7));
        assert_eq!(format_date(end), "01/05/22");
    }

    #[test]
    fn clones_keep_uniques() {
        let clones = RawRecords::Clones(TrafficSeries {
            count: 4,
            uniques: 3,
            samples: vec![sample("2021-06-01", 4, 3)],
        });
        assert_eq!(
            normalize(&clones),
            vec![row!["clones: total_count", 4u64], row!["", 4u64, 3u64, "06/01/21"]]
        );
    }

    #[test]
    fn referrers_and_paths_name_their_source() {
        let referrers = RawRecords::Referrers(vec![Referrer {
            referrer: "github.com".to_string(),
            count: 10,
            uniques: 4,
        }]);
        assert_eq!(
            normalize(&referrers),
            vec![row!["referrers"], row!["", 10u64, 4u64, "", "github.com"]]
        );

        let paths = RawRecords::Paths(vec![ContentPath {
            path: "/freenas/iocage-plugin-foo".to_string(),
            title: "foo".to_string(),
            count: 2,
            uniques: 1,
        }]);
        assert_eq!(
            normalize(&paths)[1],
            row!["", 2u64, 1u64, "", "/freenas/iocage-plugin-foo"]
        );
    }

    #[test]
    fn simplified_row_carries_clone_totals() {
        let clones = TrafficSeries {
            count: 9,
            uniques: 5,
            samples: Vec::new(),
        };
        assert_eq!(simplified_row("foo", &clones), row!["foo", 9u64, 5u64]);
    }
}
