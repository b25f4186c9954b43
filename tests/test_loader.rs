//! Loading and filtering integration tests over the fixture files in tests/data_root.
use std::collections::HashSet;
use std::io::Write;

use bikeshare::conventions::{MonthCode, TripFilter, WeekdayCode};
use bikeshare::error::TripError;
use bikeshare::loader::{load, load_path};
use bikeshare::sources::CityRegistry;
use bikeshare::trip_table::{Column, TripTable, Value};

fn registry() -> CityRegistry {
    CityRegistry::new().with_data_root("tests/data_root")
}

fn load_city(city: &str, month: &str, day: &str) -> TripTable {
    load(&registry(), city, &TripFilter::from_codes(month, day))
        .expect("fixture cities should load")
}

/// Rows are identified by their start time and start station, which are unique in the
/// fixtures.
fn row_keys(table: &TripTable) -> Vec<(String, String)> {
    table
        .records()
        .iter()
        .map(|r| {
            (
                r.value(Column::StartTime).to_string(),
                r.trip().start_station.clone(),
            )
        })
        .collect()
}

#[test]
fn test_load_all_chicago() {
    let table = load_city("chicago", "all", "all");
    assert_eq!(10, table.len());
    assert!(table.schema().has_demographics());

    let first = &table.records()[0];
    assert_eq!(1, first.month());
    assert_eq!(0, first.weekday());
    assert_eq!(8, first.hour());
    assert_eq!(
        "Streeter Dr & Grand Ave TO Lake Shore Dr & Monroe St",
        first.route()
    );
}

#[test]
fn test_reference_calendar_computation() {
    let table = load_city("chicago", "all", "all");
    let sunday = table
        .records()
        .iter()
        .find(|r| r.value(Column::StartTime).to_string() == "2017-01-15 00:00:00")
        .expect("fixture has a trip starting 2017-01-15 00:00");
    assert_eq!(1, sunday.month());
    assert_eq!(6, sunday.weekday());
    assert_eq!(0, sunday.hour());
}

#[test]
fn test_month_filter() {
    let table = load_city("chicago", "jan", "all");
    assert_eq!(4, table.len());
    assert!(table.records().iter().all(|r| r.month() == 1));

    let june = load_city("chicago", "jun", "all");
    assert_eq!(2, june.len());
}

#[test]
fn test_day_filter_keeps_order() {
    let table = load_city("chicago", "all", "mon");
    assert_eq!(6, table.len());
    let months = table.records().iter().map(|r| r.month()).collect::<Vec<u32>>();
    assert_eq!(vec![1, 1, 2, 4, 5, 6], months);
}

#[test]
fn test_unrecognized_filters_are_ignored() {
    let all = load_city("chicago", "all", "all");
    assert_eq!(all, load_city("chicago", "july", "someday"));
}

#[test]
fn test_filter_intersection_law() {
    for city in ["chicago", "washington dc", "new york"] {
        for month in MonthCode::ALL_CODES {
            for day in WeekdayCode::ALL_CODES {
                let both = row_keys(&load_city(city, month.code(), day.code()));
                let by_month: HashSet<_> =
                    row_keys(&load_city(city, month.code(), "all")).into_iter().collect();
                let by_day: HashSet<_> =
                    row_keys(&load_city(city, "all", day.code())).into_iter().collect();

                let expected: HashSet<_> = by_month.intersection(&by_day).cloned().collect();
                let actual: HashSet<_> = both.iter().cloned().collect();
                assert_eq!(expected, actual, "{city} {month:?} {day:?}");
                assert_eq!(both.len(), actual.len(), "no duplicated rows");
            }
        }
    }
}

#[test]
fn test_filter_order_does_not_matter() {
    let table = load_city("chicago", "all", "all");
    let filter = TripFilter::new(Some(MonthCode::Jan), Some(WeekdayCode::Mon));
    let month_first = table
        .select(|r| r.month() == 1)
        .select(|r| r.weekday() == 0);
    let day_first = table
        .select(|r| r.weekday() == 0)
        .select(|r| r.month() == 1);
    assert_eq!(month_first, day_first);
    assert_eq!(
        month_first,
        load(&registry(), "chicago", &filter).expect("should load")
    );
    assert_eq!(2, month_first.len());
}

#[test]
fn test_source_without_demographics() {
    let table = load_city("Washington DC", "all", "all");
    assert_eq!(4, table.len());
    assert!(!table.schema().contains(Column::Gender));
    assert!(!table.schema().contains(Column::BirthYear));
    assert_eq!(
        Value::Number(300.5),
        table.records()[1].value(Column::TripDuration)
    );
}

#[test]
fn test_quoted_cells_and_blank_optionals() {
    let table = load_city("nyc", "all", "all");
    assert_eq!(3, table.len());
    let last = &table.records()[2];
    assert_eq!("Broadway & W 60 St", last.trip().start_station);
    assert_eq!(None, last.trip().user_type);
    assert_eq!(None, last.trip().gender);
    assert_eq!(None, last.trip().birth_year);
    assert_eq!(4, last.weekday());
    assert_eq!(23, last.hour());
}

#[test]
fn test_unknown_city() {
    let err = load(&registry(), "springfield", &TripFilter::none()).unwrap_err();
    assert!(matches!(err, TripError::SourceNotFound(_)), "got {err}");
}

#[test]
fn test_missing_file() {
    let err = load_path(
        std::path::Path::new("tests/data_root/nowhere.csv"),
        &TripFilter::none(),
    )
    .unwrap_err();
    assert!(matches!(err, TripError::SourceNotFound(_)), "got {err}");
}

#[test]
fn test_unparsable_start_time_rejects_load() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "Start Time,End Time,Trip Duration,Start Station,End Station,User Type\n\
         2017-01-02 08:10:00,2017-01-02 08:15:00,300,A,B,Subscriber\n\
         someday,2017-01-02 08:15:00,300,A,B,Subscriber"
    )
    .expect("write temp file");

    let err = load_path(file.path(), &TripFilter::none()).unwrap_err();
    assert!(matches!(err, TripError::SourceFormat(ref m) if m.contains("someday")));
}

#[test]
fn test_missing_required_column() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "Start Time,End Time,Trip Duration,Start Station,User Type\n\
         2017-01-02 08:10:00,2017-01-02 08:15:00,300,A,Subscriber"
    )
    .expect("write temp file");

    let err = load_path(file.path(), &TripFilter::none()).unwrap_err();
    assert!(matches!(err, TripError::SourceFormat(ref m) if m.contains("End Station")));
}

#[test]
fn test_gzipped_source() {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("washington.csv.gz");
    let plain = std::fs::read("tests/data_root/washington.csv").expect("fixture");
    let mut encoder = GzEncoder::new(
        std::fs::File::create(&path).expect("create gz"),
        Compression::default(),
    );
    encoder.write_all(&plain).expect("compress");
    encoder.finish().expect("finish gz");

    let table = load_path(&path, &TripFilter::from_codes("mar", "all")).expect("gz loads");
    assert_eq!(3, table.len());
}
