//! # bikeshare: trip statistics for US bike-share systems
//!
//! ## Loading and describing trips
//!
//! Trip records for a city are loaded into a [TripTable](trip_table::TripTable) by the
//! [loader]. A [CityRegistry](sources::CityRegistry) resolves city names to files, and a
//! [TripFilter](conventions::TripFilter) optionally restricts the rows to one month and/or
//! weekday. Each row gets derived `Month`, `Weekday`, `Hour` and `Trip` fields when it is
//! loaded.
//!
//! Once you have a table, [aggregate::most_common] finds the most frequent value of any
//! column, [report::TripStats] computes the whole statistics report, and [paginate::batches]
//! pages through the raw rows.
//!
//! ```
//! use bikeshare::aggregate::most_common;
//! use bikeshare::conventions::TripFilter;
//! use bikeshare::loader;
//! use bikeshare::sources::CityRegistry;
//! use bikeshare::trip_table::Column;
//!
//! // Set the data root to point to the directory with your city files
//! let registry = CityRegistry::new().with_data_root("tests/data_root");
//! let filter = TripFilter::from_codes("jan", "all");
//! let table = loader::load(&registry, "chicago", &filter).unwrap();
//!
//! let (station, count) = most_common(&table, Column::StartStation).unwrap();
//! println!("{station} was the start of {count} trips");
//! ```

pub mod aggregate;
pub mod conventions;
pub mod error;
pub mod loader;
pub mod paginate;
pub mod report;
pub mod shell;
pub mod sources;
pub mod trip_table;
