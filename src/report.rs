//! The statistics report shown for a loaded table: popular travel times, popular stations and
//! trips, trip durations and who the riders are.
//!
//! [TripStats::compute] does all the aggregation up front; [TripStats::output] renders the
//! result either as the banner-and-sentence text screens or as JSON.

use std::str::FromStr;

use crate::aggregate::{duration_summary, most_common, value_counts, value_range, DurationSummary};
use crate::conventions::{month_name, weekday_name};
use crate::error::TripError;
use crate::trip_table::{Column, TripTable, Value};

use serde::Serialize;

/// Width headings are centred in.
pub const SCREEN_WIDTH: usize = 175;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TableFormat {
    Json,
    TextTable,
}

impl FromStr for TableFormat {
    type Err = TripError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let tf = match name.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "text" => Self::TextTable,
            _ => return Err(TripError::Msg("unknown format name.".to_string())),
        };
        Ok(tf)
    }
}

/// A most-common value with a readable label ("Monday" for weekday 0 and so on).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Popular {
    pub value: Value,
    pub label: String,
    pub count: usize,
}

impl Popular {
    fn of(table: &TripTable, column: Column) -> Result<Self, TripError> {
        let (value, count) = most_common(table, column)?;
        let named = match (column, value.as_integer()) {
            (Column::Month, Some(n)) => u32::try_from(n).ok().and_then(month_name),
            (Column::Weekday, Some(n)) => u32::try_from(n).ok().and_then(weekday_name),
            _ => None,
        };
        let label = match named {
            Some(name) => name.to_string(),
            None => value.to_string(),
        };
        Ok(Self {
            value,
            label,
            count,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

fn category_counts(table: &TripTable, column: Column) -> Result<Vec<CategoryCount>, TripError> {
    Ok(value_counts(table, column)?
        .into_iter()
        .map(|(value, count)| CategoryCount {
            label: value.to_string(),
            count,
        })
        .collect())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BirthYears {
    pub earliest: Value,
    pub latest: Value,
    pub most_common: Value,
}

/// Only for cities that publish gender or birth year; each part follows its own column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Demographics {
    pub genders: Vec<CategoryCount>,
    pub birth_years: Option<BirthYears>,
}

impl Demographics {
    fn compute(table: &TripTable) -> Result<Option<Self>, TripError> {
        let schema = table.schema();
        let has_gender = schema.contains(Column::Gender);
        let has_birth_year = schema.contains(Column::BirthYear);
        if !has_gender && !has_birth_year {
            return Ok(None);
        }
        let genders = if has_gender {
            category_counts(table, Column::Gender)?
        } else {
            Vec::new()
        };
        let birth_years = if has_birth_year {
            match value_range(table, Column::BirthYear) {
                Ok((earliest, latest)) => Some(BirthYears {
                    earliest,
                    latest,
                    most_common: most_common(table, Column::BirthYear)?.0,
                }),
                // every birth year blank
                Err(TripError::EmptyTable(_)) => None,
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        Ok(Some(Self {
            genders,
            birth_years,
        }))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TripStats {
    pub rows: usize,
    pub popular_month: Popular,
    pub popular_weekday: Popular,
    pub popular_hour: Popular,
    pub popular_start_station: Popular,
    pub popular_end_station: Popular,
    pub popular_trip: Popular,
    pub duration: DurationSummary,
    pub user_types: Vec<CategoryCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
}

impl TripStats {
    /// Fails with `EmptyTable` when there are no rows to describe.
    pub fn compute(table: &TripTable) -> Result<Self, TripError> {
        Ok(Self {
            rows: table.len(),
            popular_month: Popular::of(table, Column::Month)?,
            popular_weekday: Popular::of(table, Column::Weekday)?,
            popular_hour: Popular::of(table, Column::Hour)?,
            popular_start_station: Popular::of(table, Column::StartStation)?,
            popular_end_station: Popular::of(table, Column::EndStation)?,
            popular_trip: Popular::of(table, Column::Trip)?,
            duration: duration_summary(table)?,
            user_types: category_counts(table, Column::UserType)?,
            demographics: Demographics::compute(table)?,
        })
    }

    pub fn output(&self, format: TableFormat) -> Result<String, TripError> {
        match format {
            TableFormat::Json => self.format_as_json(),
            TableFormat::TextTable => Ok(self.format_as_text()),
        }
    }

    pub fn format_as_json(&self) -> Result<String, TripError> {
        match serde_json::to_string_pretty(&self) {
            Ok(j) => Ok(j),
            Err(e) => Err(TripError::Msg(format!(
                "Cannot serialize result into json: {e}"
            ))),
        }
    }

    pub fn format_as_text(&self) -> String {
        let mut out = Vec::new();
        out.push(heading("POPULAR TIMES OF TRAVEL"));
        out.push(sentence("month of usage is", &self.popular_month.label, self.popular_month.count));
        out.push(sentence("day of usage is", &self.popular_weekday.label, self.popular_weekday.count));
        out.push(sentence(
            "hour of usage is",
            &format!("{}:00 hrs", self.popular_hour.label),
            self.popular_hour.count,
        ));

        out.push(heading("POPULAR STATIONS AND TRIPS"));
        out.push(sentence(
            "start station is",
            &self.popular_start_station.label,
            self.popular_start_station.count,
        ));
        out.push(sentence(
            "end station is",
            &self.popular_end_station.label,
            self.popular_end_station.count,
        ));
        out.push(sentence("trip is", &self.popular_trip.label, self.popular_trip.count));

        out.push(heading("TRIP DURATION"));
        out.push(format!(
            "The total travel time is : {} minutes for a COUNT of {} entries",
            self.duration.total, self.duration.count
        ));
        out.push(format!(
            "The average travel time is : {} minutes",
            self.duration.mean
        ));

        out.push(heading("USER INFORMATION"));
        for user_type in &self.user_types {
            out.push(format!("Number of {}s : {}", user_type.label, user_type.count));
        }
        if let Some(ref demographics) = self.demographics {
            for gender in &demographics.genders {
                out.push(format!(
                    "The number of {} users is : {}",
                    gender.label, gender.count
                ));
            }
            if let Some(ref years) = demographics.birth_years {
                out.push(format!(
                    "\nThe earliest year of birth among the users is : {}",
                    years.earliest
                ));
                out.push(format!(
                    "The most recent year of birth among the users is : {}",
                    years.latest
                ));
                out.push(format!(
                    "The most common year of birth among the users is : {}",
                    years.most_common
                ));
            }
        }
        out.join("\n")
    }
}

fn sentence(what: &str, label: &str, count: usize) -> String {
    format!("The most common {what} : {label} with a COUNT of {count} entries")
}

/// A title centred between two runs of stars, preceded by a blank line.
pub fn heading(title: &str) -> String {
    let stars = str::repeat("*", SCREEN_WIDTH.saturating_sub(title.len()) / 2);
    format!("\n{stars}  {title}  {stars}")
}
