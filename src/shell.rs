//! The question-and-answer session behind `bikeshare explore`.
//!
//! Each round asks for a city and optional month / day filter, prints the statistics report,
//! then offers the raw rows a page at a time. Errors from a round are logged and shown to the
//! user as a single generic line; only failures to read or write the terminal end the
//! session early.

use std::io::{BufRead, Write};

use crate::conventions::{MonthCode, TripFilter, WeekdayCode};
use crate::error::TripError;
use crate::loader::load;
use crate::paginate::batches;
use crate::report::{heading, TripStats};
use crate::sources::CityRegistry;

use tracing::{debug, error};

const ACCEPTED_YESES: [&str; 2] = ["yes", "y"];
const FILTER_KINDS: [&str; 4] = ["month", "day", "both", "none"];

pub const INVALID_INPUT: &str = "Invalid input!";
pub const UNEXPECTED_ERROR: &str = "An unexpected error has occurred during execution.";
pub const FAREWELL: &str = "Thank you for using the US BikeShare Data Interactive Tool!";

enum Round {
    Finished,
    EndOfInput,
}

pub struct Shell<'a, R, W> {
    registry: &'a CityRegistry,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(registry: &'a CityRegistry, input: R, output: W) -> Self {
        Self {
            registry,
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run rounds until the user declines to continue or input runs out.
    pub fn run(&mut self) -> Result<(), TripError> {
        writeln!(self.output, "{}", heading("US BIKESHARE DATA INTERACTIVE TOOL"))?;
        loop {
            match self.round() {
                Ok(Round::Finished) => {}
                Ok(Round::EndOfInput) => break,
                Err(TripError::IoError(e)) => return Err(TripError::IoError(e)),
                Err(e) => {
                    error!(error = %e, "round failed");
                    writeln!(self.output, "{UNEXPECTED_ERROR}")?;
                }
            }
            writeln!(self.output, "\n{}", str::repeat("*", 156))?;
            if !self.confirm("\nDo you want to continue? (y/n) : ")? {
                break;
            }
        }
        writeln!(self.output, "{FAREWELL}")?;
        Ok(())
    }

    /// `None` once input is exhausted.
    fn prompt(&mut self, question: &str) -> Result<Option<String>, TripError> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_lowercase()))
    }

    fn confirm(&mut self, question: &str) -> Result<bool, TripError> {
        Ok(self
            .prompt(question)?
            .map_or(false, |answer| ACCEPTED_YESES.contains(&answer.as_str())))
    }

    fn invalid(&mut self) -> Result<Round, TripError> {
        writeln!(self.output, "\n{INVALID_INPUT}")?;
        Ok(Round::Finished)
    }

    fn round(&mut self) -> Result<Round, TripError> {
        let Some(choice) = self.prompt(
            "\nWhich city data would you like to see ? (Chicago/New York/Washington DC) : ",
        )?
        else {
            return Ok(Round::EndOfInput);
        };
        let Some(city) = self.registry.get_city(&choice).map(|c| c.name.clone()) else {
            return self.invalid();
        };

        let Some(kind) =
            self.prompt("Would you like to put any filters on the data ? (Month/Day/Both/None) : ")?
        else {
            return Ok(Round::EndOfInput);
        };
        if !FILTER_KINDS.contains(&kind.as_str()) {
            return self.invalid();
        }

        let mut filter = TripFilter::none();
        if kind == "month" || kind == "both" {
            let Some(answer) = self.prompt(
                "Which month would you like to filter the data on? (Jan/Feb/Mar/Apr/May/Jun) : ",
            )?
            else {
                return Ok(Round::EndOfInput);
            };
            match MonthCode::from_code(&answer) {
                Some(month) => filter.month = Some(month),
                None => return self.invalid(),
            }
        }
        if kind == "day" || kind == "both" {
            let Some(answer) = self.prompt(
                "Which day would you like to filter the data on? (Sun/Mon/Tue/Wed/Thu/Fri/Sat) : ",
            )?
            else {
                return Ok(Round::EndOfInput);
            };
            match WeekdayCode::from_code(&answer) {
                Some(day) => filter.weekday = Some(day),
                None => return self.invalid(),
            }
        }

        debug!(%city, %filter, "starting round");
        let table = load(self.registry, &city, &filter)?;
        let stats = TripStats::compute(&table)?;
        writeln!(
            self.output,
            "\nBased on your inputs, here are some interesting statistics..."
        )?;
        writeln!(self.output, "{}", stats.format_as_text())?;

        self.show_raw_data(&city)
    }

    // Raw rows come from the whole city file, not the filtered table.
    fn show_raw_data(&mut self, city: &str) -> Result<Round, TripError> {
        let batch_size = self.registry.raw_batch_size;
        let wants_raw =
            self.confirm(&format!("\nDo you want to see {batch_size} rows of raw data ? (y/n) : "))?;
        writeln!(self.output, "\n")?;
        if !wants_raw {
            return Ok(Round::Finished);
        }

        let raw = load(self.registry, city, &TripFilter::none())?;
        let columns = raw.schema().source_columns();
        for batch in batches(&raw, batch_size, &columns)? {
            for row in batch.labelled_rows() {
                for (column, value) in row {
                    writeln!(self.output, "{} : {}", column.name().to_uppercase(), value)?;
                }
                writeln!(self.output, "{}", str::repeat("-", 110))?;
            }
            if !self.confirm(&format!(
                "\nPress 'y' to continue seeing the next {batch_size} rows of data..."
            ))? {
                break;
            }
        }
        Ok(Round::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn registry() -> CityRegistry {
        CityRegistry::new().with_data_root(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data_root"))
    }

    fn session(answers: &str) -> String {
        let registry = registry();
        let mut shell = Shell::new(&registry, Cursor::new(answers.to_string()), Vec::new());
        shell.run().expect("in-memory streams don't fail");
        String::from_utf8(shell.into_output()).expect("utf-8 output")
    }

    #[test]
    fn test_stats_round() {
        let out = session("chicago\nnone\nn\nn\n");
        assert!(out.contains("US BIKESHARE DATA INTERACTIVE TOOL"));
        assert!(out.contains(
            "The most common start station is : Streeter Dr & Grand Ave with a COUNT of 4 entries"
        ));
        assert!(!out.contains("START TIME :"));
        assert!(out.ends_with(&format!("{FAREWELL}\n")));
    }

    #[test]
    fn test_filtered_round() {
        let out = session("Chicago\nboth\njan\nmon\nno\nn\n");
        assert!(out.contains("The most common month of usage is : January with a COUNT of 2 entries"));
        assert!(out.contains("The most common day of usage is : Monday with a COUNT of 2 entries"));
    }

    #[test]
    fn test_raw_data_pages() {
        // washington fits on one page; chicago stops after the first
        let out = session("washington dc\nnone\ny\ny\nn\n");
        assert_eq!(4, out.matches("START TIME :").count());
        assert!(!out.contains("GENDER :"));

        let out = session("chicago\nnone\ny\nn\nn\n");
        assert_eq!(5, out.matches("START TIME :").count());
        assert!(out.contains("BIRTH YEAR : 1985"));
    }

    #[test]
    fn test_invalid_inputs() {
        let out = session("boston\ny\nchicago\nweekly\ny\nchicago\nmonth\njul\nn\n");
        assert_eq!(3, out.matches(INVALID_INPUT).count());
        assert!(!out.contains("Based on your inputs"));
    }

    #[test]
    fn test_errors_are_generic() {
        let registry = CityRegistry::new().with_data_root("/no/such/directory");
        let mut shell = Shell::new(&registry, Cursor::new("chicago\nnone\nn\n"), Vec::new());
        shell.run().expect("source errors are reported, not returned");
        let out = String::from_utf8(shell.into_output()).unwrap();
        assert!(out.contains(UNEXPECTED_ERROR));
        assert!(out.contains(FAREWELL));
    }

    #[test]
    fn test_end_of_input() {
        let out = session("");
        assert!(out.contains(FAREWELL));
        let out = session("chicago\n");
        assert!(out.contains(FAREWELL));
        assert!(!out.contains(INVALID_INPUT));
    }
}
