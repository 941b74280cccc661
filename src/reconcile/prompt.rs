//! Asking the user for corrected capture times

use std::io::{self, BufRead, BufReader, Stderr, Stdin, Write};

use chrono::NaiveDateTime;

use crate::error::{Result, TimelapseError};
use crate::photo::{parse_timestamp, TimestampParseError};

/// Source of replacement timestamps for duplicate photos
pub trait TimestampPrompter {
    /// Ask for the capture time of `file_name`.
    ///
    /// Returns `Ok(None)` when the input is exhausted.
    fn ask(&mut self, file_name: &str, recorded: &NaiveDateTime) -> io::Result<Option<String>>;

    /// Report why the last answer for `file_name` was rejected
    fn reject(&mut self, file_name: &str, error: &TimestampParseError) -> io::Result<()>;
}

/// Ask until an answer parses.
///
/// Invalid answers are reported and asked again with no retry limit; only a
/// closed input ends the loop without a value.
pub fn solicit<P: TimestampPrompter + ?Sized>(
    prompter: &mut P,
    file_name: &str,
    recorded: &NaiveDateTime,
) -> Result<NaiveDateTime> {
    loop {
        let Some(answer) = prompter.ask(file_name, recorded)? else {
            return Err(TimelapseError::PromptClosed(file_name.to_string()));
        };
        match parse_timestamp(&answer) {
            Ok(ts) => return Ok(ts),
            Err(e) => prompter.reject(file_name, &e)?,
        }
    }
}

/// Line-oriented prompter over a reader/writer pair
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<BufReader<Stdin>, Stderr> {
    /// Prompt on stderr, read answers from stdin
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer (tests inspect what was printed)
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> TimestampPrompter for TerminalPrompter<R, W> {
    fn ask(&mut self, file_name: &str, recorded: &NaiveDateTime) -> io::Result<Option<String>> {
        writeln!(self.output)?;
        writeln!(
            self.output,
            "📷 \"{file_name}\" shares its timestamp ({recorded}) with another photo."
        )?;
        write!(
            self.output,
            "   When was it taken? (YYYY-MM-DD HH:MM:SS)\n   > "
        )?;
        self.output.flush()?;

        // Undecodable bytes become U+FFFD and fail parsing like any other typo
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    fn reject(&mut self, _file_name: &str, error: &TimestampParseError) -> io::Result<()> {
        writeln!(self.output, "   ⚠️  That time was invalid: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn recorded() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn retries_until_valid() {
        let input = Cursor::new("nonsense\n2024/06/01 10:00:00\n2024-06-01 10:00:00\n");
        let mut prompter = TerminalPrompter::new(input, Vec::new());

        let ts = solicit(&mut prompter, "IMG_1.jpg", &recorded()).unwrap();
        assert_eq!(
            ts,
            NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );

        let printed = String::from_utf8(prompter.into_output()).unwrap();
        assert_eq!(printed.matches("When was it taken?").count(), 3);
        assert_eq!(printed.matches("That time was invalid").count(), 2);
        assert!(printed.contains("IMG_1.jpg"));
    }

    #[test]
    fn undecodable_answer_is_asked_again() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"2024-06-01 10:00:00\n");
        let mut prompter = TerminalPrompter::new(Cursor::new(input), Vec::new());

        let ts = solicit(&mut prompter, "IMG_3.jpg", &recorded()).unwrap();
        assert_eq!(
            ts,
            NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );

        let printed = String::from_utf8(prompter.into_output()).unwrap();
        assert_eq!(printed.matches("When was it taken?").count(), 2);
        assert_eq!(printed.matches("That time was invalid").count(), 1);
    }

    #[test]
    fn closed_input_aborts() {
        let mut prompter = TerminalPrompter::new(Cursor::new("bad\n"), Vec::new());
        let err = solicit(&mut prompter, "IMG_2.jpg", &recorded()).unwrap_err();
        assert!(matches!(err, TimelapseError::PromptClosed(name) if name == "IMG_2.jpg"));
    }
}
