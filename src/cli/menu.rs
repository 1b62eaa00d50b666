use std::io::{BufRead, Write};

use crate::error::{ProcessingError, Result};
use crate::models::Pollutant;

/// Ask which pollutant to report, repeating the menu until the answer is valid.
pub fn prompt_pollutant<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Pollutant> {
    let mut line = String::new();

    loop {
        writeln!(output, "\nWhich measurement do you want to process:")?;
        for pollutant in Pollutant::ALL {
            writeln!(output, "{}: {}", pollutant.as_choice(), pollutant.short_name())?;
        }
        write!(output, "choice: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(ProcessingError::InvalidPollutant(
                "no choice entered".to_string(),
            ));
        }

        let answer = line.trim();
        match answer.parse::<u8>().ok().map(Pollutant::from_choice) {
            Some(Ok(pollutant)) => return Ok(pollutant),
            _ => writeln!(output, "ERROR: option {} is not valid.", answer)?,
        }
    }
}
