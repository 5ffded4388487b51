//! Interactive place picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker resolves an ambiguous `--place` by asking the user

use std::io::{self, BufRead, Write};

use crate::data::Place;
use crate::error::AppError;

/// Prompt on stdin/stdout for one of `places`.
///
/// Behavior:
/// - a single candidate is returned without prompting
/// - accept a number from the list
/// - `q` cancels
pub fn prompt_for_place(places: &[Place]) -> Result<&Place, AppError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    choose_place(places, &mut stdin.lock(), &mut stdout.lock())
}

/// Same as [`prompt_for_place`] over arbitrary streams.
pub fn choose_place<'a, R: BufRead, W: Write>(
    places: &'a [Place],
    input: &mut R,
    output: &mut W,
) -> Result<&'a Place, AppError> {
    match places {
        [] => return Err(AppError::new(3, "No places matched the query.")),
        [only] => return Ok(only),
        _ => {}
    }

    let write_err = |e: io::Error| AppError::new(2, format!("Failed to write prompt: {e}"));

    writeln!(output, "Found {} place(s):", places.len()).map_err(write_err)?;
    write!(output, "{}", crate::report::format_places(places)).map_err(write_err)?;

    loop {
        write!(output, "Select a place by number (1-{}) (q to quit): ", places.len()).map_err(write_err)?;
        output.flush().map_err(write_err)?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(
                2,
                "No input received. Pass `--first` to take the top match, or use --lat/--lon.",
            ));
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        match line.parse::<usize>() {
            Ok(choice) if (1..=places.len()).contains(&choice) => return Ok(&places[choice - 1]),
            _ => {
                writeln!(output, "Invalid choice: {line}. Enter a number between 1 and {}.", places.len())
                    .map_err(write_err)?;
            }
        }
    }
}
