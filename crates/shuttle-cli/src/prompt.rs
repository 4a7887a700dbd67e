//! Interactive model selection on a terminal.
//!
//! Generic over `BufRead`/`Write` so the dialogue can be driven from tests.

use anyhow::Result;
use shuttle_core::registry::ModelDescriptor;
use shuttle_core::selection::{parse_selection, select_by_indices};
use shuttle_core::Action;
use std::io::{BufRead, Write};

/// Print the numbered model list used by both the prompt and `--show`.
pub fn print_model_list<W: Write>(out: &mut W, models: &[ModelDescriptor]) -> Result<()> {
    writeln!(out, "\nModels found:\n")?;
    for (i, model) in models.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, model.display_name)?;
    }
    Ok(())
}

/// Ask whether to act on every model or a chosen subset.
///
/// Returns an empty list when the operator gives an invalid selection or
/// closes the input; the caller treats that as "nothing selected".
pub fn choose_models<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    models: &[ModelDescriptor],
    action: Action,
) -> Result<Vec<ModelDescriptor>> {
    writeln!(out, "\nWhat would you like to do?")?;
    let choice = loop {
        write!(
            out,
            "A) {action} all models\nB) Select models to {action}\n\n>> "
        )?;
        out.flush()?;

        let Some(line) = read_line(input)? else {
            return Ok(Vec::new());
        };
        match line.trim().to_ascii_uppercase().as_str() {
            "A" => break Choice::All,
            "B" => break Choice::Select,
            _ => writeln!(out, "\nInvalid choice. Please try again.")?,
        }
    };

    if choice == Choice::All {
        return Ok(models.to_vec());
    }

    print_model_list(out, models)?;
    writeln!(out, "\nWhich models do you want to {}?", action)?;
    write!(
        out,
        "\nEnter a comma separated list of model numbers to use (e.g., 1,2,3):\n\n>> "
    )?;
    out.flush()?;

    let Some(line) = read_line(input)? else {
        return Ok(Vec::new());
    };
    writeln!(out, "You have chosen {}", line.trim())?;

    match parse_selection(&line, models.len()) {
        Ok(indices) => Ok(select_by_indices(models, &indices)),
        Err(e) => {
            writeln!(out, "\nError: {}", e)?;
            Ok(Vec::new())
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    All,
    Select,
}

/// One line of input, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
