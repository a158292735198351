use anyhow::Result;
use inquire::{Confirm, Text};

use tailor_core::{FormController, MeasurementField};

/// Prompts for a single input, pre-filled with its current value
fn prompt_input(form: &mut FormController, name: &str, label: &str) -> Result<()> {
    let current = form.get(name).unwrap_or("").to_string();
    let value = Text::new(&format!("{}:", label))
        .with_initial_value(&current)
        .prompt()?;
    form.set(name, value);
    Ok(())
}

/// Walks the operator through the measurement form
pub fn prompt_form(form: &mut FormController) -> Result<()> {
    prompt_input(form, "name", "Client Name")?;
    prompt_input(form, "phone", "Phone")?;

    let enter_measurements = Confirm::new("Enter measurements?")
        .with_default(true)
        .prompt()?;
    if enter_measurements {
        println!("Leave a measurement empty if it was not taken");
        for field in MeasurementField::ALL {
            prompt_input(form, field.key(), field.label())?;
        }
    }

    let current = form.get("comments").unwrap_or("").to_string();
    let comments = inquire::Editor::new("Comments:")
        .with_predefined_text(&current)
        .prompt()?;
    form.set("comments", comments.trim_end());

    Ok(())
}

/// Asks for confirmation, defaulting to no
pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}
