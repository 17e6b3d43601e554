use anyhow::Result;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;

use crate::core::{Currency, UnknownCurrencyError};

/// Parses a product count typed by the user; only positive integers pass.
pub fn parse_count(input: &str) -> Result<usize, String> {
    match input.trim().parse::<usize>() {
        Ok(0) => Err("count must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a positive integer", input.trim())),
    }
}

pub fn parse_currency(input: &str) -> Result<Currency, UnknownCurrencyError> {
    input.parse()
}

pub fn prompt_currency(default: Currency) -> Result<Currency> {
    let theme = ColorfulTheme::default();
    let answer: String = Input::with_theme(&theme)
        .with_prompt(format!(
            "Target currency ({})",
            Currency::supported_codes()
        ))
        .default(default.to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            parse_currency(input).map(|_| ()).map_err(|e| {
                format!("{e}; choose one of {}", Currency::supported_codes())
            })
        })
        .interact_text()?;
    Ok(parse_currency(&answer)?)
}

pub fn prompt_count(default: usize) -> Result<usize> {
    let theme = ColorfulTheme::default();
    let answer: String = Input::with_theme(&theme)
        .with_prompt("Number of products to scrape")
        .default(default.to_string())
        .validate_with(|input: &String| -> Result<(), String> { parse_count(input).map(|_| ()) })
        .interact_text()?;
    parse_count(&answer).map_err(anyhow::Error::msg)
}
