use comfy_table::Cell;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::ui;
use crate::core::ConvertedProduct;
use crate::core::product::truncate_name;

const TABLE_NAME_WIDTH: usize = 50;
const BAR_NAME_WIDTH: usize = 30;
const BAR_CHAR: char = '#';

pub const NOTHING_TO_DISPLAY: &str = "No products to display";

/// Renders the product table, wrapping cells to fit within `width` columns.
pub fn render_table(products: &[ConvertedProduct], width: u16) -> String {
    if products.is_empty() {
        return NOTHING_TO_DISPLAY.to_string();
    }

    let mut table = ui::new_styled_table();
    table.set_width(width);
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Product Name"),
        ui::header_cell("Original Price"),
        ui::header_cell("Converted Price"),
        ui::header_cell("Rating"),
        ui::header_cell("Availability"),
    ]);

    for (i, p) in products.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(truncate_name(&p.product.name, TABLE_NAME_WIDTH)),
            ui::price_cell(p.product.price, p.product.price_currency),
            ui::converted_price_cell(p.converted_price, p.target_currency),
            ui::rating_cell(p.product.rating),
            ui::availability_cell(p.product.in_stock),
        ]);
    }

    table.to_string()
}

/// Number of bar characters for `value` when `max` fills `width`.
fn bar_length(value: Decimal, max: Decimal, width: usize) -> usize {
    if width == 0 || max <= Decimal::ZERO || value <= Decimal::ZERO {
        return 0;
    }
    let scaled = (value / max * Decimal::from(width))
        .round()
        .to_usize()
        .unwrap_or(width);
    scaled.clamp(1, width)
}

/// One line per product with a bar proportional to its converted price.
pub fn render_bars(products: &[ConvertedProduct], width: usize) -> String {
    if products.is_empty() {
        return NOTHING_TO_DISPLAY.to_string();
    }

    let max = products
        .iter()
        .map(|p| p.converted_price)
        .max()
        .unwrap_or(Decimal::ZERO);

    products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let name = truncate_name(&p.product.name, BAR_NAME_WIDTH);
            let bar = BAR_CHAR
                .to_string()
                .repeat(bar_length(p.converted_price, max, width));
            format!(
                "{:>2}. {:<33} {:>12.2} {} {}",
                i + 1,
                name,
                p.converted_price,
                p.target_currency,
                bar
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prints the table and the terminal bar chart.
pub fn display(products: &[ConvertedProduct]) {
    if products.is_empty() {
        println!("{NOTHING_TO_DISPLAY}");
        return;
    }

    println!(
        "\n{}\n",
        ui::style_text("Products with converted prices", ui::StyleType::Title)
    );
    let width = u16::try_from(ui::term_width()).unwrap_or(u16::MAX);
    println!("{}", render_table(products, width));

    ui::print_separator();
    println!(
        "{}\n",
        ui::style_text("Price comparison (terminal view)", ui::StyleType::Title)
    );
    let bar_width = ui::term_width().saturating_sub(60).clamp(10, 60);
    println!("{}", render_bars(products, bar_width));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::{batch, converted};

    #[test]
    fn test_table_lists_every_product() {
        let output = console::strip_ansi_codes(&render_table(&batch(), 200)).to_string();
        assert!(output.contains("Product Name"));
        assert!(output.contains("A Light in the Attic"));
        assert!(output.contains("51.77 GBP"));
        assert!(output.contains("10637.67 KES"));
        assert!(output.contains("Out of stock"));
    }

    #[test]
    fn test_table_truncates_long_names() {
        let long = "The Dirty Little Secrets of Getting Your Dream Job and Keeping It Forever";
        let output = render_table(&[converted(long, "33.34", "6850.80", true)], 200);
        let output = console::strip_ansi_codes(&output).to_string();
        assert!(!output.contains(long));
        assert!(output.contains("..."));
    }

    #[test]
    fn test_bars_are_relative_to_largest_price() {
        let products = vec![
            converted("Cheap", "10.00", "100.00", true),
            converted("Mid", "25.00", "250.00", true),
            converted("Dear", "40.00", "400.00", true),
        ];
        let output = render_bars(&products, 40);
        let bar_lengths: Vec<usize> = output
            .lines()
            .map(|line| line.chars().rev().take_while(|c| *c == BAR_CHAR).count())
            .collect();
        assert_eq!(bar_lengths, vec![10, 25, 40]);
        assert!(output.lines().next().unwrap().starts_with(" 1. Cheap"));
        assert!(output.contains("400.00 KES"));
    }

    #[test]
    fn test_tiny_prices_still_get_a_bar() {
        assert_eq!(bar_length(Decimal::new(1, 2), Decimal::new(100_000, 0), 40), 1);
        assert_eq!(bar_length(Decimal::ZERO, Decimal::new(10, 0), 40), 0);
        assert_eq!(bar_length(Decimal::new(10, 0), Decimal::ZERO, 40), 0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_table(&[], 200), NOTHING_TO_DISPLAY);
        assert_eq!(render_bars(&[], 40), NOTHING_TO_DISPLAY);
    }
}
