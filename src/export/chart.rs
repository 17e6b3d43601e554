use anyhow::anyhow;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, register_font};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};
use tracing::debug;

use super::output_tempfile;
use crate::core::product::truncate_name;
use crate::core::{ConvertedProduct, FileWriteError};

const FONT_FAMILY: &str = "sans-serif";
const CHART_SIZE: (u32, u32) = (1500, 800);
const BAR_WIDTH: f64 = 0.35;
const ORIGINAL_COLOR: RGBColor = RGBColor(135, 206, 235);
const CONVERTED_COLOR: RGBColor = RGBColor(240, 128, 128);

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font files read so far, keyed by path; `None` marks an unreadable file.
static FONT_FILES: LazyLock<Mutex<HashMap<PathBuf, Option<&'static [u8]>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Products beyond this count are left off the chart.
    pub max_products: usize,
    pub font: Option<PathBuf>,
}

/// Reads a font file at most once per process. The bytes live for the rest
/// of the run because the font registry keeps a `'static` reference.
fn font_bytes(path: &Path) -> Option<&'static [u8]> {
    let mut files = FONT_FILES.lock().unwrap_or_else(|e| e.into_inner());
    *files.entry(path.to_path_buf()).or_insert_with(|| {
        std::fs::read(path)
            .ok()
            .map(|bytes| &*Box::leak(bytes.into_boxed_slice()))
    })
}

/// Registers the configured font, or the first usable system font, as the
/// chart family. Returns whether chart text can be drawn.
fn ensure_font(configured: Option<&Path>) -> bool {
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for candidate in candidates {
        let Some(bytes) = font_bytes(&candidate) else {
            continue;
        };
        if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
            debug!(font = %candidate.display(), "Using chart font");
            return true;
        }
    }
    debug!("No usable font found, chart text is disabled");
    false
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn draw_chart(products: &[ConvertedProduct], path: &Path, with_text: bool) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let count = products.len();
    let tallest = products
        .iter()
        .flat_map(|p| [to_f64(p.product.price), to_f64(p.converted_price)])
        .fold(0.0, f64::max);
    let y_max = if tallest > 0.0 { tallest * 1.1 } else { 1.0 };

    let mut builder = ChartBuilder::on(&root);
    builder.margin(20);
    if with_text {
        builder
            .caption(
                "Original vs Converted Prices",
                (FONT_FAMILY, 28).into_font(),
            )
            .x_label_area_size(60)
            .y_label_area_size(90);
    }
    let mut chart = builder.build_cartesian_2d(-0.5f64..(count as f64 - 0.5), 0f64..y_max)?;

    if with_text {
        let names: Vec<String> = products
            .iter()
            .map(|p| truncate_name(&p.product.name, 10))
            .collect();
        let label_for = |x: &f64| {
            let index = x.round();
            if (x - index).abs() > 1e-6 || index < 0.0 {
                return String::new();
            }
            names.get(index as usize).cloned().unwrap_or_default()
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(count)
            .x_label_formatter(&label_for)
            .x_label_style((FONT_FAMILY, 11).into_font())
            .x_desc("Products")
            .y_desc("Price")
            .draw()?;
    }

    let original_currency = products[0].product.price_currency;
    let target_currency = products[0].target_currency;

    let original = chart.draw_series(products.iter().enumerate().map(|(i, p)| {
        let x = i as f64;
        Rectangle::new(
            [(x - BAR_WIDTH, 0.0), (x, to_f64(p.product.price))],
            ORIGINAL_COLOR.filled(),
        )
    }))?;
    if with_text {
        original
            .label(format!("Original ({original_currency})"))
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], ORIGINAL_COLOR.filled()));
    }

    let converted = chart.draw_series(products.iter().enumerate().map(|(i, p)| {
        let x = i as f64;
        Rectangle::new(
            [(x, 0.0), (x + BAR_WIDTH, to_f64(p.converted_price))],
            CONVERTED_COLOR.filled(),
        )
    }))?;
    if with_text {
        converted
            .label(format!("Converted ({target_currency})"))
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], CONVERTED_COLOR.filled()));

        let value_style = (FONT_FAMILY, 11)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(products.iter().enumerate().flat_map(|(i, p)| {
            let x = i as f64;
            [
                (x - BAR_WIDTH / 2.0, to_f64(p.product.price)),
                (x + BAR_WIDTH / 2.0, to_f64(p.converted_price)),
            ]
            .map(|(center, height)| {
                Text::new(format!("{height:.2}"), (center, height), value_style.clone())
            })
        }))?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Renders a grouped bar chart of original and converted prices to `path`.
pub fn write_chart(
    products: &[ConvertedProduct],
    path: &Path,
    options: &ChartOptions,
) -> Result<PathBuf, FileWriteError> {
    if products.is_empty() {
        return Err(FileWriteError::new(path, anyhow!("no products to plot")));
    }
    let shown = &products[..products.len().min(options.max_products.max(1))];
    if shown.len() < products.len() {
        debug!(
            shown = shown.len(),
            total = products.len(),
            "Charting the first products only"
        );
    }

    let with_text = ensure_font(options.font.as_deref());

    // The bitmap encoder picks the image format from the file extension
    let tmp = output_tempfile(path, ".png")?;
    draw_chart(shown, tmp.path(), with_text).map_err(|e| FileWriteError::new(path, e))?;
    tmp.persist(path)
        .map_err(|e| FileWriteError::new(path, e.error))?;

    debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}
