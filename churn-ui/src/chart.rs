//! SVG rendering of a column distribution using Plotters
//!
//! Numeric columns: bars per bin with the KDE curve on top. Categorical
//! columns: one bar per label, centred on integer positions.

use churn_common::histogram::{Bin, CategoryCount, Distribution, KdePoint};
use plotters::prelude::*;

const CHART_SIZE: (u32, u32) = (960, 480);

/// Bar colour, matches the page accent
const BAR_COLOR: RGBColor = RGBColor(76, 175, 80);
const KDE_COLOR: RGBColor = RGBColor(27, 94, 32);

/// Most category labels printed under the axis
const MAX_CATEGORY_LABELS: usize = 30;

/// Render `dist` of `column` as a standalone SVG document
pub fn render_distribution_svg(column: &str, dist: &Distribution) -> anyhow::Result<String> {
    let mut svg = String::new();

    match dist {
        _ if dist.is_empty() => draw_empty(&mut svg, column)?,
        Distribution::Numeric { bins, kde, .. } => draw_numeric(&mut svg, column, bins, kde)?,
        Distribution::Categorical { counts, .. } => draw_categorical(&mut svg, column, counts)?,
    }

    Ok(svg)
}

fn draw_numeric(svg: &mut String, column: &str, bins: &[Bin], kde: &[KdePoint]) -> anyhow::Result<()> {
    let root = SVGBackend::with_string(svg, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_min = bins.first().map(|b| b.start).unwrap_or(0.0);
    let x_max = bins.last().map(|b| b.end).unwrap_or(1.0);
    let tallest_bar = bins.iter().map(|b| b.count as f64).fold(0.0, f64::max);
    let tallest_curve = kde.iter().map(|p| p.y).fold(0.0, f64::max);
    let y_max = (tallest_bar.max(tallest_curve) * 1.1).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Distribution of {}", column), ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("Count")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BAR_COLOR.mix(0.55).filled())
    }))?;
    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BAR_COLOR.stroke_width(1))
    }))?;

    if !kde.is_empty() {
        chart.draw_series(LineSeries::new(
            kde.iter().map(|p| (p.x, p.y)),
            KDE_COLOR.stroke_width(2),
        ))?;
    }

    root.present()?;
    Ok(())
}

fn draw_categorical(svg: &mut String, column: &str, counts: &[CategoryCount]) -> anyhow::Result<()> {
    let root = SVGBackend::with_string(svg, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let k = counts.len();
    let tallest = counts.iter().map(|c| c.count).max().unwrap_or(0) as f64;
    let y_max = (tallest * 1.1).max(1.0);
    let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
    let label_for = |x: &f64| category_label(&labels, *x);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Distribution of {}", column), ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(k as f64 - 0.5), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(k.min(MAX_CATEGORY_LABELS))
        .x_label_formatter(&label_for)
        .x_desc(column)
        .y_desc("Count")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, c)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, c.count as f64)], BAR_COLOR.mix(0.55).filled())
    }))?;

    root.present()?;
    Ok(())
}

fn draw_empty(svg: &mut String, column: &str) -> anyhow::Result<()> {
    let root = SVGBackend::with_string(svg, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("No values to plot for {}", column), ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;
    chart.configure_mesh().x_desc(column).y_desc("Count").draw()?;

    root.present()?;
    Ok(())
}

/// Label for an axis position: the category at integer `x`, blank elsewhere
fn category_label(labels: &[&str], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    labels
        .get(nearest as usize)
        .map(|label| label.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_common::dataset::ColumnValues;

    #[test]
    fn test_numeric_chart_is_svg() {
        let values: Vec<f64> = (0..40).map(|i| (i % 13) as f64 * 1.5).collect();
        let dist = Distribution::from_values(&ColumnValues::Numeric(values));
        let svg = render_distribution_svg("tenure", &dist).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Distribution of tenure"));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn test_categorical_chart_is_svg() {
        let values = ["Yes", "No", "No"].iter().map(|s| s.to_string()).collect();
        let dist = Distribution::from_values(&ColumnValues::Categorical(values));
        let svg = render_distribution_svg("Churn", &dist).unwrap();
        assert!(svg.contains("Distribution of Churn"));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn test_empty_column_chart() {
        let dist = Distribution::from_values(&ColumnValues::Numeric(Vec::new()));
        let svg = render_distribution_svg("x", &dist).unwrap();
        assert!(svg.contains("No values to plot for x"));
    }

    #[test]
    fn test_category_label_only_at_integers() {
        let labels = ["a", "b"];
        assert_eq!(category_label(&labels, 0.0), "a");
        assert_eq!(category_label(&labels, 1.0), "b");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }
}
