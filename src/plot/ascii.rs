//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid or fixed-width bars),
//! optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Scatter elements:
//! - observed points: `o`
//! - optional trend line: `-`

/// Horizontal bars, one per labelled value, scaled to the largest magnitude.
pub fn render_bars(title: &str, rows: &[(String, f64)], width: usize) -> String {
    let width = width.max(1);
    let label_w = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let peak = rows.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max);

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    for (label, value) in rows {
        let len = if peak > 0.0 {
            ((value.abs() / peak) * width as f64).round() as usize
        } else {
            0
        };
        out.push_str(
            format!("{label:>label_w$} | {} {value:.1}", "#".repeat(len)).trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Equal-width histogram rendered as horizontal bars (one per bin).
pub fn render_histogram(title: &str, values: &[f64], bins: usize, width: usize) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some((lo, hi)) = value_range(&finite) else {
        return format!("{title}\n(no data)\n");
    };
    let bins = bins.max(1);
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - lo) / span) * bins as f64).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    let rows: Vec<(String, f64)> = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let start = lo + span * i as f64 / bins as f64;
            (format!("{start:>10.1}"), c as f64)
        })
        .collect();
    render_bars(title, &rows, width)
}

/// Scatter plot of `(x, y)` points, optionally with a straight trend line
/// `y = intercept + slope * x`.
pub fn render_scatter(
    title: &str,
    points: &[(f64, f64)],
    trend: Option<(f64, f64)>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (x_min, x_max) = value_range(&xs).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = value_range(&ys).unwrap_or((0.0, 1.0));
    let (x_min, x_max) = pad_range(x_min, x_max, 0.0);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Trend first so points can overlay.
    if let Some((intercept, slope)) = trend {
        let x0 = map_x(x_min, x_min, x_max, width);
        let y0 = map_y(intercept + slope * x_min, y_min, y_max, height);
        let x1 = map_x(x_max, x_min, x_max, width);
        let y1 = map_y(intercept + slope * x_max, y_min, y_max, height);
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }

    for &(x, y) in points {
        if x.is_finite() && y.is_finite() {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{title}: x=[{x_min:.1}, {x_max:.1}] | y=[{y_min:.1}, {y_max:.1}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min.is_finite() && max.is_finite() {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_to_peak() {
        let rows = vec![("0".to_string(), 10.0), ("1".to_string(), 5.0)];
        let txt = render_bars("Sales by StateHoliday", &rows, 4);
        let expected = concat!(
            "Sales by StateHoliday\n",
            "0 | #### 10.0\n",
            "1 | ## 5.0\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn histogram_puts_max_in_last_bin() {
        let txt = render_histogram("h", &[0.0, 0.0, 0.5, 2.0], 2, 2);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("## 3.0"), "{}", lines[1]);
        assert!(lines[2].ends_with("# 1.0"), "{}", lines[2]);
        assert_eq!(render_histogram("h", &[], 3, 2), "h\n(no data)\n");
    }

    #[test]
    fn scatter_golden_snapshot_small() {
        let points = [(0.0, 0.0), (9.0, 10.0)];
        let txt = render_scatter("Sales vs Customers", &points, None, 10, 5);
        let expected = concat!(
            "Sales vs Customers: x=[-0.0, 9.0] | y=[-0.5, 10.5]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o         \n",
        );
        assert_eq!(txt, expected);
    }
}
