//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - line mode: samples `o` joined by `-`; a missing sample breaks the line
//! - bar mode: `#` columns from the zero baseline to each sample

use crate::domain::{GraphType, Series};

/// Render one series against its labels.
pub fn render_series_chart(
    title: &str,
    unit: &str,
    labels: &[String],
    series: &Series,
    graph_type: GraphType,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let heading = if unit.is_empty() {
        title.to_string()
    } else {
        format!("{title} [{unit}]")
    };

    let Some((lo, hi)) = value_range(series, graph_type) else {
        return format!("{heading} | no data\n");
    };
    let (y_min, y_max) = pad_range(lo, hi, 0.05);

    let n = series.len();
    let mut grid = vec![vec![' '; width]; height];
    match graph_type {
        GraphType::Line => draw_line_chart(&mut grid, series, n, y_min, y_max),
        GraphType::Bar => draw_bar_chart(&mut grid, series, n, y_min, y_max),
    }

    let mut out = String::new();
    out.push_str(&format!("{heading} | y=[{y_min:.2}, {y_max:.2}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&axis_labels(labels, width));
    out.push('\n');
    out
}

fn value_range(series: &Series, graph_type: GraphType) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for v in series.present().filter(|v| v.is_finite()) {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if graph_type == GraphType::Bar {
        min_y = min_y.min(0.0);
        max_y = max_y.max(0.0);
    }
    if max_y <= min_y {
        // Flat series: give it a unit-high band so it lands mid-chart.
        return Some((min_y - 0.5, max_y + 0.5));
    }
    Some((min_y, max_y))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(idx: usize, n: usize, width: usize) -> usize {
    if n < 2 {
        return 0;
    }
    let u = idx as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_line_chart(grid: &mut [Vec<char>], series: &Series, n: usize, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let points: Vec<Option<(usize, usize)>> = (0..n)
        .map(|i| {
            series
                .get(i)
                .filter(|v| v.is_finite())
                .map(|v| (map_x(i, n, width), map_y(v, y_min, y_max, height)))
        })
        .collect();

    for pair in points.windows(2) {
        if let [Some((x0, y0)), Some((x1, y1))] = pair {
            draw_line(grid, *x0, *y0, *x1, *y1, '-');
        }
    }
    for (x, y) in points.into_iter().flatten() {
        grid[y][x] = 'o';
    }
}

fn draw_bar_chart(grid: &mut [Vec<char>], series: &Series, n: usize, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();
    let base = map_y(0.0, y_min, y_max, height);

    for i in 0..n {
        let Some(v) = series.get(i).filter(|v| v.is_finite()) else {
            continue;
        };
        let x = map_x(i, n, width);
        let top = map_y(v, y_min, y_max, height);
        for row in grid.iter_mut().take(top.max(base) + 1).skip(top.min(base)) {
            row[x] = '#';
        }
    }
}

/// First and last label at the chart edges.
fn axis_labels(labels: &[String], width: usize) -> String {
    match labels {
        [] => String::new(),
        [only] => only.clone(),
        [first, .., last] => {
            let used = first.chars().count() + last.chars().count();
            let gap = width.saturating_sub(used).max(1);
            format!("{first}{}{last}", " ".repeat(gap))
        }
    }
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
