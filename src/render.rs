use crate::types::{CalculationResult, FabricSize};

const MAX_WIDTH: f64 = 80.0;

/// Whole numbers print bare; anything else gets at most two decimals with
/// trailing zeros removed.
pub fn format_number(value: f64) -> String {
    if value == value.trunc() {
        return format!("{}", value);
    }
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Cut table, most pieces first.
pub fn render_table(result: &CalculationResult) -> String {
    let mut rows = result.cuts.clone();
    rows.sort_by(|a, b| b.pieces.cmp(&a.pieces).then(b.size.total_cmp(&a.size)));

    let mut out = format!("{:>8}  {:>6}  {:>8}\n", "Size", "Pieces", "Total");
    for cut in &rows {
        out.push_str(&format!(
            "{:>8}  {:>6}  {:>8}\n",
            format!("{}m", format_number(cut.size)),
            cut.pieces,
            format!("{}m", format_number(cut.total)),
        ));
    }
    out
}

pub fn render_summary(result: &CalculationResult) -> String {
    let mut out = format!(
        "Total used: {}m\nTotal pieces: {}\nLeftover: {}m\nFabric width: {}cm\n",
        format_number(result.total_used),
        result.total_pieces(),
        format_number(result.leftover),
        result.fabric_width_cm,
    );
    if result.is_perfect() {
        out.push_str("Perfect cut: zero leftover\n");
    }
    out
}

/// Draws the roll as a strip with every piece in cut order and the leftover
/// shaded with dots at the end.
pub fn render_strip(total_length: f64, result: &CalculationResult) -> String {
    if total_length <= 0.0 || !total_length.is_finite() {
        return String::new();
    }
    let scale = MAX_WIDTH / total_length;
    let grid_w = (total_length * scale).round() as usize;

    let mut top = vec!['-'; grid_w + 1];
    let mut middle = vec![' '; grid_w + 1];

    let mut offset = 0.0;
    let mut boundaries = vec![0];
    let mut segments = Vec::new();
    for cut in &result.cuts {
        for _ in 0..cut.pieces {
            let start = (offset * scale).round() as usize;
            offset += cut.size;
            let end = ((offset * scale).round() as usize).min(grid_w);
            boundaries.push(end);
            segments.push((start, end, format_number(cut.size)));
        }
    }
    boundaries.push(grid_w);

    let used_end = boundaries[boundaries.len() - 2];
    for cell in middle.iter_mut().take(grid_w).skip(used_end + 1) {
        *cell = '.';
    }

    for (start, end, label) in &segments {
        let label_chars: Vec<char> = label.chars().collect();
        // Needs a column either side of the label for the borders.
        if end.saturating_sub(*start) > label_chars.len() {
            for (i, &ch) in label_chars.iter().enumerate() {
                middle[start + 1 + i] = ch;
            }
        }
    }

    for &b in &boundaries {
        top[b] = '+';
        middle[b] = '|';
    }

    let top: String = top.into_iter().collect();
    let middle: String = middle.into_iter().collect();
    format!("{top}\n{middle}\n{top}\n")
}

/// Catalogue with demand shares, as shown before calculating.
pub fn render_catalogue(sizes: &[FabricSize], threshold: f64) -> String {
    let mut out = String::new();
    for s in sizes {
        let class = if s.class(threshold).is_priority() {
            "Priority"
        } else {
            "Optional"
        };
        out.push_str(&format!(
            "{:>8}  {:>4}/week  {:>5.1}%  {}\n",
            format!("{}m", format_number(s.size)),
            s.weekly_demand,
            s.probability * 100.0,
            class,
        ));
    }
    out
}
