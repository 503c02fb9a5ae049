//! Terminal rendering of peak bars

const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Pixel height represented by one text row
const PIXELS_PER_ROW: u32 = 25;

/// Text rows used for a configured drawing height
pub fn rows_for_height(height: u32) -> usize {
    (height / PIXELS_PER_ROW).max(1) as usize
}

/// Draw `peaks` (each in `0.0..=1.0`) as vertical bars, top row first
///
/// Each bar is `bar_width` columns wide followed by `bar_gap` spaces.
/// Trailing whitespace is trimmed from every line.
pub fn render_bars(peaks: &[f32], rows: usize, bar_width: u32, bar_gap: u32) -> String {
    let rows = rows.max(1);
    let bar_width = bar_width.max(1) as usize;
    let gap = " ".repeat(bar_gap as usize);

    let mut lines = Vec::with_capacity(rows);
    for row in (0..rows).rev() {
        let mut line = String::new();
        for peak in peaks {
            let level = peak.clamp(0.0, 1.0) * rows as f32;
            let cell = cell_glyph(level - row as f32);
            for _ in 0..bar_width {
                line.push(cell);
            }
            line.push_str(&gap);
        }
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// Glyph for a cell filled by `fill` (<= 0 empty, >= 1 full)
fn cell_glyph(fill: f32) -> char {
    if fill <= 0.0 {
        ' '
    } else if fill >= 1.0 {
        GLYPHS[GLYPHS.len() - 1]
    } else {
        let index = ((fill * GLYPHS.len() as f32).ceil() as usize).clamp(1, GLYPHS.len()) - 1;
        GLYPHS[index]
    }
}
