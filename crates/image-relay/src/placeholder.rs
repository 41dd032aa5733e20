//! Placeholder image rendering
//!
//! Every failed request is answered with a generated SVG describing the
//! failure, so callers always receive a drawable image document instead of
//! an error page or an empty body.

use crate::config::RelayConfig;

/// Column width the reason text is wrapped to.
const WRAP_COLUMNS: usize = 28;
/// Vertical distance between wrapped lines, in SVG user units.
const LINE_HEIGHT: i64 = 22;
const FONT_SIZE: i64 = 15;

/// Render a placeholder SVG for a failure reason.
///
/// Deterministic: geometry and colors come from the configuration, the
/// reason is escaped and word-wrapped, and the resulting block of lines is
/// vertically centered. Any input renders, including the empty string.
pub fn render(config: &RelayConfig, reason: &str) -> String {
    let width = config.placeholder_width;
    let height = config.placeholder_height;
    let center_x = width / 2;

    let lines = wrap(reason, WRAP_COLUMNS);
    let first_baseline = i64::from(height) / 2
        - (lines.len().saturating_sub(1) as i64 * LINE_HEIGHT) / 2
        + FONT_SIZE / 2;

    let mut tspans = String::new();
    for (i, line) in lines.iter().enumerate() {
        let y = first_baseline + i as i64 * LINE_HEIGHT;
        tspans.push_str(&format!(
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            center_x,
            y,
            escape_xml(line)
        ));
    }

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    ));
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="{}"/>"#,
        width, height, config.placeholder_background
    ));
    svg.push_str(&format!(
        r#"<rect x="8" y="8" width="{}" height="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        width.saturating_sub(16),
        height.saturating_sub(16),
        config.placeholder_accent_color
    ));
    svg.push_str(&format!(
        r#"<text text-anchor="middle" font-family="monospace" font-size="{}" fill="{}">{}</text>"#,
        FONT_SIZE, config.placeholder_text_color, tspans
    ));
    svg.push_str("</svg>");
    svg
}

/// Greedy word wrap to at most `columns` characters per line; words longer
/// than a full line are hard-split.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut rest = word;
        while !rest.is_empty() {
            let room = if current.is_empty() {
                columns
            } else {
                columns.saturating_sub(current.chars().count() + 1)
            };

            if rest.chars().count() <= room {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(rest);
                rest = "";
            } else if current.is_empty() {
                let cut = rest
                    .char_indices()
                    .nth(columns)
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                lines.push(rest[..cut].to_string());
                rest = &rest[cut..];
            } else {
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Escape text for embedding in SVG markup.
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_well_formed_svg() {
        let config = RelayConfig::default();
        let svg = render(&config, "Upstream returned status 404");

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"width="480""#));
        assert!(svg.contains(r#"height="360""#));
        assert!(svg.contains("#262629"));
        assert!(svg.contains("#d64545"));
        assert!(svg.contains("404"));
    }

    #[test]
    fn test_render_escapes_markup() {
        let config = RelayConfig::default();
        let svg = render(&config, "bad <script> & \"stuff\"");

        assert!(svg.contains("&lt;script&gt;"));
        assert!(svg.contains("&amp;"));
        assert!(svg.contains("&quot;stuff&quot;"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn test_render_empty_reason() {
        let config = RelayConfig::default();
        let svg = render(&config, "");

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(!svg.contains("<tspan"));
    }

    #[test]
    fn test_render_centers_single_line() {
        let config = RelayConfig::default();
        let svg = render(&config, "hello");

        // 360 high canvas, one line: baseline at 180 + 15/2
        assert!(svg.contains(r#"y="187""#));
        assert!(svg.contains(r#"x="240""#));
    }

    #[test]
    fn test_wrap_basic() {
        assert_eq!(wrap("one two three", 10), vec!["one two", "three"]);
    }

    #[test]
    fn test_wrap_fills_lines_greedily() {
        assert_eq!(
            wrap("Upstream returned status 404", 28),
            vec!["Upstream returned status 404"]
        );
        assert_eq!(
            wrap("Upstream returned status 404", 20),
            vec!["Upstream returned", "status 404"]
        );
    }

    #[test]
    fn test_wrap_hard_splits_long_words() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        assert_eq!(wrap("  a   b  ", 10), vec!["a b"]);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap("", 10).is_empty());
        assert!(wrap("   ", 10).is_empty());
    }
}
