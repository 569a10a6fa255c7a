//! 字符折线图
//!
//! 把一组数值画成带纵轴刻度的多行文本，供 /chart 接口直接展示

use crate::models::ChartPoint;

/// 参与绘图的最近交易日数量
pub const PLOT_WINDOW: usize = 37;
/// 图高（行数）
pub const PLOT_HEIGHT: usize = 10;

/// 用最近 [`PLOT_WINDOW`] 个交易日的收盘价绘图
///
/// 收盘价无法解析为数字的点会被忽略
pub fn plot_chart(points: &[ChartPoint]) -> String {
    let start = points.len().saturating_sub(PLOT_WINDOW);
    let series: Vec<f64> = points[start..]
        .iter()
        .filter_map(|p| p.last.replace(',', "").parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect();
    plot(&series, PLOT_HEIGHT)
}

/// 绘制折线图，空序列返回空字符串
pub fn plot(series: &[f64], height: usize) -> String {
    if series.is_empty() {
        return String::new();
    }

    let rows = height.max(2);
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    // 数值映射到行号，0 为最底行
    let level = |v: f64| -> usize {
        if span == 0.0 {
            0
        } else {
            (((v - min) / span) * (rows - 1) as f64).round() as usize
        }
    };

    let mut grid = vec![vec![' '; series.len()]; rows];
    let mut put = |y: usize, x: usize, c: char| grid[rows - 1 - y][x] = c;

    put(level(series[0]), 0, '─');
    for x in 1..series.len() {
        let from = level(series[x - 1]);
        let to = level(series[x]);
        if from == to {
            put(to, x, '─');
            continue;
        }
        if to > from {
            put(from, x, '╯');
            put(to, x, '╭');
        } else {
            put(from, x, '╮');
            put(to, x, '╰');
        }
        for y in from.min(to) + 1..from.max(to) {
            put(y, x, '│');
        }
    }

    let labels: Vec<String> = (0..rows)
        .map(|r| {
            let value = if span == 0.0 {
                max
            } else {
                max - span * r as f64 / (rows - 1) as f64
            };
            format!("{:.2}", value)
        })
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    labels
        .iter()
        .zip(grid.iter())
        .map(|(label, line)| {
            let line: String = line.iter().collect();
            format!("{:>width$} ┤{}", label, line.trim_end(), width = width)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series() {
        assert_eq!(plot(&[], 10), "");
        assert_eq!(plot_chart(&[]), "");
    }

    #[test]
    fn test_plot_has_height_rows() {
        let series: Vec<f64> = (0..20).map(|i| 100.0 + (i as f64).sin() * 5.0).collect();
        let output = plot(&series, 10);
        assert_eq!(output.lines().count(), 10);
        assert!(output.lines().all(|l| l.contains('┤')));
    }

    #[test]
    fn test_rising_series() {
        let output = plot(&[1.0, 2.0, 3.0], 3);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "3.00 ┤  ╭");
        assert_eq!(lines[1], "2.00 ┤ ╭╯");
        assert_eq!(lines[2], "1.00 ┤─╯");
    }

    #[test]
    fn test_flat_series() {
        let output = plot(&[5.0, 5.0, 5.0], 4);
        assert!(output.lines().last().unwrap().ends_with("───"));
    }

    #[test]
    fn test_plot_chart_uses_recent_window() {
        let points: Vec<ChartPoint> = (0..50)
            .map(|i| ChartPoint {
                last: format!("{}", 100 + i),
                ..Default::default()
            })
            .collect();
        let output = plot_chart(&points);
        // 只取最后 37 个点：113..=149
        assert!(output.starts_with("149.00"));
        assert!(output.lines().last().unwrap().starts_with("113.00"));
    }

    #[test]
    fn test_unparsable_points_skipped() {
        let points = vec![
            ChartPoint { last: "1,000.50".to_string(), ..Default::default() },
            ChartPoint { last: "N/A".to_string(), ..Default::default() },
            ChartPoint { last: "1,001.50".to_string(), ..Default::default() },
        ];
        let output = plot_chart(&points);
        assert!(output.starts_with("1001.50"));
        assert_eq!(output.lines().next().unwrap().chars().filter(|c| !c.is_whitespace()).last(), Some('╭'));
    }
}
