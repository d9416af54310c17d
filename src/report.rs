use std::fmt::Write;

use crate::color::{self, Palette};
use crate::grades;
use crate::models::{ColumnWidths, FormattedLine, RenderRow, SubjectGroup, SubjectSummary};

/// Narrowest average column, wide enough for `D.DDD`.
pub const MIN_AVERAGE_WIDTH: usize = 5;

/// Shown in the average column when a subject has no graded entries.
pub const NO_AVERAGE: &str = "-";

/// Uncoloured render rows, one per subject, in group order.
pub fn build_rows(groups: &[SubjectGroup]) -> Vec<RenderRow> {
    groups
        .iter()
        .map(|group| {
            let (average, mean) = match grades::average(group) {
                Ok(avg) => (grades::format_average(avg), Some(avg)),
                Err(e) => {
                    log::warn!("{e}; leaving the average blank");
                    (NO_AVERAGE.to_string(), None)
                }
            };
            let tokens = group.records.iter().map(|r| (r.content(), r.weight()));
            RenderRow::new(&group.subject, tokens, average, mean)
        })
        .collect()
}

/// Shared widths for every row. Must be measured before colouring.
pub fn column_widths(rows: &[RenderRow]) -> ColumnWidths {
    if rows.is_empty() {
        return ColumnWidths::default();
    }
    ColumnWidths {
        subject: rows.iter().map(|r| r.subject_len).max().unwrap_or(0),
        grades: rows.iter().map(RenderRow::grades_len).max().unwrap_or(0),
        average: rows
            .iter()
            .map(|r| r.average_len)
            .max()
            .unwrap_or(0)
            .max(MIN_AVERAGE_WIDTH),
    }
}

/// Wraps row text in palette colours. Raw lengths are left untouched.
pub struct Annotator<'a> {
    palette: &'a Palette,
}

impl<'a> Annotator<'a> {
    pub fn new(palette: &'a Palette) -> Self {
        Annotator { palette }
    }

    pub fn colorize(&self, mut row: RenderRow) -> RenderRow {
        row.subject = self.palette.subject.paint(&row.subject);

        for cell in row.grades.iter_mut() {
            match self.palette.weight_style(cell.weight) {
                Ok(Some(style)) => cell.text = style.paint(&cell.text),
                Ok(None) => {}
                Err(e) => log::debug!("{e}; `{}` left uncoloured", cell.text),
            }
        }

        if let Some(mean) = row.mean {
            if let Err(e) = color::average_bucket(mean) {
                log::debug!("{e}; clamping to the nearest bucket");
            }
            row.average = self.palette.bucket_style(mean).paint(&row.average);
        }
        row
    }
}

/// Pads each cell out to its column using the pre-colour lengths.
pub fn render_line(row: &RenderRow, widths: ColumnWidths) -> FormattedLine {
    let grades = row
        .grades
        .iter()
        .map(|g| g.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    FormattedLine {
        subject: pad(&row.subject, row.subject_len, widths.subject),
        grades: pad(&grades, row.grades_len(), widths.grades),
        average: pad(&row.average, row.average_len, widths.average),
    }
}

fn pad(text: &str, raw_len: usize, width: usize) -> String {
    format!("{text}{}", " ".repeat(width.saturating_sub(raw_len)))
}

pub fn border(widths: ColumnWidths) -> String {
    format!(
        "+{}+{}+{}+",
        "-".repeat(widths.subject + 2),
        "-".repeat(widths.grades + 2),
        "-".repeat(widths.average + 2)
    )
}

/// Bordered table text: a border, then each row followed by a border.
pub fn assemble(lines: &[FormattedLine], widths: ColumnWidths) -> String {
    let separator = border(widths);
    let mut output = separator.clone();

    for line in lines {
        let _ = write!(
            output,
            "\n| {} | {} | {} |\n{}",
            line.subject, line.grades, line.average, separator
        );
    }
    output
}

pub fn format_lines(
    groups: &[SubjectGroup],
    palette: &Palette,
) -> (ColumnWidths, Vec<FormattedLine>) {
    let rows = build_rows(groups);
    let widths = column_widths(&rows);
    let annotator = Annotator::new(palette);

    let lines = rows
        .into_iter()
        .map(|row| render_line(&annotator.colorize(row), widths))
        .collect();
    (widths, lines)
}

pub fn render_table(groups: &[SubjectGroup], palette: &Palette) -> String {
    let (widths, lines) = format_lines(groups, palette);
    log::debug!("rendering {} rows with widths {:?}", lines.len(), widths);
    assemble(&lines, widths)
}

pub fn build_summary(summaries: &[SubjectSummary]) -> String {
    let mut output = String::new();

    if summaries.is_empty() {
        let _ = writeln!(output, "No grades recorded for this window.");
        return output;
    }

    for summary in summaries {
        let average = summary
            .average
            .map(grades::format_average)
            .unwrap_or_else(|| NO_AVERAGE.to_string());
        let _ = write!(
            output,
            "- {}: average {} across {} grades ({} graded)",
            summary.subject, average, summary.grade_count, summary.graded_count
        );
        if let Some(date) = summary.last_edited {
            let _ = write!(output, ", last change {date}");
        }
        let _ = writeln!(output);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DEFAULT_PALETTE;
    use crate::grades::group;
    use crate::models::GradeRecord;
    use chrono::NaiveDate;
    use console::{measure_text_width, strip_ansi_codes};
    use pretty_assertions::assert_eq;

    fn record(
        subject: &str,
        content: &str,
        weight: i64,
        value: Option<f64>,
        edited: i64,
    ) -> GradeRecord {
        GradeRecord::new(subject, value, content, weight, edited).unwrap()
    }

    fn sample() -> Vec<SubjectGroup> {
        group(&[
            record("Math", "5", 1, Some(5.0), 2),
            record("Math", "4", 2, Some(4.0), 1),
            record("Art", "3", 1, Some(3.0), 3),
        ])
    }

    fn cells(table: &str) -> Vec<Vec<String>> {
        strip_ansi_codes(table)
            .lines()
            .filter(|l| l.starts_with('|'))
            .map(|l| {
                l.trim_matches('|')
                    .split(" | ")
                    .map(|c| c.trim().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn end_to_end_math_and_art() {
        let groups = sample();
        let rows = build_rows(&groups);
        assert_eq!(rows[0].average, "4.333");
        assert_eq!(rows[1].average, "3.0");

        let widths = column_widths(&rows);
        assert_eq!(
            widths,
            ColumnWidths {
                subject: 4,
                grades: 3,
                average: 5
            }
        );

        let table = render_table(&groups, &DEFAULT_PALETTE);
        let expected = "\
+------+-----+-------+
| Math | 5 4 | 4.333 |
+------+-----+-------+
| Art  | 3   | 3.0   |
+------+-----+-------+";
        assert_eq!(strip_ansi_codes(&table), expected);
    }

    #[test]
    fn border_before_first_row_and_after_each() {
        let groups = group(&[
            record("A", "1", 1, Some(1.0), 1),
            record("B", "2", 2, Some(2.0), 1),
            record("C", "3", 3, Some(3.0), 1),
        ]);
        let table = render_table(&groups, &DEFAULT_PALETTE);
        let borders = table.lines().filter(|l| l.starts_with('+')).count();
        let rows = table.lines().filter(|l| l.starts_with('|')).count();
        assert_eq!(borders, 3 + 1);
        assert_eq!(rows, 3);
        assert_eq!(table.lines().count(), 2 * 3 + 1);
        assert!(table.lines().step_by(2).all(|l| l.starts_with('+')));
    }

    #[test]
    fn visible_cells_match_column_widths() {
        let groups = group(&[
            record("Język polski", "5-", 2, Some(4.75), 1),
            record("Język polski", "3+", 3, Some(3.5), 2),
            record("WF", "6", 1, Some(6.0), 1),
            record("Chemia", "1", 3, Some(1.0), 1),
            record("Chemia", "np", 1, None, 2),
            record("Biologia", "+", 4, None, 1),
        ]);
        let (widths, lines) = format_lines(&groups, &DEFAULT_PALETTE);
        for line in &lines {
            assert_eq!(measure_text_width(&line.subject), widths.subject);
            assert_eq!(measure_text_width(&line.grades), widths.grades);
            assert_eq!(measure_text_width(&line.average), widths.average);
        }
    }

    #[test]
    fn widths_are_idempotent() {
        let rows = build_rows(&sample());
        assert_eq!(column_widths(&rows), column_widths(&rows));
        assert_eq!(column_widths(&rows), column_widths(&build_rows(&sample())));
    }

    #[test]
    fn long_average_widens_column() {
        let rows = vec![RenderRow::new("X", [("5", 1)], "10.125".into(), Some(10.125))];
        assert_eq!(column_widths(&rows).average, 6);
    }

    #[test]
    fn empty_input_renders_single_border() {
        let (widths, lines) = format_lines(&[], &DEFAULT_PALETTE);
        assert_eq!(widths, ColumnWidths::default());
        assert!(lines.is_empty());
        assert_eq!(assemble(&lines, widths), "+--+--+--+");
    }

    #[test]
    fn ungraded_subject_gets_placeholder() {
        let groups = group(&[record("Art", "np", 1, None, 1)]);
        let table = render_table(&groups, &DEFAULT_PALETTE);
        assert_eq!(cells(&table), vec![vec!["Art", "np", "-"]]);
    }

    #[test]
    fn colour_spans_are_self_contained() {
        let rows = build_rows(&sample());
        let row = Annotator::new(&DEFAULT_PALETTE).colorize(rows[0].clone());
        assert_eq!(row.subject, "\x1b[38;2;19;255;255mMath\x1b[0m");
        assert_eq!(row.grades[0].text, "5");
        assert_eq!(row.grades[1].text, "\x1b[38;2;0;255;0m4\x1b[0m");
        assert_eq!(row.average, "\x1b[38;2;210;249;80m4.333\x1b[0m");
        assert_eq!(row.grades[1].raw_len, 1);
        assert_eq!(row.average_len, 5);
    }

    #[test]
    fn unknown_weight_stays_plain() {
        let row = RenderRow::new("X", [("5", 7)], "5.0".into(), Some(5.0));
        let row = Annotator::new(&DEFAULT_PALETTE).colorize(row);
        assert_eq!(row.grades[0].text, "5");
    }

    #[test]
    fn averages_clamp_into_outer_buckets() {
        let annotator = Annotator::new(&DEFAULT_PALETTE);
        let low = annotator.colorize(RenderRow::new("X", [], "0.2".into(), Some(0.2)));
        let high = annotator.colorize(RenderRow::new("X", [], "9.9".into(), Some(9.9)));
        assert_eq!(low.average, DEFAULT_PALETTE.buckets[0].paint("0.2"));
        assert_eq!(high.average, DEFAULT_PALETTE.buckets[5].paint("9.9"));
    }

    #[test]
    fn summary_lists_each_subject() {
        let summaries = vec![
            SubjectSummary {
                subject: "Math".to_string(),
                grade_count: 3,
                graded_count: 2,
                average: Some(4.5),
                last_edited: NaiveDate::from_ymd_opt(2024, 3, 9),
            },
            SubjectSummary {
                subject: "Art".to_string(),
                grade_count: 1,
                graded_count: 0,
                average: None,
                last_edited: None,
            },
        ];
        let output = build_summary(&summaries);
        assert_eq!(
            output,
            "- Math: average 4.5 across 3 grades (2 graded), last change 2024-03-09\n\
             - Art: average - across 1 grades (0 graded)\n"
        );
    }

    #[test]
    fn empty_summary_says_so() {
        assert_eq!(build_summary(&[]), "No grades recorded for this window.\n");
    }
}
