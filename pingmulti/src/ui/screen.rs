//! Screen rows and diff-based drawing
//!
//! A frame is a list of rows, each row a list of text segments and style
//! markers. `Screen` remembers what it drew last and only redraws the rows
//! that changed, unless the terminal was resized.

use crate::error::{Error, Result};
use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::Write;
use unicode_width::UnicodeWidthChar;

/// Style markers. Each one applies until the next `Normal` or the end of
/// the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ctrl {
    Bold,
    Normal,
    Red,
    White,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Ctrl(Ctrl),
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Segment {
        Segment::Text(text.into())
    }
}

impl From<Ctrl> for Segment {
    fn from(ctrl: Ctrl) -> Segment {
        Segment::Ctrl(ctrl)
    }
}

pub type Row = Vec<Segment>;

/// Replaces every ASCII control character with a space.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_control() { ' ' } else { c })
        .collect()
}

/// Rejects segments that would move the cursor on their own.
pub fn check_row(row: &[Segment], idx: usize) -> Result<()> {
    for (part, segment) in row.iter().enumerate() {
        let Segment::Text(text) = segment else {
            continue;
        };
        if let Some(c) = text.chars().find(|c| matches!(c, '\n' | '\r' | '\t')) {
            return Err(Error::UnsanitizedSegment {
                row: idx,
                part,
                code: c as u32,
                text: text.clone(),
            });
        }
    }
    Ok(())
}

/// Printed width of a row.
pub fn row_width(row: &[Segment]) -> usize {
    row.iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.chars().map(|c| c.width().unwrap_or(0)).sum(),
            Segment::Ctrl(_) => 0,
        })
        .sum()
}

/// Text of a row without its style markers.
pub fn row_text(row: &[Segment]) -> String {
    row.iter()
        .filter_map(|segment| match segment {
            Segment::Text(text) => Some(text.as_str()),
            Segment::Ctrl(_) => None,
        })
        .collect()
}

/// Cuts a row at `width` columns. Everything after the cut, style markers
/// included, is dropped.
pub fn fit_row(row: &[Segment], width: usize) -> Row {
    let mut fitted = Vec::with_capacity(row.len());
    let mut used = 0;
    for segment in row {
        let Segment::Text(text) = segment else {
            fitted.push(segment.clone());
            continue;
        };
        let mut cut = String::with_capacity(text.len());
        let mut overflow = false;
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width {
                overflow = true;
                break;
            }
            used += w;
            cut.push(c);
        }
        fitted.push(Segment::Text(cut));
        if overflow {
            break;
        }
    }
    fitted
}

fn queue_ctrl<W: Write>(out: &mut W, ctrl: Ctrl) -> std::io::Result<()> {
    match ctrl {
        Ctrl::Bold => out.queue(SetAttribute(Attribute::Bold))?,
        Ctrl::Normal => out.queue(SetAttribute(Attribute::Reset))?,
        Ctrl::Red => out.queue(SetForegroundColor(Color::Red))?,
        Ctrl::White => out.queue(SetForegroundColor(Color::White))?,
    };
    Ok(())
}

#[derive(Debug, Default)]
pub struct Screen {
    size: Option<(u16, u16)>,
    /// Rows as drawn in the previous frame.
    drawn: Vec<Option<Row>>,
}

impl Screen {
    pub fn new() -> Screen {
        Screen::default()
    }

    /// Draws a frame of `width` x `height` cells. Rows past `rows.len()` are
    /// blank. Returns the number of rows actually written.
    pub fn draw<W: Write>(
        &mut self,
        out: &mut W,
        rows: &[Row],
        width: u16,
        height: u16,
    ) -> Result<usize> {
        for (idx, row) in rows.iter().enumerate() {
            check_row(row, idx)?;
        }

        if self.size != Some((width, height)) {
            self.size = Some((width, height));
            self.drawn = vec![None; height as usize];
            out.queue(Clear(ClearType::All))?;
        }

        let blank = Row::new();
        let mut changed = 0;
        for y in 0..height {
            let row = rows.get(y as usize).unwrap_or(&blank);
            let fitted = fit_row(row, width as usize);
            let slot = &mut self.drawn[y as usize];
            if slot.as_ref() == Some(&fitted) {
                continue;
            }

            out.queue(MoveTo(0, y))?;
            for segment in &fitted {
                match segment {
                    Segment::Text(text) => {
                        out.queue(Print(text))?;
                    }
                    Segment::Ctrl(ctrl) => queue_ctrl(out, *ctrl)?,
                }
            }
            // A cut row may have left a style on, and a shorter row must not
            // leave the tail of the previous one behind.
            out.queue(SetAttribute(Attribute::Reset))?
                .queue(ResetColor)?
                .queue(Clear(ClearType::UntilNewLine))?;
            *slot = Some(fitted);
            changed += 1;
        }

        if changed > 0 {
            out.flush()?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rows(texts: &[&str]) -> Vec<Row> {
        texts.iter().map(|t| vec![Segment::text(*t)]).collect()
    }

    #[test]
    fn only_changed_rows_are_redrawn() {
        let mut screen = Screen::new();
        let mut out = Vec::new();
        assert_eq!(screen.draw(&mut out, &rows(&["a", "b"]), 20, 4).unwrap(), 4);

        out.clear();
        assert_eq!(screen.draw(&mut out, &rows(&["a", "b"]), 20, 4).unwrap(), 0);
        assert!(out.is_empty());

        assert_eq!(screen.draw(&mut out, &rows(&["a", "c"]), 20, 4).unwrap(), 1);
        let written = String::from_utf8_lossy(&out);
        assert!(written.contains('c'));
        assert!(!written.contains('a'));
    }

    #[test]
    fn resize_redraws_everything() {
        let mut screen = Screen::new();
        let mut out = Vec::new();
        let frame = rows(&["a", "b", "c"]);
        screen.draw(&mut out, &frame, 20, 5).unwrap();
        assert_eq!(screen.draw(&mut out, &frame, 21, 5).unwrap(), 5);
        assert_eq!(screen.draw(&mut out, &frame, 21, 6).unwrap(), 6);
        assert_eq!(screen.draw(&mut out, &frame, 21, 6).unwrap(), 0);
    }

    #[test]
    fn unsanitized_text_is_rejected() {
        let mut screen = Screen::new();
        let frame = vec![vec![Segment::text("ok")], vec![Ctrl::Bold.into(), Segment::text("a\tb")]];
        match screen.draw(&mut Vec::new(), &frame, 20, 5) {
            Err(Error::UnsanitizedSegment { row, part, code, .. }) => {
                assert_eq!((row, part, code), (1, 1, 9));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(sanitize("a\tb\r\n\x1b"), "a b   ");
    }

    #[test]
    fn rows_are_cut_at_the_width() {
        let row = vec![
            Ctrl::Bold.into(),
            Segment::text("abc"),
            Ctrl::Normal.into(),
            Segment::text("defg"),
            Ctrl::Red.into(),
            Segment::text("h"),
        ];
        let fitted = fit_row(&row, 5);
        assert_eq!(
            fitted,
            vec![
                Ctrl::Bold.into(),
                Segment::text("abc"),
                Ctrl::Normal.into(),
                Segment::text("de"),
            ]
        );
        // Wide characters never straddle the edge.
        assert_eq!(fit_row(&[Segment::text("ab日本")], 3), vec![Segment::text("ab")]);
        assert_eq!(fit_row(&row, 100), row);
    }

    proptest! {
        #[test]
        fn prop_fitted_rows_never_exceed_width(
            texts in prop::collection::vec("[a-z日 ]{0,30}", 0..6),
            width in 0usize..50,
        ) {
            let row: Row = texts
                .into_iter()
                .flat_map(|t| [Segment::text(t), Ctrl::Bold.into()])
                .collect();
            let fitted = fit_row(&row, width);
            prop_assert!(row_width(&fitted) <= width);
            if row_width(&row) <= width {
                prop_assert_eq!(fitted, row);
            }
        }
    }
}
