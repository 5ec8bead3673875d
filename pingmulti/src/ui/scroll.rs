//! Scroll controller
//!
//! Keeps the window of visible items, the selected item and the tail mode of
//! one view. Item count and page size are refreshed every frame; all other
//! state only changes in response to a key.
//!
//! Invariant, whenever the window is not empty:
//! `min <= max < item_count` and `max - min + 1 <= page_size`.

use std::ops::Range;

#[derive(Debug, Clone)]
pub struct Scroller {
    /// Whether this view may stick to its newest items.
    follows_tail: bool,
    initialized: bool,
    tail_mode: bool,
    min: usize,
    /// Last visible item; `None` when there is nothing to show.
    max: Option<usize>,
    selected: Option<usize>,
    item_count: usize,
    page_size: usize,
    scroll_by: usize,
}

/// Rounds `value` up to a multiple of `step`.
fn align_up(value: usize, step: usize) -> usize {
    value.div_ceil(step) * step
}

impl Scroller {
    pub fn new(follows_tail: bool) -> Scroller {
        Scroller {
            follows_tail,
            initialized: false,
            tail_mode: follows_tail,
            min: 0,
            max: None,
            selected: None,
            item_count: 0,
            page_size: 0,
            scroll_by: 1,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn tail_mode(&self) -> bool {
        self.tail_mode
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Visible items.
    pub fn window(&self) -> Range<usize> {
        match self.max {
            Some(max) => self.min..max + 1,
            None => 0..0,
        }
    }

    pub fn set_item_count(&mut self, count: usize) {
        self.item_count = count;
    }

    /// Sets the number of rows available to items. Paging moves by half of
    /// that.
    pub fn set_page_size(&mut self, rows: usize) {
        self.page_size = rows;
        self.scroll_by = (rows / 2).max(1);
    }

    /// Recomputes the last visible item from the first one.
    pub fn update_max(&mut self) {
        if self.item_count == 0 {
            self.min = 0;
            self.max = None;
            self.selected = None;
            return;
        }
        let last = self.item_count - 1;
        self.min = self.min.min(last);
        if self.selected.is_some_and(|sel| sel > last) {
            self.selected = None;
        }
        self.max = match self.page_size {
            0 => None,
            page => Some((self.min + page - 1).min(last)),
        };
    }

    /// Back to the first page, without selection.
    pub fn reset(&mut self) {
        self.initialized = true;
        self.tail_mode = self.follows_tail;
        self.min = 0;
        self.selected = None;
        self.update_max();
    }

    /// Selects the next visible item, wrapping to the first one.
    pub fn down(&mut self) {
        let Some(max) = self.max else {
            return;
        };
        self.tail_mode = false;
        self.selected = match self.selected {
            Some(sel) if sel >= self.min && sel < max => Some(sel + 1),
            _ => Some(self.min),
        };
    }

    /// Selects the previous visible item, wrapping to the last one.
    pub fn up(&mut self) {
        let Some(max) = self.max else {
            return;
        };
        self.tail_mode = false;
        self.selected = match self.selected {
            Some(sel) if sel > self.min && sel <= max => Some(sel - 1),
            _ => Some(max),
        };
    }

    pub fn page_up(&mut self) {
        self.tail_mode = false;
        if self.min > 0 {
            self.min = align_up(self.min.saturating_sub(self.scroll_by), self.scroll_by);
            self.update_max();
            self.selected = None;
        }
    }

    pub fn page_down(&mut self) {
        self.tail_mode = false;
        let (Some(max), Some(last)) = (self.max, self.item_count.checked_sub(1)) else {
            return;
        };
        if max < last {
            self.min += self.scroll_by;
            self.update_max();
            self.selected = None;
        }
        if self.max == Some(last) && self.follows_tail {
            self.tail_mode = true;
        }
    }

    pub fn home(&mut self) {
        self.reset();
        self.tail_mode = false;
    }

    /// Shows the last page, aligned like paging does.
    pub fn end(&mut self) {
        if self.follows_tail {
            self.tail_mode = true;
        }
        let first = self.item_count.saturating_sub(self.page_size);
        self.min = align_up(first, self.scroll_by);
        self.update_max();
        self.selected = None;
    }

    /// Returns the selected item, which leaves tail mode.
    pub fn enter(&mut self) -> Option<usize> {
        let selected = self.selected?;
        self.tail_mode = false;
        Some(selected)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// In tail mode, moves the window onto the newest items. Called once per
    /// frame, before drawing.
    pub fn tail(&mut self) {
        if !self.tail_mode {
            return;
        }
        self.min = self.item_count.saturating_sub(self.page_size);
        self.update_max();
        self.selected = None;
    }
}
