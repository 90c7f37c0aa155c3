//! Walking the inventory grid.

use crate::config::GridLayout;

use super::navigator::WindowGeometry;

/// Position of the next item to select.
///
/// Columns fill left to right, then rows top to bottom. After `rows * columns`
/// items the grid has to be scrolled and the row count starts over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCursor {
    columns: u32,
    rows: u32,
    index: u64,
    row: u32,
    column: u32,
}

impl GridCursor {
    pub fn new(layout: &GridLayout) -> Self {
        Self {
            columns: layout.columns.max(1),
            rows: layout.rows.max(1),
            index: 0,
            row: 0,
            column: 0,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// Screen coordinates of the current cell's centre.
    pub fn position(&self, layout: &GridLayout, window: &WindowGeometry) -> (i32, i32) {
        let w = window.width as f32;
        let h = window.height as f32;
        let x = layout.origin.x * w + self.column as f32 * layout.step_x * w;
        let y = layout.origin.y * h + (self.row % self.rows) as f32 * layout.step_y * h;
        (window.x + x.round() as i32, window.y + y.round() as i32)
    }

    /// Moves to the next cell. Returns true when a full screen of items has
    /// been passed and the grid needs scrolling.
    pub fn advance(&mut self) -> bool {
        self.index += 1;
        self.column += 1;
        if self.column == self.columns {
            self.column = 0;
            self.row += 1;
        }

        let per_screen = u64::from(self.rows) * u64::from(self.columns);
        if self.index % per_screen == 0 {
            self.row = 0;
            true
        } else {
            false
        }
    }
}

/// Scrolls needed to walk `target` items.
pub fn scrolls_for(target: u64, layout: &GridLayout) -> u64 {
    target / (u64::from(layout.rows.max(1)) * u64::from(layout.columns.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelativePoint;

    fn window() -> WindowGeometry {
        WindowGeometry {
            x: 100,
            y: 50,
            width: 1280,
            height: 720,
        }
    }

    #[test]
    fn test_first_cells() {
        let layout = GridLayout::default();
        let mut cursor = GridCursor::new(&layout);
        // 1280 * 21/160 = 168, 720 * 14/90 = 112
        assert_eq!(cursor.position(&layout, &window()), (268, 162));

        cursor.advance();
        // + 1280 * 12.25/160 = 98
        assert_eq!(cursor.position(&layout, &window()), (366, 162));
    }

    #[test]
    fn test_wraps_columns_then_rows() {
        let layout = GridLayout {
            columns: 3,
            rows: 2,
            ..GridLayout::default()
        };
        let mut cursor = GridCursor::new(&layout);
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push((cursor.row(), cursor.column()));
            cursor.advance();
        }
        assert_eq!(
            seen,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (0, 0)]
        );
    }

    #[test]
    fn test_position_formula() {
        let layout = GridLayout {
            columns: 4,
            rows: 3,
            origin: RelativePoint { x: 0.1, y: 0.2 },
            step_x: 0.05,
            step_y: 0.1,
            scroll_steps: 10,
        };
        let window = WindowGeometry {
            x: 0,
            y: 0,
            width: 1000,
            height: 500,
        };
        let mut cursor = GridCursor::new(&layout);
        for i in 0..30u32 {
            let column = i % 4;
            let row = (i / 4) % 3;
            let expected = (
                (100.0f32 + column as f32 * 50.0).round() as i32,
                (100.0f32 + row as f32 * 50.0).round() as i32,
            );
            assert_eq!(cursor.position(&layout, &window), expected, "item {i}");
            cursor.advance();
        }
    }

    #[test]
    fn test_scroll_count_is_floor_of_screens() {
        let layout = GridLayout {
            columns: 7,
            rows: 5,
            ..GridLayout::default()
        };
        for target in [0u64, 1, 34, 35, 36, 69, 70, 71, 500] {
            let mut cursor = GridCursor::new(&layout);
            let scrolls = (0..target).filter(|_| cursor.advance()).count() as u64;
            assert_eq!(scrolls, target / 35, "target {target}");
            assert_eq!(scrolls, scrolls_for(target, &layout));
        }
    }
}
