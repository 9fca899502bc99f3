//! The nesting box model.
//!
//! A [`LayoutBox`] is computed for every block element from its settings and
//! its parent's box.  Width is fixed at the document level; left and right
//! margins, padding, borders and line templates accumulate on the way down.

use crate::render::text::{template_width, visible_width};

/// Four values in CSS order: top, right, bottom, left.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sides<T> {
    /// Top side.
    pub top: T,
    /// Right side.
    pub right: T,
    /// Bottom side.
    pub bottom: T,
    /// Left side.
    pub left: T,
}

impl<T> Sides<T> {
    /// Create from the four sides, in CSS order.
    pub fn new(top: T, right: T, bottom: T, left: T) -> Sides<T> {
        Sides {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Apply `f` to each side.
    pub fn map<U, F: Fn(&T) -> U>(&self, f: F) -> Sides<U> {
        Sides {
            top: f(&self.top),
            right: f(&self.right),
            bottom: f(&self.bottom),
            left: f(&self.left),
        }
    }
}

impl<T: Clone> Sides<T> {
    /// The same value on every side.
    pub fn all(value: T) -> Sides<T> {
        Sides::new(value.clone(), value.clone(), value.clone(), value)
    }
}

impl<T> From<[T; 4]> for Sides<T> {
    fn from(sides: [T; 4]) -> Sides<T> {
        let [top, right, bottom, left] = sides;
        Sides::new(top, right, bottom, left)
    }
}

impl From<[&str; 4]> for Sides<String> {
    fn from(sides: [&str; 4]) -> Sides<String> {
        let [top, right, bottom, left] = sides;
        Sides::new(top.into(), right.into(), bottom.into(), left.into())
    }
}

impl Sides<String> {
    /// The width in columns taken by each border string.
    pub fn widths(&self) -> Sides<usize> {
        self.map(|s| visible_width(s))
    }
}

/// The layout record for one block element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutBox {
    width: usize,
    margin: Sides<usize>,
    padding: Sides<usize>,
    border: Sides<usize>,
    line_template_width: usize,
    // Left plus right totals down from the root.
    total_margin: usize,
    total_padding: usize,
    total_border: usize,
    total_line_template_width: usize,
}

impl LayoutBox {
    /// The document-level box.
    pub fn root(
        width: usize,
        margin: Sides<usize>,
        padding: Sides<usize>,
        border: Sides<usize>,
    ) -> LayoutBox {
        LayoutBox {
            width,
            total_margin: margin.left + margin.right,
            total_padding: padding.left + padding.right,
            total_border: border.left + border.right,
            total_line_template_width: 0,
            line_template_width: 0,
            margin,
            padding,
            border,
        }
    }

    /// A box nested inside `parent`.  `border` holds the border widths;
    /// `line_template` is a template such as `"> {}"` whose literal text is
    /// added to each line.
    pub fn nested(
        parent: &LayoutBox,
        margin: Sides<usize>,
        padding: Sides<usize>,
        border: Sides<usize>,
        line_template: Option<&str>,
    ) -> LayoutBox {
        let line_template_width = line_template.map(template_width).unwrap_or(0);
        LayoutBox {
            width: parent.width,
            total_margin: parent.total_margin + margin.left + margin.right,
            total_padding: parent.total_padding + padding.left + padding.right,
            total_border: parent.total_border + border.left + border.right,
            total_line_template_width: parent.total_line_template_width + line_template_width,
            line_template_width,
            margin,
            padding,
            border,
        }
    }

    /// The document width this box was laid out in.
    pub fn width(&self) -> usize {
        self.width
    }

    /// This box's own margins.
    pub fn margin(&self) -> &Sides<usize> {
        &self.margin
    }

    /// This box's own padding.
    pub fn padding(&self) -> &Sides<usize> {
        &self.padding
    }

    /// This box's own border widths.
    pub fn border(&self) -> &Sides<usize> {
        &self.border
    }

    /// The width of this box's own line template.
    pub fn line_template_width(&self) -> usize {
        self.line_template_width
    }

    /// The width available to content, excluding everything inherited
    /// except line templates.
    pub fn inner_width(&self) -> usize {
        self.width
            .saturating_sub(self.total_margin + self.total_padding + self.total_border)
    }

    /// The width content should be wrapped to, leaving room for every line
    /// template which will be added on the way back up.
    pub fn inner_width_excluding_line_template(&self) -> usize {
        self.inner_width()
            .saturating_sub(self.total_line_template_width)
    }

    /// The width of a line including this box's padding (and its own line
    /// template, which is already part of the content by then).
    pub fn padded_width(&self) -> usize {
        (self.inner_width() + self.padding.left + self.padding.right)
            .saturating_sub(self.total_line_template_width - self.line_template_width)
    }

    /// The width of a line including the borders.
    pub fn bordered_width(&self) -> usize {
        self.padded_width() + self.border.left + self.border.right
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutBox, Sides};

    fn zero() -> Sides<usize> {
        Sides::all(0)
    }

    #[test]
    fn test_root_box() {
        let root = LayoutBox::root(67, zero(), zero(), zero());
        assert_eq!(root.inner_width(), 67);
        assert_eq!(root.padded_width(), 67);
        assert_eq!(root.bordered_width(), 67);

        let root = LayoutBox::root(40, [0, 2, 0, 3].into(), [0, 1, 0, 1].into(), [1, 1, 1, 1].into());
        assert_eq!(root.inner_width(), 40 - 5 - 2 - 2);
        assert_eq!(root.padded_width(), 40 - 5 - 2);
        assert_eq!(root.bordered_width(), 35);
    }

    #[test]
    fn test_nested_totals() {
        let root = LayoutBox::root(67, zero(), zero(), zero());
        let quote = LayoutBox::nested(&root, [1, 0, 1, 0].into(), zero(), zero(), Some("> {}"));
        assert_eq!(quote.line_template_width(), 2);
        assert_eq!(quote.inner_width(), 67);
        assert_eq!(quote.inner_width_excluding_line_template(), 65);
        assert_eq!(quote.padded_width(), 67);

        let para = LayoutBox::nested(&quote, zero(), [0, 1, 0, 1].into(), zero(), Some("{}"));
        assert_eq!(para.inner_width(), 65);
        assert_eq!(para.inner_width_excluding_line_template(), 63);
        assert_eq!(para.padded_width(), 65);

        let item = LayoutBox::nested(&para, [0, 0, 0, 4].into(), zero(), [0, 1, 0, 1].into(), Some("{0}. {1}"));
        assert_eq!(item.line_template_width(), 2);
        assert_eq!(item.inner_width(), 67 - 4 - 2 - 2);
        assert_eq!(item.inner_width_excluding_line_template(), 67 - 4 - 2 - 2 - 4);
        assert_eq!(item.padded_width(), 67 - 4 - 2 - 2 - 2);
        assert_eq!(item.bordered_width(), 59);
    }

    #[test]
    fn test_too_narrow_saturates() {
        let root = LayoutBox::root(3, [0, 2, 0, 2].into(), zero(), zero());
        assert_eq!(root.inner_width(), 0);
        assert_eq!(root.bordered_width(), 0);
    }

    #[test]
    fn test_border_widths() {
        let borders: Sides<String> = ["=", "||", "-", "|"].into();
        assert_eq!(borders.widths(), Sides::new(1, 2, 1, 1));
    }
}
