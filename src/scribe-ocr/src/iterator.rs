//! Result traversal
//!
//! The native iterator is two-level: a page iterator tracks the position and
//! the element boundaries, and a result iterator bound to the same position
//! reads text and confidence. [`ResultCursor`] drives both through the
//! explicit `begin` / `current` / `advance` protocol; [`Elements`] wraps that
//! protocol as a lazy Rust iterator at one fixed level.

use crate::api::TessApi;
use crate::types::{PageIteratorLevel, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A piece of recognized text with its confidence and location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedElement {
    pub text: String,
    /// 0 to 100
    pub confidence: f32,
    pub bbox: Rect,
}

impl fmt::Display for RecognizedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [Confidence: {:.2} Bounding box: {} {} {} {}]",
            self.text.trim_end(),
            self.confidence,
            self.bbox.x,
            self.bbox.y,
            self.bbox.width,
            self.bbox.height
        )
    }
}

/// Forward-only cursor over one recognition result.
///
/// Not restartable once exhausted: walking the page again takes another
/// recognition pass.
pub struct ResultCursor<'r, A: TessApi> {
    api: &'r A,
    iter: Option<A::ResultIter>,
    exhausted: bool,
}

impl<'r, A: TessApi> ResultCursor<'r, A> {
    pub(crate) fn new(api: &'r A, iter: Option<A::ResultIter>) -> Self {
        let exhausted = iter.is_none();
        Self {
            api,
            iter,
            exhausted,
        }
    }

    /// Position on the first element
    pub fn begin(&mut self) {
        if self.exhausted {
            return;
        }
        if let Some(iter) = self.iter.as_mut() {
            self.api.iter_begin(iter);
        }
    }

    /// Read the element under the cursor, or None when there is nothing at
    /// this position (exhausted cursor, or an empty element)
    pub fn current(&self, level: PageIteratorLevel) -> Option<RecognizedElement> {
        if self.exhausted {
            return None;
        }
        let iter = self.iter.as_ref()?;

        let text = self.api.iter_text(iter, level)?;
        let confidence = self.api.iter_confidence(iter, level).clamp(0.0, 100.0);
        let bbox = self
            .api
            .iter_bounding_box(iter, level)
            .map(|(left, top, right, bottom)| Rect::from_corners(left, top, right, bottom))
            .unwrap_or_default();

        Some(RecognizedElement {
            text,
            confidence,
            bbox,
        })
    }

    /// Move to the next element at `level`. Returns false, and stays false,
    /// once the last element has been passed.
    pub fn advance(&mut self, level: PageIteratorLevel) -> bool {
        if self.exhausted {
            return false;
        }
        let moved = match self.iter.as_mut() {
            Some(iter) => self.api.iter_next(iter, level),
            None => false,
        };
        if !moved {
            self.exhausted = true;
        }
        moved
    }

    /// True once `advance` has returned false
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Consume the cursor as an iterator over elements at `level`
    pub fn elements(self, level: PageIteratorLevel) -> Elements<'r, A> {
        Elements {
            cursor: self,
            level,
            started: false,
        }
    }
}

impl<A: TessApi> Drop for ResultCursor<'_, A> {
    fn drop(&mut self) {
        if let Some(iter) = self.iter.take() {
            self.api.iter_delete(iter);
        }
    }
}

/// Lazy, finite sequence of elements at one level
pub struct Elements<'r, A: TessApi> {
    cursor: ResultCursor<'r, A>,
    level: PageIteratorLevel,
    started: bool,
}

impl<A: TessApi> Iterator for Elements<'_, A> {
    type Item = RecognizedElement;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cursor.is_exhausted() {
                return None;
            }
            if !self.started {
                self.cursor.begin();
                self.started = true;
            } else if !self.cursor.advance(self.level) {
                return None;
            }

            // Empty positions are skipped
            if let Some(element) = self.cursor.current(self.level) {
                return Some(element);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Call, FakeApi, FakeWord};

    fn fixture() -> Vec<FakeWord> {
        vec![
            FakeWord::new("The", 96.1, (36, 92, 96, 116)),
            FakeWord::new("(quick)", 91.7, (109, 92, 236, 121)),
            FakeWord::new("", 0.0, (0, 0, 0, 0)),
            FakeWord::new("[brown]", 93.4, (252, 92, 389, 121)),
        ]
    }

    #[test]
    fn test_protocol() {
        let api = FakeApi::new().with_words(fixture());
        let mut cursor = ResultCursor::new(&api, api.make_iter());

        cursor.begin();
        let first = cursor.current(PageIteratorLevel::Word).unwrap();
        assert_eq!(first.text, "The");
        assert_eq!(first.bbox, Rect::new(36, 92, 60, 24));

        assert!(cursor.advance(PageIteratorLevel::Word));
        assert_eq!(cursor.current(PageIteratorLevel::Word).unwrap().text, "(quick)");

        assert!(cursor.advance(PageIteratorLevel::Word));
        assert!(cursor.current(PageIteratorLevel::Word).is_none());

        assert!(cursor.advance(PageIteratorLevel::Word));
        assert!(!cursor.advance(PageIteratorLevel::Word));
        assert!(cursor.is_exhausted());
        assert!(!cursor.advance(PageIteratorLevel::Word));
        assert!(cursor.current(PageIteratorLevel::Word).is_none());
    }

    #[test]
    fn test_elements_skip_empty_positions() {
        let api = FakeApi::new().with_words(fixture());
        let cursor = ResultCursor::new(&api, api.make_iter());

        let texts: Vec<String> = cursor
            .elements(PageIteratorLevel::Word)
            .map(|e| e.text)
            .collect();
        assert_eq!(texts, vec!["The", "(quick)", "[brown]"]);
    }

    #[test]
    fn test_missing_iterator_yields_nothing() {
        let api = FakeApi::new();
        let mut cursor = ResultCursor::new(&api, None);
        cursor.begin();
        assert!(cursor.current(PageIteratorLevel::Word).is_none());
        assert!(!cursor.advance(PageIteratorLevel::Word));
        assert_eq!(cursor.elements(PageIteratorLevel::Line).count(), 0);
    }

    #[test]
    fn test_iterator_released_once() {
        let api = FakeApi::new().with_words(fixture());
        let cursor = ResultCursor::new(&api, api.make_iter());
        let _ = cursor.elements(PageIteratorLevel::Word).take(1).count();

        assert_eq!(api.count(|c| matches!(c, Call::IterDelete)), 1);
    }

    #[test]
    fn test_display() {
        let element = RecognizedElement {
            text: "dog\n".to_string(),
            confidence: 88.0,
            bbox: Rect::new(1, 2, 3, 4),
        };
        assert_eq!(
            element.to_string(),
            "dog [Confidence: 88.00 Bounding box: 1 2 3 4]"
        );
    }
}
