//! The rendered-output tree and its depth-first flattening (spec.md §4.7).
//!
//! Rendering a template never produces one flat string directly; it
//! produces a tree shaped like the template's own nesting (a node per
//! child part, holding either a literal chunk or the fragments its
//! value expanded to). [`Fragment::iterate`] walks that tree the same
//! way every time, since nothing about it changes between calls — there
//! is no mutable cursor to make a second walk interfere with the first.

/// One piece of a rendered template: either literal text or a nested
/// collection of further fragments (the expansion of one dynamic value).
#[derive(Debug)]
pub enum Fragment {
    Chunk(String),
    Nested(Vec<Fragment>),
}

impl Fragment {
    pub fn empty() -> Self {
        Fragment::Chunk(String::new())
    }

    /// Depth-first, left-to-right iterator over every literal chunk in
    /// this fragment tree.
    pub fn iterate(&self) -> FragmentIter<'_> {
        FragmentIter { stack: vec![FrameIter::Single(self)] }
    }
}

enum FrameIter<'a> {
    Single(&'a Fragment),
    Slice(std::slice::Iter<'a, Fragment>),
}

/// A non-reentrant depth-first iterator over a [`Fragment`] tree.
pub struct FragmentIter<'a> {
    stack: Vec<FrameIter<'a>>,
}

impl<'a> Iterator for FragmentIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top {
                FrameIter::Single(fragment) => {
                    let fragment = *fragment;
                    self.stack.pop();
                    match fragment {
                        Fragment::Chunk(s) => return Some(s.as_str()),
                        Fragment::Nested(items) => self.stack.push(FrameIter::Slice(items.iter())),
                    }
                }
                FrameIter::Slice(iter) => match iter.next() {
                    Some(next) => self.stack.push(FrameIter::Single(next)),
                    None => {
                        self.stack.pop();
                    }
                },
            }
        }
    }
}
