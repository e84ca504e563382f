//! Strings as lists of shared, splittable parts.
//!
//! A [`StringContent`] is an ordered list of parts whose concatenation is the
//! string. Parts are shared: copying a string or appending a slice of it
//! reuses the same part instances instead of copying text. Each part keeps a
//! back-reference to every list it appears in, so that splitting a part can
//! insert the right half into all of them and every string keeps its text.
//!
//! Offsets are UTF-8 byte offsets. Since Rust text is UTF-8, a byte offset is
//! also a native index, provided it falls on a character boundary.

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::error::{MendozaError, Result};

// ── StringPart ────────────────────────────────────────────────────────────

pub(crate) struct StringPart<O> {
    text: String,
    origin: O,
    /// Every part list this part currently appears in. Entries whose list
    /// has been dropped are pruned lazily.
    uses: Vec<Weak<PartList<O>>>,
}

impl<O> StringPart<O> {
    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn utf8_size(&self) -> usize {
        self.text.len()
    }

    fn prune_uses(&mut self) {
        self.uses.retain(|list| list.strong_count() > 0);
    }
}

pub(crate) type PartRef<O> = Rc<RefCell<StringPart<O>>>;

struct PartList<O> {
    parts: RefCell<Vec<PartRef<O>>>,
}

/// Records `list` as a user of `part` (at most once).
fn register_use<O>(part: &PartRef<O>, list: &Rc<PartList<O>>) {
    let weak = Rc::downgrade(list);
    let mut part = part.borrow_mut();
    part.prune_uses();
    if !part.uses.iter().any(|used| used.ptr_eq(&weak)) {
        part.uses.push(weak);
    }
}

/// Splits `part` at byte offset `at`.
///
/// The part keeps `[0, at)`; a new part holding `[at, len)` is inserted right
/// after every occurrence of `part` in every list that uses it.
pub(crate) fn split_part<O: Clone>(part: &PartRef<O>, at: usize) -> Result<()> {
    let (right, uses) = {
        let mut left = part.borrow_mut();
        let len = left.utf8_size();
        if at == len {
            return Ok(());
        }
        if at > len {
            return Err(MendozaError::StringOutOfBounds);
        }
        if !left.text.is_char_boundary(at) {
            return Err(MendozaError::NotCharBoundary(at));
        }
        left.prune_uses();
        let text = left.text.split_off(at);
        let right = StringPart { text, origin: left.origin.clone(), uses: left.uses.clone() };
        (Rc::new(RefCell::new(right)), left.uses.clone())
    };

    debug!(at, uses = uses.len(), "splitting string part");

    for list in uses.iter().filter_map(Weak::upgrade) {
        let mut parts = list.parts.borrow_mut();
        let mut found = false;
        let mut i = 0;
        while i < parts.len() {
            if Rc::ptr_eq(&parts[i], part) {
                parts.insert(i + 1, Rc::clone(&right));
                found = true;
                i += 2;
            } else {
                i += 1;
            }
        }
        if !found {
            return Err(MendozaError::BrokenPartUse);
        }
    }
    Ok(())
}

// ── StringFragment ────────────────────────────────────────────────────────

/// A snapshot of one part: its text and the origin it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringFragment<O> {
    pub text: String,
    pub origin: O,
}

// ── StringContent ─────────────────────────────────────────────────────────

/// The structural form of a string value.
pub struct StringContent<O> {
    list: Rc<PartList<O>>,
}

impl<O: Clone> StringContent<O> {
    pub(crate) fn empty() -> Self {
        Self { list: Rc::new(PartList { parts: RefCell::new(Vec::new()) }) }
    }

    pub(crate) fn from_text(text: String, origin: O) -> Self {
        let part = Rc::new(RefCell::new(StringPart { text, origin, uses: Vec::new() }));
        Self::from_parts(vec![part])
    }

    pub(crate) fn from_parts(parts: Vec<PartRef<O>>) -> Self {
        let content = Self::empty();
        for part in parts {
            content.push_part(part);
        }
        content
    }

    /// A new, independent list over the same parts.
    pub(crate) fn copy(&self) -> Self {
        Self::from_parts(self.parts())
    }

    fn parts(&self) -> Vec<PartRef<O>> {
        self.list.parts.borrow().clone()
    }

    pub(crate) fn push_part(&self, part: PartRef<O>) {
        register_use(&part, &self.list);
        self.list.parts.borrow_mut().push(part);
    }

    /// Appends every part of `other`.
    pub(crate) fn append(&self, other: &StringContent<O>) {
        for part in other.parts() {
            self.push_part(part);
        }
    }

    /// Appends the bytes `[left, right)` of `source`, splitting its boundary
    /// parts when needed.
    pub(crate) fn append_slice(
        &self,
        source: &StringContent<O>,
        left: usize,
        right: usize,
    ) -> Result<()> {
        let range = source.resolve_range(left, right)?;
        let parts = source.list.parts.borrow()[range].to_vec();
        for part in parts {
            self.push_part(part);
        }
        Ok(())
    }

    /// Makes `[left, right)` start and end on part boundaries and returns
    /// the range of parts covering exactly those bytes.
    pub(crate) fn resolve_range(&self, left: usize, right: usize) -> Result<Range<usize>> {
        if left > right {
            return Err(MendozaError::SliceOutOfRange { left, right, len: self.utf8_size() });
        }
        self.split_at(left)?;
        self.split_at(right)?;

        // Splits only ever insert parts, so boundaries are found by size.
        let parts = self.list.parts.borrow();
        let start = Self::part_index_at(&parts, left);
        let end = Self::part_index_at(&parts, right);
        Ok(start..end.max(start))
    }

    /// Ensures a part boundary at byte `offset`.
    fn split_at(&self, offset: usize) -> Result<()> {
        let mut consumed = 0;
        let mut index = 0;
        loop {
            if consumed == offset {
                return Ok(());
            }
            let part = self
                .list
                .parts
                .borrow()
                .get(index)
                .cloned()
                .ok_or(MendozaError::StringOutOfBounds)?;
            let size = part.borrow().utf8_size();
            if offset < consumed + size {
                return split_part(&part, offset - consumed);
            }
            consumed += size;
            index += 1;
        }
    }

    fn part_index_at(parts: &[PartRef<O>], offset: usize) -> usize {
        let mut consumed = 0;
        for (index, part) in parts.iter().enumerate() {
            if consumed >= offset {
                return index;
            }
            consumed += part.borrow().utf8_size();
        }
        parts.len()
    }

    pub fn utf8_size(&self) -> usize {
        self.list.parts.borrow().iter().map(|part| part.borrow().utf8_size()).sum()
    }

    pub fn part_count(&self) -> usize {
        self.list.parts.borrow().len()
    }

    pub fn to_text(&self) -> String {
        let parts = self.list.parts.borrow();
        let mut text = String::with_capacity(parts.iter().map(|p| p.borrow().utf8_size()).sum());
        for part in parts.iter() {
            text.push_str(part.borrow().text());
        }
        text
    }

    pub fn fragments(&self) -> Vec<StringFragment<O>> {
        self.list
            .parts
            .borrow()
            .iter()
            .map(|part| {
                let part = part.borrow();
                StringFragment { text: part.text.clone(), origin: part.origin.clone() }
            })
            .collect()
    }
}

impl<O: Clone> fmt::Debug for StringContent<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringContent")
            .field("text", &self.to_text())
            .field("parts", &self.part_count())
            .finish()
    }
}
