//! Whole-vector traversal helpers.

use super::{BitIter, BitVector};
use crate::storage::StorageError;

/// Calls `f` with every index and bit in ascending order.
///
/// An error from `f` stops the traversal and is returned; otherwise the
/// iterator's close result is.
pub fn for_each<V, F, E>(vec: &V, f: F) -> Result<(), E>
where
    V: BitVector + ?Sized,
    F: FnMut(u64, bool) -> Result<(), E>,
    E: From<StorageError>,
{
    drive(vec.iterate(0, vec.len()), f)
}

/// Calls `f` with every index and bit in descending order.
pub fn reverse_for_each<V, F, E>(vec: &V, f: F) -> Result<(), E>
where
    V: BitVector + ?Sized,
    F: FnMut(u64, bool) -> Result<(), E>,
    E: From<StorageError>,
{
    drive(vec.reverse_iterate(0, vec.len()), f)
}

fn drive<F, E>(mut iter: Box<dyn BitIter + '_>, mut f: F) -> Result<(), E>
where
    F: FnMut(u64, bool) -> Result<(), E>,
    E: From<StorageError>,
{
    while iter.next() {
        if let Err(e) = f(iter.index(), iter.bit()) {
            let _ = iter.close();
            return Err(e);
        }
    }
    iter.close().map_err(E::from)
}

pub(crate) fn debug_string<V: BitVector + ?Sized>(vec: &V) -> String {
    let mut out = String::with_capacity(vec.len() as usize + 2);
    out.push('[');
    let _ = for_each(vec, |_, bit| -> Result<(), StorageError> {
        out.push(if bit { '1' } else { '0' });
        Ok(())
    });
    out.push(']');
    out
}
