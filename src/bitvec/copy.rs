//! Bit-for-bit copy between vectors of any backend pairing.

use super::BitVector;
use crate::storage::StorageResult;

/// Copies `src` into `dst` through one forward iterator per side.
///
/// The destination iterator is closed first and its error wins; the source
/// iterator is closed regardless and its error is reported only when the
/// destination closed cleanly.
pub fn copy_bits<D, S>(dst: &D, src: &S) -> StorageResult<()>
where
    D: BitVector + ?Sized,
    S: BitVector + ?Sized,
{
    let mut src_iter = src.iterate(0, src.len());
    let mut dst_iter = dst.iterate(0, dst.len());

    while src_iter.next() && dst_iter.next() {
        dst_iter.set_bit(src_iter.bit());
    }

    let dst_result = dst_iter.close();
    let src_result = src_iter.close();
    dst_result?;
    src_result
}
