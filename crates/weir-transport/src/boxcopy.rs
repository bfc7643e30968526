//! Row-major copies between a local box and its global array.

use std::ops::Range;

/// Visit every contiguous run of a box inside a row-major global array.
///
/// `f` receives the byte range of the run in the global array and the
/// matching byte range in the packed local buffer. Runs are visited in
/// local order. A box with any zero count has no runs.
pub(crate) fn for_each_run(
    shape: &[u64],
    start: &[u64],
    count: &[u64],
    width: usize,
    mut f: impl FnMut(Range<usize>, Range<usize>),
) {
    let n = shape.len();
    if n == 0 || count.iter().any(|&c| c == 0) {
        return;
    }

    let mut strides = vec![1usize; n];
    for i in (0..n - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1] as usize;
    }

    let run = count[n - 1] as usize * width;
    let rows: usize = count[..n - 1].iter().map(|&c| c as usize).product();
    let mut coord = vec![0u64; n - 1];
    for row in 0..rows {
        let mut offset = start[n - 1] as usize;
        for i in 0..n - 1 {
            offset += (start[i] + coord[i]) as usize * strides[i];
        }
        let global = offset * width;
        let local = row * run;
        f(global..global + run, local..local + run);

        // Advance the row coordinate, last outer dimension fastest.
        for i in (0..n - 1).rev() {
            coord[i] += 1;
            if coord[i] < count[i] {
                break;
            }
            coord[i] = 0;
        }
    }
}

/// Copy a packed local box into the global array.
pub(crate) fn scatter(
    global: &mut [u8],
    local: &[u8],
    shape: &[u64],
    start: &[u64],
    count: &[u64],
    width: usize,
) {
    for_each_run(shape, start, count, width, |g, l| {
        global[g].copy_from_slice(&local[l]);
    });
}

/// Copy a box out of the global array into a packed local buffer.
pub(crate) fn gather(
    global: &[u8],
    local: &mut [u8],
    shape: &[u64],
    start: &[u64],
    count: &[u64],
    width: usize,
) {
    for_each_run(shape, start, count, width, |g, l| {
        local[l].copy_from_slice(&global[g]);
    });
}
