//! Reusable config texts.
//!
//! - [`SINGLE_WRITER`]: one int array split along `X`, written every step.
//! - [`PRODUCER_CONSUMER`]: two roles sharing one stream.
//! - [`GATED_PIPELINE`]: a reader whose downstream write is gated on it.
//! - [`MIXED_KINDS`]: one group holding every element kind.

/// Two steps writing a 4-element int array split over `X`.
pub const SINGLE_WRITER: &str = "\
steps 2
group g
    array int v 1 4 X
write out g
";

/// Role 0 produces `heat` into `a.bp`; role 1 consumes it.
///
/// The array is decomposed over `X` on either side, so the roles may run
/// with different process counts.
pub const PRODUCER_CONSUMER: &str = "\
# producer / consumer over one stream
steps 3
group fields
    array double heat 2 8 6 X 1
    array float aux 1 4 X

app 0
write a.bp fields heat

app 1
read next a.bp fields heat
";

/// Reads `in` every step and forwards to `out` only after a good read.
pub const GATED_PIPELINE: &str = "\
steps 4
group g
    array double d 1 6 X
read next in g
cond in write out g
sleep 0
";

/// One variable of every supported kind.
pub const MIXED_KINDS: &str = "\
steps 1
group all
    array double d 1 4 X
    array float f 1 4 X
    array int i 1 4 X
write mixed all
";
