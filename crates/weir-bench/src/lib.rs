//! Benchmark profiles for the Weir staging pipeline.
//!
//! - [`wide_config`]: many groups of mixed-kind arrays, one write per group
//! - [`relay_config`]: a read-then-write relay over a 3-D array

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt::Write;

use weir_core::ElementKind;

/// A config with `groups` groups of `arrays` 2-D arrays each.
///
/// Kinds cycle through every [`ElementKind`]. Each group is written to
/// its own stream, so the stream plan has `groups` entries.
pub fn wide_config(steps: u64, groups: usize, arrays: usize) -> String {
    let mut text = format!("# generated: {groups} groups x {arrays} arrays\nsteps {steps}\n");
    for g in 0..groups {
        let _ = writeln!(text, "group g{g}");
        for a in 0..arrays {
            let kind = ElementKind::ALL[(g + a) % ElementKind::ALL.len()];
            let _ = writeln!(text, "  array {} v{a} 2 64 32 X Y", kind.config_name());
        }
    }
    for g in 0..groups {
        let _ = writeln!(text, "write out{g}.bp g{g}");
    }
    text
}

/// A relay: read `in.bp` then write `out.bp`, both gated on the read.
pub fn relay_config(steps: u64, edge: u64) -> String {
    format!(
        "steps {steps}\n\
         group field\n  array double u 3 {edge} {edge} {edge} X Y Z\n\
         read next in.bp field\n\
         cond in.bp write out.bp field\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_config_shape() {
        let text = wide_config(2, 3, 4);
        assert_eq!(text.matches("\ngroup ").count(), 3);
        assert_eq!(text.matches("array ").count(), 12);
        assert_eq!(text.matches("write ").count(), 3);
    }

    #[test]
    fn relay_mentions_both_streams() {
        let text = relay_config(5, 16);
        assert!(text.contains("read next in.bp field"));
        assert!(text.contains("cond in.bp write out.bp field"));
    }
}
