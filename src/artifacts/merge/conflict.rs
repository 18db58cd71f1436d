//! Conflict marker synthesis
//!
//! A conflicted file is replaced by both versions between markers:
//!
//! ```text
//! <<<<<<< HEAD
//! <current content>=======
//! <given content>>>>>>>>
//! ```
//!
//! Contents are concatenated as raw bytes. A side without a trailing newline
//! runs into the following marker, and an absent side contributes nothing.

use bytes::Bytes;

pub const CURRENT_MARKER: &[u8] = b"<<<<<<< HEAD\n";
pub const SEPARATOR_MARKER: &[u8] = b"=======\n";
pub const GIVEN_MARKER: &[u8] = b">>>>>>>\n";

pub fn synthesize_conflict(current: Option<&[u8]>, given: Option<&[u8]>) -> Bytes {
    let current = current.unwrap_or_default();
    let given = given.unwrap_or_default();

    let mut content = Vec::with_capacity(
        CURRENT_MARKER.len()
            + current.len()
            + SEPARATOR_MARKER.len()
            + given.len()
            + GIVEN_MARKER.len(),
    );
    content.extend_from_slice(CURRENT_MARKER);
    content.extend_from_slice(current);
    content.extend_from_slice(SEPARATOR_MARKER);
    content.extend_from_slice(given);
    content.extend_from_slice(GIVEN_MARKER);

    Bytes::from(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Some(&b"base"[..]), Some(&b"changed"[..]), "<<<<<<< HEAD\nbase=======\nchanged>>>>>>>\n")]
    #[case(Some(&b"a\n"[..]), Some(&b"b\n"[..]), "<<<<<<< HEAD\na\n=======\nb\n>>>>>>>\n")]
    #[case(Some(&b"kept\n"[..]), None, "<<<<<<< HEAD\nkept\n=======\n>>>>>>>\n")]
    #[case(None, Some(&b"new\n"[..]), "<<<<<<< HEAD\n=======\nnew\n>>>>>>>\n")]
    fn markers_wrap_raw_contents(
        #[case] current: Option<&[u8]>,
        #[case] given: Option<&[u8]>,
        #[case] expected: &str,
    ) {
        assert_eq!(
            synthesize_conflict(current, given).as_ref(),
            expected.as_bytes()
        );
    }
}
