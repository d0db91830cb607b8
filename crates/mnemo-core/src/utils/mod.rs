pub mod time;

/// Mangle a note name to create a URL/anchor-safe fragment identifier.
///
/// Rules (following GitHub-style section anchors):
/// - Convert to lowercase
/// - Keep letters (including Unicode), digits, spaces and hyphens; discard
///   everything else
/// - Replace each space with a hyphen; adjacent spaces become adjacent
///   hyphens, they are NOT collapsed into one
/// - No trimming: leading/trailing spaces survive as leading/trailing
///   hyphens
///
/// A name made of punctuation only mangles to the empty string. Some
/// renderers emit a stray `-1` anchor for such names; that artifact is a
/// renderer bug and is not reproduced here.
///
/// # Examples
///
/// ```
/// use mnemo_core::mangle_heading;
///
/// assert_eq!(mangle_heading("Section with space"), "section-with-space");
/// assert_eq!(mangle_heading("Question?"), "question");
/// assert_eq!(mangle_heading("A  B"), "a--b"); // adjacent hyphens kept
/// assert_eq!(mangle_heading("@$%^&*("), "");
/// ```
pub fn mangle_heading(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphabetic() || c.is_numeric() || c == '-' {
                Some(c)
            } else if c == ' ' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}
