//! Masks matched letters by wrapping each one in emphasis markers.

/// Marker inserted on both sides of every matched character.
pub const MARKER: char = '*';

/// Wrap each character at `positions` in [`MARKER`]s.
///
/// `positions` must be strictly increasing offsets into `text`, as produced
/// by the matcher over the same text. For the `i`-th position `p` the final
/// string carries the opening marker at `p + 2 * i` and the closing marker at
/// `p + 2 * i + 2`; this is computed in a single forward pass. Offsets past
/// the end of `text` are ignored.
///
/// # Examples
/// ```
/// use acrostic::domain::obfuscate;
///
/// let text: Vec<char> = "orange was lovely".chars().collect();
/// assert_eq!(obfuscate(&text, &[0, 7, 11]), "*o*range *w*as *l*ovely");
/// ```
pub fn obfuscate(text: &[char], positions: &[usize]) -> String {
    obfuscate_with(text, positions, MARKER)
}

/// [`obfuscate`] with a caller-chosen marker.
pub fn obfuscate_with(text: &[char], positions: &[usize], marker: char) -> String {
    debug_assert!(
        positions.windows(2).all(|pair| pair[0] < pair[1]),
        "match positions must be strictly increasing"
    );

    let mut out = String::with_capacity(text.len() + positions.len() * 2);
    let mut pending = positions.iter().copied().peekable();
    for (index, &ch) in text.iter().enumerate() {
        if pending.next_if_eq(&index).is_some() {
            out.push(marker);
            out.push(ch);
            out.push(marker);
        } else {
            out.push(ch);
        }
    }
    out
}
