//! Escaping for the delivery sink's rich-text dialect (Telegram MarkdownV2).
//!
//! Every character listed in [`RESERVED`] must be preceded by a backslash
//! anywhere outside an entity. The matcher runs over escaped text so that
//! match offsets index the string that is actually delivered.

/// Characters MarkdownV2 treats as markup.
pub const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape `text` so the sink renders it literally.
///
/// # Examples
/// ```
/// use acrostic::domain::markdown::escape;
///
/// assert_eq!(escape("3 + 7 = 10!"), "3 \\+ 7 \\= 10\\!");
/// ```
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Render a user mention linking `display_name` to the stable user id.
///
/// # Examples
/// ```
/// use acrostic::domain::markdown::mention;
///
/// assert_eq!(mention("Ada L.", 42), "[Ada L\\.](tg://user?id=42)");
/// ```
pub fn mention(display_name: &str, user_id: i64) -> String {
    format!("[{}](tg://user?id={user_id})", escape(display_name))
}
