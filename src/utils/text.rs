pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if max_bytes == 0 {
        return String::new();
    }
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// Lossy UTF-8 preview of a response body, cut at `max_bytes` with a marker
/// showing how much was dropped.
pub fn preview_body(body: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.len() <= max_bytes {
        return trimmed.to_string();
    }
    let head = truncate_utf8_prefix(trimmed, max_bytes);
    format!("{}... (+{} bytes)", head, trimmed.len() - head.len())
}
