/// Quotes `text` the way JSON would, for use in messages.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

#[test]
fn quote_escapes() {
    assert_eq!(quote("abc"), "\"abc\"");
    assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    assert_eq!(quote("a\nb"), "\"a\\nb\"");
}
