//! XML request bodies for the Tableau REST API

/// Normalize typographic quotes and escape for an XML attribute value
///
/// Line breaks and tabs become character references so attribute-value
/// normalization keeps them.
pub fn sanitize_description(description: &str) -> String {
    let mut out = String::with_capacity(description.len());
    for c in description.chars() {
        match c {
            '\u{201C}' | '\u{201D}' | '"' => out.push_str("&quot;"),
            '\u{2018}' | '\u{2019}' | '\'' => out.push_str("&#x27;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out
}

/// Body of `PUT .../tables/{table}/columns/{column}`
pub fn column_description_payload(description: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><tsRequest><column description="{}"/></tsRequest>"#,
        sanitize_description(description)
    )
}

/// Body of `PUT .../tables/{table}`
pub fn table_description_payload(description: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><tsRequest><table description="{}"/></tsRequest>"#,
        sanitize_description(description)
    )
}
