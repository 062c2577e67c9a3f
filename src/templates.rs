//! Sample HTML templates for documentation, tests and `press sample`.
//!
//! The fragments use `{{name}}` placeholders and the page shell carries a
//! [`CONTENT_TOKEN`] section slot, so together they exercise the whole
//! compose flow: concatenate, inject, substitute.

use crate::compose::{concat_fragments, inject_fragment, substitute_placeholders, PlaceholderMap};

/// Section token in [`page_shell`] that receives the composed fragments.
pub const CONTENT_TOKEN: &str = "{{content}}";

/// Complete document around a single section slot.
pub fn page_shell() -> &'static str {
    r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{{title}}</title>
</head>
<body style="font-family: Helvetica, Arial, sans-serif">
{{content}}
</body>
</html>
"##
}

/// Letterhead with company and document number.
pub fn header_fragment() -> &'static str {
    r##"<div style="border-bottom: 1px solid #cccccc; margin-bottom: 12px">
    <h1 style="color: #1a365d; margin-bottom: 4px">{{company}}</h1>
    <p style="margin-top: 0; color: #555555">Invoice {{invoice_number}} &#183; issued {{date}}</p>
</div>"##
}

/// Invoice body with a line-item table.
pub fn body_fragment() -> &'static str {
    r##"<p>Bill to: <strong>{{customer}}</strong></p>
<table border="1" style="margin: 12px 0">
    <tr bgcolor="#eeeeee">
        <th>Item</th>
        <th>Qty</th>
        <th>Price</th>
    </tr>
    <tr>
        <td>Web development</td>
        <td align="right">40</td>
        <td align="right">$6,000.00</td>
    </tr>
    <tr>
        <td>Design services</td>
        <td align="right">20</td>
        <td align="right">$2,500.00</td>
    </tr>
    <tr>
        <td>Hosting (annual)</td>
        <td align="right">1</td>
        <td align="right">$500.00</td>
    </tr>
</table>
<p style="text-align: right; font-size: 18px"><b>Total: {{total}}</b></p>"##
}

/// Closing notes.
pub fn footer_fragment() -> &'static str {
    r##"<hr>
<p style="font-size: 12px; color: #777777">Payment due within 30 days. Questions? {{contact}}</p>"##
}

/// Values for every placeholder in the sample fragments.
pub fn sample_placeholders() -> PlaceholderMap {
    PlaceholderMap::new()
        .with("{{title}}", "Invoice 2024-001")
        .with("{{company}}", "Acme Corp")
        .with("{{invoice_number}}", "2024-001")
        .with("{{date}}", "2024-03-01")
        .with("{{customer}}", "Client Inc")
        .with("{{total}}", "$9,000.00")
        .with("{{contact}}", "billing@acme.example")
}

/// The sample invoice, fully composed.
pub fn sample_document() -> String {
    let content = concat_fragments([header_fragment(), body_fragment(), footer_fragment()]);
    let page = inject_fragment(page_shell(), CONTENT_TOKEN, content.as_str());
    substitute_placeholders(&page, &sample_placeholders())
}

/// Long document for pagination checks: `sections` headed sections of
/// several paragraphs each.
pub fn multi_page_document(sections: usize) -> String {
    let mut body = String::new();
    for i in 1..=sections {
        body.push_str(&format!("<h2>Section {i}</h2>\n"));
        for j in 1..=4 {
            body.push_str(&format!(
                "<p>Paragraph {j} of section {i}. The quick brown fox jumps over the \
                 lazy dog while the report keeps going to fill the page.</p>\n"
            ));
        }
    }
    let page = inject_fragment(page_shell(), CONTENT_TOKEN, body.as_str());
    substitute_placeholders(&page, &PlaceholderMap::new().with("{{title}}", "Long report"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::validate;

    #[test]
    fn sample_document_is_complete() {
        let html = sample_document();
        assert!(validate(&html).is_ok());
        assert!(!html.contains("{{"), "unreplaced placeholder in {html}");
        assert!(html.contains("<title>Invoice 2024-001</title>"));
        assert!(html.contains("Acme Corp"));
    }

    #[test]
    fn fragments_are_not_documents() {
        for fragment in [header_fragment(), body_fragment(), footer_fragment()] {
            assert!(validate(fragment).is_err());
        }
        assert!(validate(page_shell()).is_ok());
    }

    #[test]
    fn every_placeholder_has_a_value() {
        let map = sample_placeholders();
        let all = concat_fragments([page_shell(), header_fragment(), body_fragment(), footer_fragment()]);
        for (start, _) in all.match_indices("{{") {
            let end = start + all[start..].find("}}").unwrap() + 2;
            let token = &all[start..end];
            assert!(
                token == CONTENT_TOKEN || map.get(token).is_some(),
                "no value for {token}"
            );
        }
    }

    #[test]
    fn multi_page_document_is_valid() {
        let html = multi_page_document(3);
        assert!(validate(&html).is_ok());
        assert_eq!(html.matches("<h2>").count(), 3);
    }
}
