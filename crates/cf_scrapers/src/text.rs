use cf_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never shows up on screen.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Elements that start a new line when rendered.
const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if HIDDEN.contains(&name) {
                continue;
            }
            let block = BLOCKS.contains(&name);
            if block {
                out.push('\n');
            }
            collect_text(child, out);
            if block {
                out.push('\n');
            }
        }
    }
}

/// Visible text of the document's `<body>`, one trimmed line per block.
/// A document without a body yields an empty string.
pub fn extract_body_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("body")
        .map_err(|e| Error::Scraping(format!("Invalid selector: {}", e)))?;

    let Some(body) = document.select(&selector).next() else {
        return Ok(String::new());
    };

    let mut raw = String::new();
    collect_text(body, &mut raw);

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    Ok(lines.join("\n"))
}
