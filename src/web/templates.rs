use std::borrow::Cow;

use chrono::{Datelike, Utc};

const PAGE_BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Lucida Grande", Helvetica, Arial, sans-serif; margin: 0; background: #ffffff; color: #111827; }
        header { background: #b31b1b; color: #ffffff; padding: 1rem 1.5rem; }
        header a { color: #ffffff; text-decoration: none; font-weight: 600; }
        main { padding: 2rem 1.5rem; max-width: 960px; margin: 0 auto; box-sizing: border-box; }
        h1 { margin-top: 0; font-size: 1.6rem; }
        .panel { border: 1px solid #e5e7eb; border-radius: 8px; padding: 1.25rem 1.5rem; }
        .note { color: #4b5563; line-height: 1.6; }
        .error-detail { font-family: monospace; background: #f3f4f6; padding: 0.5rem 0.75rem; border-radius: 4px; }
        dl.listing dt { margin-top: 1.25rem; font-weight: 600; }
        dl.listing dd { margin: 0.35rem 0 0 1.5rem; }
        .list-title { font-size: 1.05rem; }
        .list-authors a, .downloads a { color: #1d4ed8; text-decoration: none; }
        .list-authors a:hover, .downloads a:hover { text-decoration: underline; }
        .downloads a { margin-right: 0.6rem; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #6b7280; }
        @media (max-width: 768px) {
            main { padding: 1.5rem 1rem; }
        }
"#;

pub struct PageLayout<'a> {
    pub meta_title: &'a str,
    pub page_heading: &'a str,
    pub body_html: Cow<'a, str>,
    pub extra_style_blocks: Vec<Cow<'a, str>>,
}

/// Wrap already-escaped body markup in the site chrome.
pub fn render_page(layout: PageLayout<'_>) -> String {
    let PageLayout {
        meta_title,
        page_heading,
        body_html,
        extra_style_blocks,
    } = layout;

    let styles = std::iter::once(Cow::Borrowed(PAGE_BASE_STYLES))
        .chain(extra_style_blocks)
        .map(|block| block.into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    let footer = render_footer();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{meta_title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <a href="/">arXiv</a>
    </header>
    <main>
        <h1>{page_heading}</h1>
{body_html}
        {footer}
    </main>
</body>
</html>"#,
        meta_title = escape_html(meta_title),
        page_heading = escape_html(page_heading),
        body_html = body_html,
        styles = styles,
        footer = footer,
    )
}

/// Short explanation page used for every error outcome.
pub fn render_message_page(title: &str, message_html: &str) -> String {
    render_page(PageLayout {
        meta_title: title,
        page_heading: title,
        body_html: Cow::Owned(format!(
            r#"        <section class="panel">
            {message_html}
        </section>"#
        )),
        extra_style_blocks: Vec::new(),
    })
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© 1991-{year} arXiv. Open access to scholarly articles.</footer>"#,
        year = current_year
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
