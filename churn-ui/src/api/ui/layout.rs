//! Shared page chrome: header, sidebar navigation, footer

use crate::api::buildinfo::BuildInfo;

/// Sidebar entries, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Upload,
    Visualize,
    Predict,
    About,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Upload,
        Section::Visualize,
        Section::Predict,
        Section::About,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Upload => "📊 Upload Dataset",
            Section::Visualize => "📈 Visualize Data",
            Section::Predict => "🔮 Predict Churn",
            Section::About => "📝 About",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Section::Upload => "/upload",
            Section::Visualize => "/visualize",
            Section::Predict => "/predict",
            Section::About => "/about",
        }
    }
}

/// Wrap `body` in the full page with `active` highlighted in the sidebar
pub fn render_page(active: Section, body: &str) -> String {
    let build = BuildInfo::current();

    let nav: String = Section::ALL
        .iter()
        .map(|&section| {
            let class = if section == active { " class=\"active\"" } else { "" };
            format!(
                "<li><a href=\"{}\"{}>{}</a></li>",
                section.path(),
                class,
                section.label()
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Telco Churn Prediction</title>
    <link rel="stylesheet" href="/static/churn-ui.css">
</head>
<body>
    <aside class="sidebar">
        <h2>📂 Navigation</h2>
        <ul>{nav}</ul>
    </aside>
    <div class="main">
        <header>
            <h1>📞 Telco Customer Churn Prediction</h1>
            <div class="build-info">v{version} [{hash}] {profile}</div>
        </header>
        <section class="content">
{body}
        </section>
    </div>
    <footer class="footer">Telco Churn Dashboard | Built {timestamp}</footer>
</body>
</html>
"#,
        nav = nav,
        version = build.version,
        hash = build.short_hash(),
        profile = build.build_profile,
        body = body,
        timestamp = build.build_timestamp,
    )
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Table of a dataset preview
pub fn preview_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let head: String = columns
        .iter()
        .map(|c| format!("<th>{}</th>", escape_html(c)))
        .collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!("<td>{}</td>", escape_html(cell)))
                .collect();
            format!("<tr>{}</tr>", cells)
        })
        .collect();

    format!(
        "<div class=\"table-wrap\"><table class=\"preview\"><thead><tr>{}</tr></thead><tbody>{}</tbody></table></div>",
        head, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_active_section_is_marked() {
        let page = render_page(Section::Predict, "<p>hi</p>");
        assert!(page.contains("<a href=\"/predict\" class=\"active\">🔮 Predict Churn</a>"));
        assert!(page.contains("<a href=\"/about\">📝 About</a>"));
        assert!(page.contains("<p>hi</p>"));
    }

    #[test]
    fn test_preview_table_escapes_cells() {
        let html = preview_table(&["a<b".to_string()], &[vec!["x&y".to_string()]]);
        assert!(html.contains("<th>a&lt;b</th>"));
        assert!(html.contains("<td>x&amp;y</td>"));
    }
}
