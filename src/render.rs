//! Pure HTML rendering for the banner snippet and the notice document.
//!
//! Nothing here touches the file system; callers decide where the output goes.

use std::fmt::Write as _;

use crate::models::{Notice, Slide, SlideKind};

/// `src` prefix of banner media as seen from the page embedding the snippet.
pub const DEFAULT_MEDIA_HREF: &str = "./banner/banner_img/";

pub const NOTICE_TABLE_ID: &str = "noticeTable";

/// Inner HTML of `<head>` for a freshly bootstrapped notice document.
pub const DEFAULT_NOTICE_HEAD: &str = r#"
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css">
    <style>
        .badge {
            padding: 4px 12px;
            border-radius: 20px;
            font-size: 12px;
            font-weight: bold;
            display: inline-flex;
            align-items: center;
            gap: 4px;
        }
        .bg-red-100 { background-color: #fee2e2; } .text-red-800 { color: #991b1b; }
        .bg-blue-100 { background-color: #dbeafe; } .text-blue-800 { color: #1e40af; }
        .bg-green-100 { background-color: #d1fae5; } .text-green-800 { color: #065f46; }
        .bg-yellow-100 { background-color: #fef3c7; } .text-yellow-800 { color: #92400e; }
        .bg-gray-100 { background-color: #f3f4f6; } .text-gray-800 { color: #374151; }
        .notice-content {
            margin-bottom: 10px;
            line-height: 1.5;
        }
        .download-link {
            margin-right: 12px;
            display: inline-flex;
            align-items: center;
            gap: 6px;
            text-decoration: none;
            transition: color 0.2s;
        }
        .download-link:hover {
            color: #3b82f6;
        }
    </style>
"#;

/// Escapes text and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

// ---------------------------------------------------------------- banner

/// Regenerates the whole banner snippet; the first slide is the one shown initially.
pub fn render_banner(slides: &[Slide], media_href: &str) -> String {
    let mut html = String::from(
        "<!-- Banner Start -->\n\
         <div id=\"slideContainer\">\n    \
         <button id=\"close\" class=\"closeBtn\">&times;</button>\n    \
         <button id=\"prev\" class=\"sliderBtn\">&lt;</button>\n    \
         <button id=\"next\" class=\"sliderBtn\">&gt;</button>\n",
    );

    for (i, slide) in slides.iter().enumerate() {
        let active = if i == 0 { " show" } else { "" };
        let src = escape(&format!("{media_href}{}", slide.file));
        let file = escape(&slide.file);
        let caption = escape(&slide.caption);

        let _ = writeln!(html, "    <div class=\"slide{active}\">");
        match slide.kind {
            SlideKind::Image => {
                let _ = writeln!(html, "        <img src=\"{src}\" />");
                let _ = writeln!(html, "        <p>\"{caption}\"</p>");
            }
            SlideKind::Video => {
                html.push_str("        <video controls>\n");
                let _ = writeln!(html, "            <source src=\"{src}\" type=\"video/mp4\">");
                html.push_str("        </video>\n");
                let _ = writeln!(html, "        <p>{caption}</p>");
            }
        }
        let _ = writeln!(
            html,
            "        <a href=\"{src}\" download=\"{file}\" class=\"downloadBtn\">Download</a>"
        );
        html.push_str("    </div>\n");
    }

    html.push_str(
        "</div>\n\
         <script src='./banner/script_banner.js'></script>\n\
         <!-- Banner End -->\n",
    );
    html
}

// ---------------------------------------------------------------- notices

pub fn render_notice_row(notice: &Notice) -> String {
    let style = notice.badge.style();
    let date = escape(notice.date.as_str());

    let mut row = format!("<tr data-id=\"{}\"", notice.id);
    if let Some(created) = notice.created_at {
        let _ = write!(row, " data-created=\"{}\"", created.to_rfc3339());
    }
    row.push_str(">\n");
    let _ = writeln!(
        row,
        "<td class=\"font-medium text-gray-900\" data-label=\"Title\">{}</td>",
        escape(&notice.title)
    );
    row.push_str("<td class=\"text-gray-700\" data-label=\"Content\">\n");
    let _ = writeln!(row, "    <div class=\"notice-content\">{}</div>", escape(&notice.content));
    if let (Some(link), Some(name)) = (notice.file_link.as_deref(), notice.file_name()) {
        let _ = writeln!(
            row,
            "    <a href=\"{}\" target=\"_blank\" class=\"download-link text-blue-600\"><i class=\"fas fa-paperclip\"></i> {}</a>",
            escape(link),
            escape(name)
        );
    }
    let _ = writeln!(
        row,
        "    <span class=\"badge {}\">{} {}</span>",
        style.class_pair(),
        style.icon(),
        escape(notice.badge.label())
    );
    row.push_str("</td>\n");
    let _ = writeln!(
        row,
        "<td class=\"text-gray-600\" data-label=\"Date\" data-sort=\"{}\" data-date=\"{date}\">",
        notice.date.sort_key()
    );
    let _ = writeln!(
        row,
        "    <div class=\"font-medium\"><i class=\"far fa-calendar-alt\"></i> {date}</div>"
    );
    row.push_str("</td>\n</tr>\n");
    row
}

/// Renders the notice table with rows in stored order.
pub fn render_notice_table(notices: &[Notice]) -> String {
    let mut table = format!(
        "<table id=\"{NOTICE_TABLE_ID}\">\n        \
         <thead><tr><th>Title</th><th>Content</th><th>Date</th></tr></thead>\n        \
         <tbody>\n"
    );
    for notice in notices {
        table.push_str(&render_notice_row(notice));
    }
    table.push_str("        </tbody>\n    </table>");
    table
}

/// Pieces of a notice document that are kept around the table on rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentShell {
    pub head: String,
    pub before_table: String,
    pub after_table: String,
}

impl Default for DocumentShell {
    fn default() -> Self {
        Self {
            head: DEFAULT_NOTICE_HEAD.to_string(),
            before_table: "\n    ".to_string(),
            after_table: "\n".to_string(),
        }
    }
}

pub fn render_notice_document(shell: &DocumentShell, notices: &[Notice]) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>{}</head>\n<body>{}{}{}</body>\n</html>\n",
        shell.head,
        shell.before_table,
        render_notice_table(notices),
        shell.after_table
    )
}
