//! 目录列表页面的 HTML 生成。

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use crate::config::ServerConfig;
use crate::listing::{FileEntry, Listing};

const PAGE_TITLE: &str = "Kutta File Server";

/// 渲染完整的目录页面。
pub fn render_listing(listing: &Listing, config: &ServerConfig) -> String {
    let mut rows = String::new();
    if let Some(parent) = &listing.parent_path {
        let _ = write!(
            rows,
            r#"<tr class="parent"><td></td><td><a href="{}">⬆️ ..</a></td><td></td><td></td><td></td></tr>"#,
            encode_double_quoted_attribute(&dir_href(parent)),
        );
    }
    for entry in &listing.entries {
        rows.push_str(&render_row(listing, entry, config.read_only));
    }
    if listing.entries.is_empty() {
        rows.push_str(r#"<tr class="empty"><td colspan="5">No files</td></tr>"#);
    }

    let upload_form = if config.read_only {
        String::new()
    } else {
        r#"<form class="upload" action="/upload" method="post" enctype="multipart/form-data">
      <input type="file" name="file" required>
      <button type="submit">Upload</button>
    </form>"#
            .to_string()
    };
    let bulk_button = if config.read_only {
        ""
    } else {
        r#"<button type="submit" class="bulk-delete">Delete selected</button>"#
    };
    let location = if listing.rel_path.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", listing.rel_path)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} - {location}</title>
  <link rel="stylesheet" href="/static/app.css">
</head>
<body>
  <header>
    <h1>{title}</h1>
    <p class="location">{location}</p>
  </header>
  <main>
    <form class="search" method="get">
      <input type="search" name="q" value="{query}" placeholder="Search files">
      <button type="submit">Search</button>
    </form>
    {upload_form}
    <form class="files" action="/bulkdelete" method="post">
      <table>
        <thead><tr><th></th><th>Name</th><th>Size</th><th>Modified</th><th></th></tr></thead>
        <tbody>
{rows}
        </tbody>
      </table>
      {bulk_button}
    </form>
    <section class="clipboard">
      <h2>Clipboard</h2>
      <form id="clipboard-form">
        <textarea name="text" rows="3"></textarea>
        <button type="submit">Share</button>
      </form>
      <ul id="clipboard-entries"></ul>
      <a href="/clipboard/export">Export</a>
      <button type="button" id="clipboard-clear">Clear</button>
    </section>
  </main>
  <script src="/static/app.js"></script>
</body>
</html>
"#,
        title = PAGE_TITLE,
        location = encode_text(&location),
        query = encode_double_quoted_attribute(&listing.query),
    )
}

fn render_row(listing: &Listing, entry: &FileEntry, read_only: bool) -> String {
    let path = join_relative(&listing.rel_path, &entry.name);
    let href = if entry.is_dir {
        dir_href(&path)
    } else {
        format!("/files/{}", encode_segments(&path))
    };
    let (checkbox, delete_link) = if read_only || entry.is_dir {
        (String::new(), String::new())
    } else {
        (
            format!(
                r#"<input type="checkbox" name="files" value="{}">"#,
                encode_double_quoted_attribute(&path)
            ),
            format!(
                r#"<a class="delete" href="/delete?file={}">Delete</a>"#,
                encode_double_quoted_attribute(&urlencoding::encode(&path))
            ),
        )
    };
    format!(
        r#"<tr class="{class}"><td>{checkbox}</td><td><span class="icon">{glyph}</span> <a href="{href}">{name}</a></td><td>{size}</td><td>{modified}</td><td>{delete_link}</td></tr>
"#,
        class = entry.icon.tag(),
        glyph = entry.icon.glyph(),
        href = encode_double_quoted_attribute(&href),
        name = encode_text(&entry.name),
        size = encode_text(&entry.size),
        modified = encode_text(&entry.modified),
    )
}

fn join_relative(rel_path: &str, name: &str) -> String {
    if rel_path.is_empty() {
        name.to_string()
    } else {
        format!("{rel_path}/{name}")
    }
}

fn dir_href(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", encode_segments(path))
    }
}

fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
