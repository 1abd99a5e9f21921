//! HTML pages for the served target.
//!
//! Pages are built from fixed templates with `{{ key }}` placeholders. Only
//! substitution is supported; repeated rows are rendered one fragment at a
//! time and spliced in as pre-rendered HTML.

use std::borrow::Cow;
use std::collections::HashMap;

use thiserror::Error;

use crate::target::{DirectoryDescriptor, FileDescriptor, Target};

const DIR_TEMPLATE: &str = include_str!("../templates/dir.html");
const DIR_ROW_TEMPLATE: &str = include_str!("../templates/dir_row.html");
const CHILD_ROW_TEMPLATE: &str = include_str!("../templates/child_row.html");
const ARCHIVE_TEMPLATE: &str = include_str!("../templates/archive.html");
const FILE_TEMPLATE: &str = include_str!("../templates/file.html");

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("Unknown template key: {0}")]
    UnknownKey(String),

    #[error("Unterminated placeholder at byte {0}")]
    Unterminated(usize),
}

/// A value substituted into a template
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// Plain text, escaped on output
    Text(Cow<'a, str>),
    /// Already rendered markup, inserted as is
    Html(String),
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Text(Cow::Borrowed(value))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Text(Cow::Owned(value))
    }
}

impl From<u64> for Value<'_> {
    fn from(value: u64) -> Self {
        Value::Text(Cow::Owned(value.to_string()))
    }
}

/// Substitute `vars` into `template`.
pub fn substitute(template: &str, vars: &HashMap<&str, Value<'_>>) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or(RenderError::Unterminated(offset + start))?;
        let key = after[..end].trim();

        match vars.get(key) {
            Some(Value::Text(text)) => out.push_str(&html_escape::encode_safe(text)),
            Some(Value::Html(html)) => out.push_str(html),
            None => return Err(RenderError::UnknownKey(key.to_string())),
        }

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Human readable size with binary units.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// "1 file", "3 files".
pub fn file_count(count: usize) -> String {
    match count {
        1 => "1 file".to_string(),
        n => format!("{n} files"),
    }
}

/// Link to the id-th downloadable file.
pub fn file_href(id: usize) -> String {
    format!("/files/{id}")
}

pub const ARCHIVE_HREF: &str = "/archive";

/// Link to the id-th child archive.
pub fn child_archive_href(id: usize) -> String {
    format!("{ARCHIVE_HREF}/{id}")
}

/// Render the page for a target.
pub fn render(target: &Target) -> Result<String, RenderError> {
    match target {
        Target::Directory(dir) => render_directory(dir),
        Target::File(file) => render_file(file),
    }
}

/// Render the listing page for a directory.
pub fn render_directory(dir: &DirectoryDescriptor) -> Result<String, RenderError> {
    let mut rows = String::new();
    for (id, file) in dir.files.iter().enumerate() {
        let vars = HashMap::from([
            ("name", Value::from(file.name.as_str())),
            ("href", Value::from(file_href(id))),
            ("size", Value::from(file.size)),
            ("size_human", Value::from(human_size(file.size))),
        ]);
        rows.push_str(&substitute(DIR_ROW_TEMPLATE, &vars)?);
    }

    let mut children = String::new();
    for (id, child) in dir.children.iter().enumerate() {
        let vars = HashMap::from([
            ("name", Value::from(child.name.as_str())),
            ("archive_name", Value::from(child.archive.name.as_str())),
            ("href", Value::from(child_archive_href(id))),
            ("size", Value::from(child.archive.size)),
            ("size_human", Value::from(human_size(child.archive.size))),
        ]);
        children.push_str(&substitute(CHILD_ROW_TEMPLATE, &vars)?);
    }

    let archive = match &dir.archive {
        Some(archive) => {
            let vars = HashMap::from([
                ("name", Value::from(archive.name.as_str())),
                ("href", Value::from(ARCHIVE_HREF)),
                ("size_human", Value::from(human_size(archive.size))),
            ]);
            substitute(ARCHIVE_TEMPLATE, &vars)?
        }
        None => String::new(),
    };

    let vars = HashMap::from([
        ("name", Value::from(dir.name.as_str())),
        ("count", Value::from(file_count(dir.files.len()))),
        ("archive", Value::Html(archive)),
        ("rows", Value::Html(rows)),
        ("children", Value::Html(children)),
    ]);
    substitute(DIR_TEMPLATE, &vars)
}

/// Render the download page for a single file.
pub fn render_file(file: &FileDescriptor) -> Result<String, RenderError> {
    let vars = HashMap::from([
        ("name", Value::from(file.name.as_str())),
        ("href", Value::from(file_href(0))),
        ("size", Value::from(file.size)),
        ("size_human", Value::from(human_size(file.size))),
    ]);
    substitute(FILE_TEMPLATE, &vars)
}
