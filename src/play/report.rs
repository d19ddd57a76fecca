use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;

use super::rollout::PublishResult;

pub const MAX_NOTES_CHARS: usize = 2800;
const EMPTY_NOTES: &str = "No release notes provided.";

/// Details shown in the rollout announcement.
#[derive(Debug, Clone)]
pub struct Announcement<'a> {
    pub app_name: &'a str,
    pub package: &'a str,
    pub release_name: &'a str,
    /// User fraction as given on the command line, shown verbatim.
    pub user_fraction: &'a str,
    pub country: &'a str,
    pub play_console_url: &'a str,
    pub github_release_url: &'a str,
    pub raw_notes: &'a str,
}

pub fn write_outputs(path: &Path, result: &PublishResult) -> Result<()> {
    std::fs::write(path, serde_json::to_string(result)?)?;
    Ok(())
}

/// Truncate to `max_chars` Unicode scalar values, ending with an ellipsis when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Link straight to the releases tab of the Play Console page.
pub fn releases_tab_link(url: &str) -> String {
    if url.contains('?') {
        format!("{url}&tab=releases")
    } else {
        format!("{url}?tab=releases")
    }
}

pub fn telegram_message(announcement: &Announcement<'_>, result: &PublishResult) -> String {
    let notes = announcement.raw_notes.trim();
    let notes = if notes.is_empty() { EMPTY_NOTES } else { notes };
    let notes = truncate_chars(notes, MAX_NOTES_CHARS);
    let play_link = releases_tab_link(announcement.play_console_url);

    let mut msg = String::new();
    msg.push_str("<b>✅ Production rollout started</b>\n\n");
    let _ = writeln!(msg, "<b>App:</b> {}", escape_html(announcement.app_name));
    let _ = writeln!(msg, "<b>Version:</b> {}", escape_html(announcement.release_name));
    let _ = writeln!(
        msg,
        "<b>VersionCode:</b> <code>{}</code>",
        escape_html(&result.version_code)
    );
    let _ = writeln!(
        msg,
        "<b>Package:</b> <code>{}</code>\n",
        escape_html(announcement.package)
    );
    let _ = writeln!(msg, "<b>Rollout:</b> {}", escape_html(announcement.user_fraction));
    let _ = writeln!(msg, "<b>Country:</b> {} only", escape_html(announcement.country));

    if result.halted_previous {
        msg.push_str(
            "\n<i>Note: Previous in-progress production rollout was halted automatically.</i>\n",
        );
    }

    let _ = writeln!(
        msg,
        "\n<b>Play Console:</b> <a href=\"{}\">Open production releases</a>",
        escape_html(&play_link)
    );
    let _ = writeln!(
        msg,
        "<b>GitHub Release:</b> <a href=\"{}\">{}</a>\n",
        escape_html(announcement.github_release_url),
        escape_html(announcement.release_name)
    );
    let _ = writeln!(msg, "<b>Release notes:</b>\n<pre>{}</pre>", escape_html(&notes));
    msg
}
