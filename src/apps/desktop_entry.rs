use super::AppEntry;

/// Exec field codes that expand to arguments we never supply.
const FIELD_CODES: &[&str] = &[
    "%f", "%F", "%u", "%U", "%d", "%D", "%n", "%N", "%i", "%c", "%k", "%v", "%m",
];

fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key).map(str::trim)
}

fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Parse the `[Desktop Entry]` group of a .desktop file.
///
/// Returns `None` for anything that shouldn't be launchable from the picker:
/// missing `Name`/`Exec`, a `Type` other than `Application`, or
/// `NoDisplay`/`Hidden` set.
pub fn parse_desktop_entry(id: &str, content: &str) -> Option<AppEntry> {
    let mut name = None;
    let mut exec = None;
    let mut icon = None;
    let mut comment = None;
    let mut kind = None;
    let mut terminal = None;
    let mut no_display = None;
    let mut hidden = None;
    let mut in_desktop_entry = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') {
            in_desktop_entry = trimmed == "[Desktop Entry]";
            continue;
        }
        if !in_desktop_entry || trimmed.starts_with('#') {
            continue;
        }

        if let Some(val) = strip_key(trimmed, "Name=") {
            name = Some(val);
        } else if let Some(val) = strip_key(trimmed, "Exec=") {
            exec = Some(val);
        } else if let Some(val) = strip_key(trimmed, "Icon=") {
            icon = Some(val);
        } else if let Some(val) = strip_key(trimmed, "Comment=") {
            comment = Some(val);
        } else if let Some(val) = strip_key(trimmed, "Type=") {
            kind = Some(val);
        } else if let Some(val) = strip_key(trimmed, "Terminal=") {
            terminal = Some(val);
        } else if let Some(val) = strip_key(trimmed, "NoDisplay=") {
            no_display = Some(val);
        } else if let Some(val) = strip_key(trimmed, "Hidden=") {
            hidden = Some(val);
        }
    }

    if kind.is_some_and(|k| k != "Application") || is_true(no_display) || is_true(hidden) {
        return None;
    }

    let name = name.filter(|n| !n.is_empty())?;
    let exec = strip_field_codes(exec?);
    if exec.is_empty() {
        return None;
    }

    Some(AppEntry {
        id: id.to_string(),
        name: name.to_string(),
        comment: comment.filter(|c| !c.is_empty()).map(String::from),
        exec,
        icon: icon.filter(|i| !i.is_empty()).map(String::from),
        terminal: is_true(terminal),
    })
}

/// Drop `%f`-style field codes; `%%` becomes a literal `%`.
pub fn strip_field_codes(exec: &str) -> String {
    exec.split_whitespace()
        .filter(|token| !FIELD_CODES.contains(token))
        .map(|token| token.replace("%%", "%"))
        .collect::<Vec<_>>()
        .join(" ")
}
