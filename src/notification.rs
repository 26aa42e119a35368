use crate::theme::ThemeProperties;
use crate::utils::find_program;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const NOTIFY_PROGRAM: &str = "notify-send";
const SUMMARY: &str = "Theme Applied";

fn body(image: &Path, theme: &ThemeProperties) -> String {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.to_string_lossy().into_owned());
    format!(
        "Image: {}\nTheme: {} {}",
        name,
        theme.mode.as_str(),
        theme.scheme.as_str()
    )
}

/// Fire a desktop notification about a freshly derived theme. Never fails.
pub fn theme_applied(image: &Path, theme: &ThemeProperties) {
    let Some(program) = find_program(NOTIFY_PROGRAM) else {
        debug!("{} not on PATH, skipping notification", NOTIFY_PROGRAM);
        return;
    };

    let spawned = Command::new(program)
        .arg(SUMMARY)
        .arg(body(image, theme))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(mut child) => {
            tokio::spawn(async move {
                let _ = child.wait().await;
            });
        }
        Err(e) => debug!("Failed to send notification: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{ColorScheme, ThemeMode};

    #[test]
    fn body_names_image_and_theme() {
        let theme = ThemeProperties::new(ThemeMode::Light, ColorScheme::Neutral);
        assert_eq!(
            body(Path::new("/w/sea.png"), &theme),
            "Image: sea.png\nTheme: light scheme-neutral"
        );
    }
}
