use std::path::Path;
use std::process::Command;

/// Builds a [`Command`] that runs `command_line` through the platform shell.
pub fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    }
}

/// Wraps a path in double quotes, escaping what the shell would expand.
pub fn quoted(path: &Path) -> String {
    let text = path.to_string_lossy();
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') && !cfg!(windows) {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Renders a path bare when the shell would pass it through unchanged,
/// quoted otherwise.
pub fn arg(path: &Path) -> String {
    let text = path.to_string_lossy();
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| is_shell_safe(c) || (c == '\\' && cfg!(windows)));
    if plain {
        text.into_owned()
    } else {
        quoted(path)
    }
}

/// Characters `sh` passes through unquoted. Backslash is an escape
/// character there, so it only counts as safe on Windows.
fn is_shell_safe(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | ',' | '@' | '%' | '=')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("/tmp/out.mp4", "/tmp/out.mp4")]
    #[case::space("/tmp/my clip.mp4", "\"/tmp/my clip.mp4\"")]
    #[case::semicolon("/tmp/a;rm.mp4", "\"/tmp/a;rm.mp4\"")]
    fn test_arg(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(arg(Path::new(input)), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_quoted_escapes_expansions() {
        assert_eq!(quoted(Path::new("/tmp/$HOME.mp4")), "\"/tmp/\\$HOME.mp4\"");
    }

    #[cfg(unix)]
    #[test]
    fn test_quoted_path_survives_shell() {
        let output = shell_command(&format!("printf %s {}", quoted(Path::new("a b$c"))))
            .output()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "a b$c");
    }

    #[cfg(unix)]
    #[test]
    fn test_arg_quotes_backslash() {
        assert_eq!(arg(Path::new("/tmp/a\\b.mp4")), "\"/tmp/a\\\\b.mp4\"");
    }

    #[cfg(unix)]
    #[test]
    fn test_arg_with_backslash_survives_shell() {
        let path = Path::new("/tmp/a\\b.mp4");
        let output = shell_command(&format!("printf %s {}", arg(path)))
            .output()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "/tmp/a\\b.mp4");
    }
}
