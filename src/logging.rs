use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use colored::{Color, Colorize as _};
use env_logger::{Builder, Env, Target, WriteStyle};
use log::Level;

/// Sets up logging to stdout and, if a path is given, appended to that file.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::new();

    builder.parse_env(get_env());

    if let Some(path) = log_file {
        let file = open_log_file(path)
            .with_context(|| format!("Could not open log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(Tee { file })));
        // A pipe target would otherwise lose colours on stdout too; `colored`
        // already decides per terminal, and the tee strips them for the file.
        builder.write_style(WriteStyle::Always);
    }

    builder.format(|f, record| {
        let time = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string().dimmed();
        let color = color_by_level(record.level());
        let level = level_to_str(record.level()).color(color);
        let target = record.target().dimmed();
        let line = record.line().unwrap_or_default();
        let message = record.args().to_string().color(color);

        writeln!(f, "{time} [{level}@{target}:{line}] {message}")
    });

    builder.try_init().context("Logger was already initialized")
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Writes every log line to stdout as is and to the log file without colours.
struct Tee<W> {
    file: W,
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(&strip_ansi_codes(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

/// Removes CSI escape sequences such as `\x1b[1;31m`.
fn strip_ansi_codes(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len());
    let mut bytes = buf.iter().copied();

    while let Some(b) = bytes.next() {
        if b != 0x1b {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'[') => {
                // Parameters run until the final byte in 0x40..=0x7e.
                for c in bytes.by_ref() {
                    if (0x40..=0x7e).contains(&c) {
                        break;
                    }
                }
            }
            Some(_) | None => {}
        }
    }
    out
}

fn get_env() -> Env<'static> {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    Env::default().default_filter_or(default_level)
}

const fn color_by_level(level: Level) -> Color {
    match level {
        Level::Trace => Color::Magenta,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

const fn level_to_str(level: Level) -> &'static str {
    match level {
        Level::Trace => "T",
        Level::Debug => "D",
        Level::Info => "I",
        Level::Warn => "W",
        Level::Error => "E",
    }
}

#[cfg(test)]
mod tests {
    use colored::Colorize as _;

    use super::*;

    #[test]
    fn strips_colours() {
        colored::control::set_override(true);
        let line = format!("{} [{}] {}\n", "12:00".dimmed(), "E".red(), "boom".red());
        assert_ne!(line.as_bytes(), b"12:00 [E] boom\n");
        assert_eq!(strip_ansi_codes(line.as_bytes()), b"12:00 [E] boom\n");
    }

    #[test]
    fn leaves_plain_text_and_utf8_alone() {
        let line = "Сбой в работе программы: [x]\n".as_bytes();
        assert_eq!(strip_ansi_codes(line), line);
    }

    #[test]
    fn tee_writes_plain_text_to_file() {
        colored::control::set_override(true);
        let mut tee = Tee { file: Vec::new() };
        let line = format!("{}\n", "hello".green());
        tee.write_all(line.as_bytes()).unwrap();
        tee.flush().unwrap();
        assert_eq!(tee.file, b"hello\n");
    }
}
