//! Text screens and command parsing
//!
//! Each screen renders to a plain string. Typed lines map to commands:
//!
//! | Input | Command |
//! |-------|---------|
//! | `open <category>` | open a track list (`all` lists every track) |
//! | `select <n>` | play the n-th track of the open list (1-based) |
//! | `next`, `n` / `prev`, `p` | tap skip |
//! | `swipe <n>` | carousel settles on page n (1-based) |
//! | `drag <offset>` / `release <offset>` | carousel scroll / momentum end |
//! | `seek <seconds>` | release the progress slider |
//! | `toggle`, `t` | play/pause |
//! | `retry` | retry a failed player setup |
//! | `back`, `b` / `home` | navigation |
//! | `show`, `help`, `quit` | |

use cadenza_core::{Catalog, CatalogSet, CategoryId};
use cadenza_playback::{SessionPhase, SessionSnapshot, SkipDirection, UserIntent};
use std::fmt::Write as _;

const PROGRESS_WIDTH: usize = 24;

pub const HELP: &str = "\
commands:
  open <category>     show a track list (try `open all`)
  select <n>          play track n of the open list
  next | prev         skip
  swipe <n>           swipe the carousel to page n
  drag <offset>       scroll the carousel without settling
  release <offset>    end a carousel scroll at an offset
  seek <seconds>      move the progress slider
  toggle              play/pause
  retry               retry player setup
  back | home         navigate
  show | help | quit";

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenCommand {
    /// Forward a gesture to the now-playing session
    Intent(UserIntent),
    /// Open a category list
    Open(CategoryId),
    /// Select a row of the open list (0-based)
    Select(usize),
    Back,
    Home,
    Show,
    Help,
    Quit,
}

/// Parse a typed line
///
/// Returns `Err` with a short message for anything unrecognized.
pub fn parse_command(line: &str) -> Result<ScreenCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ScreenCommand::Show);
    };
    let argument = words.next();

    let command = match verb.to_lowercase().as_str() {
        "open" | "o" => ScreenCommand::Open(CategoryId::new(required(argument, "category")?)),
        "select" | "s" => ScreenCommand::Select(one_based(argument)?),
        "next" | "n" => ScreenCommand::Intent(UserIntent::TapSkip(SkipDirection::Next)),
        "prev" | "previous" | "p" => {
            ScreenCommand::Intent(UserIntent::TapSkip(SkipDirection::Previous))
        }
        "swipe" => ScreenCommand::Intent(UserIntent::SwipeSettle(one_based(argument)?)),
        "drag" => ScreenCommand::Intent(UserIntent::Scroll(number(argument)?)),
        "release" => ScreenCommand::Intent(UserIntent::ScrollEnd(number(argument)?)),
        "seek" => ScreenCommand::Intent(UserIntent::ScrubRelease(number(argument)?)),
        "toggle" | "t" | "play" | "pause" => ScreenCommand::Intent(UserIntent::TogglePlayback),
        "retry" => ScreenCommand::Intent(UserIntent::RetryInitialization),
        "back" | "b" => ScreenCommand::Back,
        "home" => ScreenCommand::Home,
        "show" | "ls" => ScreenCommand::Show,
        "help" | "h" | "?" => ScreenCommand::Help,
        "quit" | "q" | "exit" => ScreenCommand::Quit,
        other => return Err(format!("unknown command '{}' (type `help`)", other)),
    };
    Ok(command)
}

fn required<'a>(argument: Option<&'a str>, what: &str) -> Result<&'a str, String> {
    argument.ok_or_else(|| format!("missing {}", what))
}

fn one_based(argument: Option<&str>) -> Result<usize, String> {
    let value = required(argument, "number")?;
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("expected a number from 1, got '{}'", value)),
    }
}

fn number(argument: Option<&str>) -> Result<f64, String> {
    let value = required(argument, "number")?;
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("expected a number, got '{}'", value))
}

/// Category menu
pub fn render_home(catalogs: &CatalogSet) -> String {
    let mut out = String::from("Cadenza\n\n");
    for catalog in catalogs.iter() {
        let _ = writeln!(
            out,
            "  {:<12} {} ({} tracks)",
            catalog.id.as_str(),
            catalog.title,
            catalog.len()
        );
    }
    let all = catalogs.all_tracks();
    let _ = writeln!(out, "  {:<12} {} ({} tracks)", all.id.as_str(), all.title, all.len());
    out
}

/// Track list of one category
pub fn render_track_list(catalog: &Catalog) -> String {
    let mut out = format!("{}\n\n", catalog.title);
    for (i, track) in catalog.tracks().iter().enumerate() {
        let flag = track
            .category_flag
            .as_deref()
            .map(|f| format!(" [{}]", f))
            .unwrap_or_default();
        let _ = writeln!(out, "  {:>2}. {}{}", i + 1, track.title, flag);
        let _ = writeln!(out, "      {}", track.artist);
    }
    out
}

/// Now-playing screen
pub fn render_now_playing(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();

    let Some(now_playing) = &snapshot.now_playing else {
        match &snapshot.init_error {
            Some(reason) => {
                let _ = writeln!(out, "Player setup failed: {}", reason);
                let _ = writeln!(out, "Type `retry` to try again.");
            }
            None => {
                let _ = writeln!(out, "Loading...");
            }
        }
        return out;
    };

    let flag = now_playing
        .category_flag
        .as_deref()
        .map(|f| format!("  [{}]", f))
        .unwrap_or_default();
    let _ = writeln!(out, "{}{}", now_playing.title, flag);
    let _ = writeln!(out, "{}", now_playing.artist);
    let _ = writeln!(out, "{}", carousel_dots(snapshot));
    let _ = writeln!(
        out,
        "{} {} -{}",
        now_playing.elapsed,
        progress_bar(snapshot),
        now_playing.remaining
    );

    let transport = if snapshot.session.is_playing {
        "playing"
    } else {
        "paused"
    };
    let status = match snapshot.phase {
        SessionPhase::Skipping => " (skipping)",
        SessionPhase::Seeking => " (seeking)",
        _ => "",
    };
    let _ = writeln!(
        out,
        "{} {}/{}{}",
        transport,
        snapshot.session.active_index + 1,
        snapshot.queue_len,
        status
    );
    out
}

fn carousel_dots(snapshot: &SessionSnapshot) -> String {
    (0..snapshot.queue_len)
        .map(|i| {
            if i == snapshot.carousel.settled_index {
                "*"
            } else {
                "."
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn progress_bar(snapshot: &SessionSnapshot) -> String {
    let session = &snapshot.session;
    let fraction = if session.duration_seconds > 0.0 {
        (session.position_seconds / session.duration_seconds).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * PROGRESS_WIDTH as f64).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}
