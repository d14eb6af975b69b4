//! CLI option parsing per spec.md section 6's flag grammar, hand-rolled in
//! the teacher's style (a plain arg-index loop) rather than a derive-macro
//! parser — there is no external config file, so this is the only place
//! startup behavior is customized.

use crate::config::{parse_mod_spec, Key};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct CliArgs {
    pub toggle_mouse: bool,
    pub modifier: Option<Key>,
    pub escape_delay_ms: Option<u64>,
    pub scrollback: Option<usize>,
    pub title: Option<String>,
    pub status_fifo: Option<String>,
    pub cmd_fifo: Option<String>,
    pub commands: Vec<String>,
}

pub enum ParseOutcome {
    Run(CliArgs),
    Help,
    Version,
    Error(String),
}

pub fn program_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
        .unwrap_or_else(|| "tilemux".to_string())
}

pub fn print_help() {
    let prog = program_name();
    println!(
        "usage: {prog} [-?vM] [-m MOD] [-d DELAY] [-h LINES] [-t TITLE] [-s STATUS-FIFO] [-c CMD-FIFO] [cmd...]\n\n\
-?            this help\n\
-v            print version\n\
-M            toggle the mouse-enabled default\n\
-m MOD        replace the modifier key (^x means CTRL(x))\n\
-d DELAY      escape delay in ms, clamped to [50, 1000]\n\
-h LINES      scrollback history size\n\
-t TITLE      static outer-terminal title\n\
-s FIFO       open-or-create a status fifo\n\
-c FIFO       open-or-create a command fifo\n\
cmd...        positional arguments each start one tile"
    );
}

pub fn print_version() {
    println!("{} {}", program_name(), VERSION);
}

/// Parse argv (excluding argv[0]) per spec.md section 6. Positional
/// arguments accumulate in `commands`, one tile each.
pub fn parse(args: &[String]) -> ParseOutcome {
    let mut out = CliArgs {
        toggle_mouse: false,
        modifier: None,
        escape_delay_ms: None,
        scrollback: None,
        title: None,
        status_fifo: None,
        cmd_fifo: None,
        commands: Vec::new(),
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-?" => return ParseOutcome::Help,
            "-v" => return ParseOutcome::Version,
            "-M" => out.toggle_mouse = true,
            "-m" => {
                let Some(v) = args.get(i + 1) else { return ParseOutcome::Error("-m requires an argument".into()) };
                let Some(key) = parse_mod_spec(v) else { return ParseOutcome::Error(format!("bad -m argument: {v}")) };
                out.modifier = Some(key);
                i += 1;
            }
            "-d" => {
                let Some(v) = args.get(i + 1) else { return ParseOutcome::Error("-d requires an argument".into()) };
                let Ok(ms) = v.parse::<u64>() else { return ParseOutcome::Error(format!("bad -d argument: {v}")) };
                out.escape_delay_ms = Some(ms.clamp(50, 1000));
                i += 1;
            }
            "-h" => {
                let Some(v) = args.get(i + 1) else { return ParseOutcome::Error("-h requires an argument".into()) };
                let Ok(n) = v.parse::<usize>() else { return ParseOutcome::Error(format!("bad -h argument: {v}")) };
                out.scrollback = Some(n);
                i += 1;
            }
            "-t" => {
                let Some(v) = args.get(i + 1) else { return ParseOutcome::Error("-t requires an argument".into()) };
                out.title = Some(v.clone());
                i += 1;
            }
            "-s" => {
                let Some(v) = args.get(i + 1) else { return ParseOutcome::Error("-s requires an argument".into()) };
                out.status_fifo = Some(v.clone());
                i += 1;
            }
            "-c" => {
                let Some(v) = args.get(i + 1) else { return ParseOutcome::Error("-c requires an argument".into()) };
                out.cmd_fifo = Some(v.clone());
                i += 1;
            }
            other => out.commands.push(other.to_string()),
        }
        i += 1;
    }
    ParseOutcome::Run(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_collects_positional_commands() {
        let ParseOutcome::Run(out) = parse(&args(&["vim", "htop"])) else { panic!() };
        assert_eq!(out.commands, vec!["vim", "htop"]);
    }

    #[test]
    fn parse_clamps_escape_delay() {
        let ParseOutcome::Run(out) = parse(&args(&["-d", "5"])) else { panic!() };
        assert_eq!(out.escape_delay_ms, Some(50));
    }

    #[test]
    fn parse_rejects_bad_mod() {
        assert!(matches!(parse(&args(&["-m", "xyz"])), ParseOutcome::Error(_)));
    }

    #[test]
    fn parse_help_and_version_short_circuit() {
        assert!(matches!(parse(&args(&["-?"])), ParseOutcome::Help));
        assert!(matches!(parse(&args(&["-v"])), ParseOutcome::Version));
    }
}
