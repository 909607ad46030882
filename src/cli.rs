use clap::Parser;
use rtomato::ConfigPatch;
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "🍅 rtomato - Pomodoro focus timer for the terminal")]
pub struct Args {
    /// Work session length, e.g. 25, 25m, 1h30m
    #[arg(short, long, value_parser = parse_minutes)]
    pub work: Option<u32>,
    /// Short break length
    #[arg(short, long, value_parser = parse_minutes)]
    pub rest: Option<u32>,
    /// Long break length
    #[arg(short, long, value_parser = parse_minutes)]
    pub long_break: Option<u32>,
    /// Work sessions before a long break
    #[arg(short, long)]
    pub sessions: Option<u32>,
    /// Wait for a key press between phases
    #[arg(long)]
    pub no_auto: bool,
    /// Disable notifications (remembered for later runs)
    #[arg(long, conflicts_with = "notify")]
    pub no_notify: bool,
    /// Turn notifications back on
    #[arg(long)]
    pub notify: bool,
    #[arg(long)]
    pub no_sound: bool,
    #[arg(short = 't', long)]
    pub theme: Option<String>,
    /// Where settings, statistics and the log live
    #[arg(long, default_value = "rtomato")]
    pub data_dir: PathBuf,
    /// Print the current statistics as JSON and exit
    #[arg(long)]
    pub print_stats: bool,
}

impl Args {
    /// Overrides to layer on top of the persisted config.
    pub fn config_patch(&self) -> ConfigPatch {
        ConfigPatch {
            work_minutes: self.work,
            short_break_minutes: self.rest,
            long_break_minutes: self.long_break,
            sessions_before_long_break: self.sessions,
            auto_advance: self.no_auto.then_some(false),
            notifications: if self.notify {
                Some(true)
            } else {
                self.no_notify.then_some(false)
            },
        }
    }
}

/// Parses `90`, `25m`, `1h30m`, `45s` into whole minutes, rounding up.
/// A trailing bare number counts as minutes.
pub fn parse_minutes(s: &str) -> Result<u32, String> {
    let s = s.trim().to_lowercase();
    let mut total_secs = 0.0;
    let mut num = String::new();

    for c in s.chars() {
        match c {
            '0'..='9' | '.' => num.push(c),
            'h' => { total_secs += number(&num, "hours")? * 3600.0; num.clear(); }
            'm' => { total_secs += number(&num, "minutes")? * 60.0; num.clear(); }
            's' => { total_secs += number(&num, "seconds")?; num.clear(); }
            _ => return Err(format!("Invalid duration '{s}'")),
        }
    }
    if !num.is_empty() {
        total_secs += number(&num, "minutes")? * 60.0;
    }

    if total_secs <= 0.0 {
        return Err("Duration must be > 0".into());
    }
    Ok((total_secs / 60.0).ceil() as u32)
}

fn number(raw: &str, unit: &str) -> Result<f64, String> {
    raw.parse::<f64>().map_err(|_| format!("Invalid {unit}"))
}
