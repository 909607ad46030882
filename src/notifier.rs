use log::debug;
use notify_rust::{Notification, Urgency};
use std::{
    path::Path,
    process::{Command, Stdio},
};

/// Fire-and-forget user alert.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
}

/// Desktop notification plus an optional chime played through whichever
/// system player and sound file exist.
#[derive(Clone, Debug)]
pub struct DesktopNotifier {
    sound: bool,
}

impl DesktopNotifier {
    pub fn new(sound: bool) -> Self {
        Self { sound }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        if let Err(e) = Notification::new()
            .summary(title)
            .body(body)
            .appname("rtomato")
            .icon("alarm-clock")
            .urgency(Urgency::Critical)
            .show()
        {
            debug!("Desktop notification unavailable: {e}");
        }

        if self.sound {
            std::thread::spawn(play_chime);
        }
    }
}

fn play_chime() {
    for (cmd, file) in [
        ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
        ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
        ("aplay", "/usr/share/sounds/generic.wav"),
    ] {
        if Path::new(file).exists() {
            let _ = Command::new(cmd)
                .arg(file)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            break;
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}
