use crate::ui::{Theme, get_theme};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rtomato::{ConfigPatch, Notifier, Phase, Persistence, SessionController, Status};
use serde::{Deserialize, Serialize};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::{Duration, Instant},
};

pub const UI_KEY: &str = "ui";
const BANNER_TTL: Duration = Duration::from_secs(5);
pub const THEMES: &[&str] = &["default", "nord", "dracula", "gruvbox", "solarized"];

// ============================================================================
// Notifications
// ============================================================================

pub struct Banner {
    pub title: String,
    pub body: String,
    shown_at: Instant,
}

pub type BannerSlot = Rc<RefCell<Option<Banner>>>;

/// Forwards to the desktop notifier and mirrors the message in an
/// in-terminal banner. Whether anything is sent at all is up to the
/// controller's `notifications` setting.
pub struct TerminalNotifier {
    desktop: Box<dyn Notifier>,
    banner: BannerSlot,
}

impl TerminalNotifier {
    pub fn new(desktop: impl Notifier + 'static, banner: BannerSlot) -> Self {
        Self {
            desktop: Box::new(desktop),
            banner,
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.desktop.notify(title, body);
        *self.banner.borrow_mut() = Some(Banner {
            title: title.into(),
            body: body.into(),
            shown_at: Instant::now(),
        });
    }
}

// ============================================================================
// View State
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct UiPrefs {
    pub theme: String,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            theme: "default".into(),
        }
    }
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum View {
    Timer,
    Help,
    Stats,
    Settings,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum SettingsField {
    WorkMinutes,
    ShortBreakMinutes,
    LongBreakMinutes,
    SessionsBeforeLongBreak,
    AutoAdvance,
    Notifications,
    Theme,
}

impl SettingsField {
    pub const ALL: [SettingsField; 7] = [
        Self::WorkMinutes,
        Self::ShortBreakMinutes,
        Self::LongBreakMinutes,
        Self::SessionsBeforeLongBreak,
        Self::AutoAdvance,
        Self::Notifications,
        Self::Theme,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|&f| f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub struct AppState {
    pub current_view: View,
    pub theme: Theme,
    pub prefs: UiPrefs,
    pub minimized: bool,
    pub settings_field: SettingsField,
    pub settings_editing: bool,
    pub settings_input: String,
    pub settings_error: Option<String>,
    pub animation_frame: u8,
    pub banner: BannerSlot,
    /// Set by the controller listener whenever the session changes.
    pub redraw: Rc<Cell<bool>>,
    ui_store: Persistence,
}

impl AppState {
    pub fn new(ui_store: Persistence, theme_override: Option<String>, banner: BannerSlot) -> Self {
        let mut prefs = ui_store.load(UI_KEY, UiPrefs::default());
        if let Some(theme) = theme_override {
            prefs.theme = theme;
        }

        Self {
            current_view: View::Timer,
            theme: get_theme(&prefs.theme),
            prefs,
            minimized: false,
            settings_field: SettingsField::WorkMinutes,
            settings_editing: false,
            settings_input: String::new(),
            settings_error: None,
            animation_frame: 0,
            banner,
            redraw: Rc::new(Cell::new(true)),
            ui_store,
        }
    }

    pub fn attach(&self, controller: &mut SessionController) {
        let redraw = self.redraw.clone();
        controller.subscribe(move |_| redraw.set(true));
    }

    /// Advances animation and expires the banner.
    pub fn update(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1) % 20;

        let expired = self
            .banner
            .borrow()
            .as_ref()
            .is_some_and(|b| b.shown_at.elapsed() >= BANNER_TTL);
        if expired {
            *self.banner.borrow_mut() = None;
            self.redraw.set(true);
        }
    }

    fn save_prefs(&mut self) {
        self.ui_store.save(UI_KEY, &self.prefs);
    }
}

// ============================================================================
// Event Handlers
// ============================================================================

/// Returns `true` when the user asked to quit.
pub fn handle_input(key: KeyEvent, app: &mut AppState, controller: &mut SessionController) -> bool {
    app.redraw.set(true);

    if app.settings_editing {
        match key.code {
            KeyCode::Char(c) => app.settings_input.push(c),
            KeyCode::Backspace => { app.settings_input.pop(); }
            KeyCode::Enter => apply_setting(app, controller),
            KeyCode::Esc => {
                app.settings_editing = false;
                app.settings_input.clear();
                app.settings_error = None;
            }
            _ => {}
        }
        return false;
    }

    match app.current_view {
        View::Settings => handle_settings_view(key, app, controller),
        _ => handle_main_view(key, app, controller),
    }
}

fn handle_settings_view(key: KeyEvent, app: &mut AppState, controller: &mut SessionController) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('d') => {
            app.current_view = View::Timer;
            app.settings_error = None;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.settings_field = app.settings_field.next();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.settings_field = app.settings_field.prev();
        }
        KeyCode::Enter | KeyCode::Char('e') => {
            start_editing(app, controller);
        }
        KeyCode::Char(' ') => {
            let config = controller.config();
            let patch = match app.settings_field {
                SettingsField::AutoAdvance => ConfigPatch {
                    auto_advance: Some(!config.auto_advance),
                    ..Default::default()
                },
                SettingsField::Notifications => ConfigPatch {
                    notifications: Some(!config.notifications),
                    ..Default::default()
                },
                _ => return false,
            };
            apply_patch(app, controller, &patch);
        }
        KeyCode::Left | KeyCode::Char('h') => {
            if app.settings_field == SettingsField::Theme {
                cycle_theme(app, false);
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if app.settings_field == SettingsField::Theme {
                cycle_theme(app, true);
            }
        }
        _ => {}
    }
    false
}

fn handle_main_view(key: KeyEvent, app: &mut AppState, controller: &mut SessionController) -> bool {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) ||
       (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)) {
        return true;
    }

    if matches!(key.code, KeyCode::Char('m') | KeyCode::Char('M')) {
        app.minimized = !app.minimized;
        return false;
    }

    if app.minimized && key.code != KeyCode::Char(' ') {
        return false;
    }

    match key.code {
        KeyCode::Char(' ') => {
            if controller.status() == Status::Running {
                controller.pause();
            } else {
                controller.start();
            }
        }
        KeyCode::Char('r') => controller.reset(),
        KeyCode::Char('n') => { controller.skip(); }
        KeyCode::Char('1') => controller.set_phase(Phase::Work),
        KeyCode::Char('2') => controller.set_phase(Phase::ShortBreak),
        KeyCode::Char('3') => controller.set_phase(Phase::LongBreak),
        KeyCode::Char('d') => app.current_view = View::Settings,
        KeyCode::Char('h') | KeyCode::Char('?') => {
            app.current_view = if app.current_view == View::Help {
                View::Timer
            } else {
                View::Help
            };
        }
        KeyCode::Char('s') => {
            app.current_view = if app.current_view == View::Timer {
                View::Stats
            } else {
                View::Timer
            };
        }
        _ => {}
    }

    false
}

fn start_editing(app: &mut AppState, controller: &SessionController) {
    let config = controller.config();
    let value = match app.settings_field {
        SettingsField::WorkMinutes => config.work_minutes,
        SettingsField::ShortBreakMinutes => config.short_break_minutes,
        SettingsField::LongBreakMinutes => config.long_break_minutes,
        SettingsField::SessionsBeforeLongBreak => config.sessions_before_long_break,
        _ => return,
    };

    app.settings_input = value.to_string();
    app.settings_editing = true;
    app.settings_error = None;
}

fn apply_setting(app: &mut AppState, controller: &mut SessionController) {
    let value = match app.settings_input.trim().parse::<u32>() {
        Ok(v) => v,
        Err(_) => {
            app.settings_error = Some("Please enter a whole number".into());
            return;
        }
    };

    let patch = match app.settings_field {
        SettingsField::WorkMinutes => ConfigPatch { work_minutes: Some(value), ..Default::default() },
        SettingsField::ShortBreakMinutes => ConfigPatch { short_break_minutes: Some(value), ..Default::default() },
        SettingsField::LongBreakMinutes => ConfigPatch { long_break_minutes: Some(value), ..Default::default() },
        SettingsField::SessionsBeforeLongBreak => ConfigPatch { sessions_before_long_break: Some(value), ..Default::default() },
        _ => ConfigPatch::default(),
    };

    if apply_patch(app, controller, &patch) {
        app.settings_editing = false;
        app.settings_input.clear();
    }
}

fn apply_patch(app: &mut AppState, controller: &mut SessionController, patch: &ConfigPatch) -> bool {
    match controller.update_config(patch) {
        Ok(()) => {
            app.settings_error = None;
            true
        }
        Err(e) => {
            log::warn!("Rejected settings change: {e}");
            app.settings_error = Some(e.to_string());
            false
        }
    }
}

fn cycle_theme(app: &mut AppState, forward: bool) {
    let idx = THEMES.iter().position(|&t| t == app.prefs.theme).unwrap_or(0);
    let new_idx = if forward {
        (idx + 1) % THEMES.len()
    } else {
        (idx + THEMES.len() - 1) % THEMES.len()
    };

    app.prefs.theme = THEMES[new_idx].into();
    app.theme = get_theme(&app.prefs.theme);
    app.save_prefs();
}
