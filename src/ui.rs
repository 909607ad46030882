use crate::app::{AppState, SettingsField, View};
use ratatui::{prelude::*, widgets::*};
use rtomato::{Phase, SessionConfig, Snapshot, Status};

#[derive(Clone, Copy)]
pub struct Theme {
    work_color: Color,
    short_break_color: Color,
    long_break_color: Color,
    border_color: Color,
    accent_color: Color,
}

impl Theme {
    fn phase_color(&self, phase: Phase) -> Color {
        match phase {
            Phase::Work => self.work_color,
            Phase::ShortBreak => self.short_break_color,
            Phase::LongBreak => self.long_break_color,
        }
    }
}

pub fn get_theme(name: &str) -> Theme {
    match name {
        "nord" => Theme {
            work_color: Color::Rgb(136, 192, 208),
            short_break_color: Color::Rgb(163, 190, 140),
            long_break_color: Color::Rgb(180, 142, 173),
            border_color: Color::Rgb(94, 129, 172),
            accent_color: Color::Rgb(235, 203, 139),
        },
        "dracula" => Theme {
            work_color: Color::Rgb(189, 147, 249),
            short_break_color: Color::Rgb(80, 250, 123),
            long_break_color: Color::Rgb(139, 233, 253),
            border_color: Color::Rgb(98, 114, 164),
            accent_color: Color::Rgb(255, 121, 198),
        },
        "gruvbox" => Theme {
            work_color: Color::Rgb(254, 128, 25),
            short_break_color: Color::Rgb(184, 187, 38),
            long_break_color: Color::Rgb(131, 165, 152),
            border_color: Color::Rgb(213, 196, 161),
            accent_color: Color::Rgb(250, 189, 47),
        },
        "solarized" => Theme {
            work_color: Color::Rgb(203, 75, 22),
            short_break_color: Color::Rgb(42, 161, 152),
            long_break_color: Color::Rgb(38, 139, 210),
            border_color: Color::Rgb(88, 110, 117),
            accent_color: Color::Rgb(181, 137, 0),
        },
        _ => Theme {
            work_color: Color::Rgb(255, 99, 71),
            short_break_color: Color::Rgb(0, 200, 150),
            long_break_color: Color::Rgb(100, 181, 246),
            border_color: Color::Rgb(0, 200, 255),
            accent_color: Color::Rgb(255, 165, 0),
        },
    }
}

// ============================================================================
// UI Rendering
// ============================================================================

pub fn render_ui(f: &mut Frame, app: &AppState, snap: &Snapshot, config: &SessionConfig) {
    if app.minimized {
        render_minimized(f, app, snap);
    } else {
        match app.current_view {
            View::Timer => render_timer(f, app, snap),
            View::Help => render_help(f, app),
            View::Stats => render_stats(f, app, snap),
            View::Settings => render_settings(f, app, config),
        }
    }
}

fn status_text(snap: &Snapshot, frame: u8) -> (String, Color) {
    match snap.status {
        Status::Running => {
            let label = if snap.phase == Phase::Work { "Stay focused!" } else { "Take a break" };
            (format!("{} {}", if frame < 10 { "●" } else { "○" }, label), Color::Green)
        }
        Status::Paused => (
            format!("⏸  PAUSED{}", ".".repeat((frame / 5) as usize % 4)),
            Color::Yellow,
        ),
        Status::Idle => ("Ready to focus".into(), Color::Gray),
    }
}

fn render_minimized(f: &mut Frame, app: &AppState, snap: &Snapshot) {
    let area = centered_rect(40, 30, f.size());
    let color = app.theme.phase_color(snap.phase);
    let (status, status_color) = status_text(snap, app.animation_frame);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(snap.phase.label(), Style::default()
            .fg(color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(snap.remaining_clock(), Style::default()
            .fg(color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(status, Style::default().fg(status_color))),
        Line::from(""),
        Line::from(Span::styled("Press M to restore", Style::default()
            .fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered(" 🍅 RTOMATO ", app)),
        area,
    );
}

fn render_timer(f: &mut Frame, app: &AppState, snap: &Snapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());
    let color = app.theme.phase_color(snap.phase);

    // Header
    let header = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.border_color))
        .title(Span::styled(" 🍅 RTOMATO ", Style::default()
            .fg(app.theme.accent_color).add_modifier(Modifier::BOLD)));
    f.render_widget(header, chunks[0]);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(10),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Percentage(10),
        ])
        .split(chunks[1]);

    // Tabs
    let tabs: Vec<Span> = Phase::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, &phase)| {
            let style = if phase == snap.phase {
                Style::default().fg(app.theme.phase_color(phase)).add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [Span::styled(format!(" {} {} ", i + 1, phase.label()), style), Span::raw("  ")]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(tabs)).alignment(Alignment::Center), sections[1]);

    // Timer
    f.render_widget(
        Paragraph::new(vec![Line::from(""), Line::from(snap.remaining_clock())])
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[3],
    );

    // Status
    let (status, status_color) = status_text(snap, app.animation_frame);
    f.render_widget(
        Paragraph::new(status)
            .style(Style::default().fg(status_color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[5],
    );

    // Progress
    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(color).bg(Color::Black))
            .percent((snap.progress_ratio() * 100.0) as u16),
        sections[7],
    );

    // Session info
    let in_cycle = if snap.phase == Phase::Work {
        snap.cycle_position + 1
    } else {
        snap.cycle_position.max(1)
    };
    let session_text = format!(
        "Session {} of {}  •  {} completed today  •  streak {}",
        in_cycle.min(snap.sessions_before_long_break),
        snap.sessions_before_long_break,
        snap.completed_today,
        snap.current_streak,
    );
    f.render_widget(
        Paragraph::new(session_text).style(Style::default().fg(Color::Gray)).alignment(Alignment::Center),
        sections[9],
    );

    // Banner
    if let Some(banner) = app.banner.borrow().as_ref() {
        let lines = vec![
            Line::from(Span::styled(banner.title.clone(), Style::default()
                .fg(app.theme.accent_color).add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(banner.body.clone(), Style::default().fg(Color::White))),
        ];
        f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), sections[11]);
    }

    // Controls
    let controls = vec![
        Line::from(vec![
            span_key("Space", app), Span::raw(" Start/Pause  •  "),
            span_key("R", app), Span::raw(" Reset  •  "),
            span_key("N", app), Span::raw(" Skip break  •  "),
            span_key("1-3", app), Span::raw(" Phase"),
        ]),
        Line::from(vec![
            span_key("S", app), Span::raw(" Stats  •  "),
            span_key("D", app), Span::raw(" Settings  •  "),
            span_key("M", app), Span::raw(" Minimize  •  "),
            span_key("H", app), Span::raw(" Help  •  "),
            span_key("Q", app), Span::raw(" Quit"),
        ]),
    ];
    f.render_widget(
        Paragraph::new(controls).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn span_key<'a>(text: &'a str, app: &AppState) -> Span<'a> {
    Span::styled(text, Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD))
}

fn bordered<'a>(title: &'a str, app: &AppState) -> Block<'a> {
    Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.border_color))
}

fn render_help(f: &mut Frame, app: &AppState) {
    let area = centered_rect(70, 85, f.size());
    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("⌨️  KEYBOARD SHORTCUTS", Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("  Timer Controls:"),
        help_line("Space", "Start / pause / resume"),
        help_line("R", "Reset current phase"),
        help_line("N", "Skip the current break"),
        help_line("1 / 2 / 3", "Switch to work / short break / long break"),
        help_line("M", "Minimize to compact view"),
        Line::from(""),
        Line::from("  Navigation:"),
        help_line("S", "Statistics"),
        help_line("D", "Settings"),
        help_line("H / ?", "Toggle help"),
        Line::from(""),
        Line::from("  General:"),
        help_line("Q / Esc", "Exit / Go back"),
        help_line("Ctrl+C", "Force quit"),
        Line::from(""),
        Line::from(Span::styled("💡 Work sessions can't be skipped; only finished ones count toward your streak.",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
    ];

    f.render_widget(
        Paragraph::new(help_text).alignment(Alignment::Left).block(bordered(" Help ", app)),
        area,
    );
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("    "),
        Span::styled(key, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}", desc)),
    ])
}

fn render_stats(f: &mut Frame, app: &AppState, snap: &Snapshot) {
    let area = centered_rect(70, 85, f.size());
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("📊 STATISTICS", Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("  📅 Today:", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
        stat_line("Sessions completed", snap.completed_today.to_string()),
        stat_line("Focus time", format!("{}m", snap.total_focus_minutes)),
        stat_line("Current streak", snap.current_streak.to_string()),
        Line::from(""),
        Line::from(Span::styled("  🏆 All Time:", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))),
        stat_line("Longest streak", snap.longest_streak.to_string()),
        Line::from(""),
        Line::from(Span::styled("  📈 This Week:", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];

    let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    let max = snap.weekly_sessions.iter().copied().max().unwrap_or(0).max(1);
    for (day, &count) in days.iter().zip(snap.weekly_sessions.iter()) {
        let width = (count as f64 / max as f64 * 30.0) as usize;
        lines.push(Line::from(vec![
            Span::styled(format!("     {} ", day), Style::default().fg(Color::Gray)),
            Span::styled("█".repeat(width), Style::default().fg(app.theme.accent_color)),
            Span::raw(format!(" {}", count)),
        ]));
    }

    f.render_widget(Paragraph::new(lines).block(bordered(" Statistics ", app)), area);
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("     {}: ", label)),
        Span::styled(value, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
    ])
}

fn on_off(flag: bool) -> String {
    if flag { "ON" } else { "OFF" }.into()
}

fn render_settings(f: &mut Frame, app: &AppState, config: &SessionConfig) {
    let area = centered_rect(70, 85, f.size());
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("⚙️  SETTINGS", Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("  ↑↓/jk: Navigate  •  Enter: Edit  •  Space: Toggle  •  ←→/hl: Themes",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
    ];

    let settings = [
        (SettingsField::WorkMinutes, "🎯 Work Duration", format!("{} min", config.work_minutes)),
        (SettingsField::ShortBreakMinutes, "☕ Short Break", format!("{} min", config.short_break_minutes)),
        (SettingsField::LongBreakMinutes, "🌴 Long Break", format!("{} min", config.long_break_minutes)),
        (SettingsField::SessionsBeforeLongBreak, "🔄 Sessions Before Long Break", format!("{} sessions", config.sessions_before_long_break)),
        (SettingsField::AutoAdvance, "▶️  Auto-Start Next Phase", on_off(config.auto_advance)),
        (SettingsField::Notifications, "🔔 Notifications", on_off(config.notifications)),
        (SettingsField::Theme, "🎨 Theme", format!("< {} >", app.prefs.theme)),
    ];

    for (field, label, value) in settings {
        let selected = app.settings_field == field;
        let editing = selected && app.settings_editing;
        lines.push(Line::from(""));

        if editing {
            lines.push(Line::from(vec![
                Span::styled("  > ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(label, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            ]));
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(app.settings_input.as_str(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::styled("█", Style::default().fg(Color::Green)),
            ]));
        } else {
            let (prefix, label_style, value_style) = if selected {
                ("  > ", Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD),
                 Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            } else {
                ("    ", Style::default().fg(Color::Gray), Style::default().fg(Color::DarkGray))
            };
            lines.push(Line::from(vec![Span::styled(prefix, label_style), Span::styled(label, label_style)]));
            lines.push(Line::from(vec![Span::raw("    "), Span::styled(value, value_style)]));
        }
    }

    lines.push(Line::from(""));
    match &app.settings_error {
        Some(err) => lines.push(Line::from(Span::styled(format!("  ⚠️  {}", err),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)))),
        None => lines.push(Line::from(Span::styled("  💾 Auto-saved",
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC)))),
    }

    f.render_widget(Paragraph::new(lines).block(bordered(" Settings ", app)), area);
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(v[1])[1]
}
