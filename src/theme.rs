//! Theme state: persisted preference, terminal dark-signal fallback, palettes.
//!
//! The manager is constructed explicitly from a store path and a dark-signal
//! source and injected into the app; nothing here is global. `init` applies
//! the stored preference and starts observing signal and store changes
//! (observed via [`ThemeManager::poll`] from the event loop).

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use ratatui::style::Color;
use tracing::{info, warn};

/// Persisted theme preference. `System` is not a rendering state itself but
/// a resolution rule against the terminal's dark signal, re-resolved at
/// every apply.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Label shown in the header bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::System => "System",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Fixed cycling order: light → dark → system → light.
    pub fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
            Self::System => Self::Light,
        }
    }
}

/// Source of the terminal's "prefers dark" signal, readable on demand.
pub trait DarkSignal {
    fn prefers_dark(&self) -> bool;
}

/// Reads the `COLORFGBG` convention advertised by many terminals
/// ("foreground;background", background 0-6 or 8 meaning a dark screen).
/// Terminals that advertise nothing are assumed dark.
pub struct TermDarkSignal;

impl DarkSignal for TermDarkSignal {
    fn prefers_dark(&self) -> bool {
        match std::env::var("COLORFGBG") {
            Ok(v) => match v.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()) {
                Some(bg) => bg <= 6 || bg == 8,
                None => true,
            },
            Err(_) => true,
        }
    }
}

pub struct ThemeManager {
    path: PathBuf,
    signal: Box<dyn DarkSignal>,
    /// In-memory mirror of the store, kept only for the status label and
    /// external-change detection; reads go through `get`.
    current: ThemePreference,
    dark_active: bool,
    last_signal: bool,
    store_mtime: Option<SystemTime>,
}

impl ThemeManager {
    /// Construct without touching the presentation; call [`init`](Self::init)
    /// before first use.
    pub fn new(path: impl Into<PathBuf>, signal: Box<dyn DarkSignal>) -> Self {
        Self {
            path: path.into(),
            signal,
            current: ThemePreference::System,
            dark_active: true,
            last_signal: true,
            store_mtime: None,
        }
    }

    /// Apply the stored preference and start observing signal changes.
    pub fn init(&mut self) {
        self.last_signal = self.signal.prefers_dark();
        self.current = self.get();
        self.store_mtime = self.mtime();
        self.apply(self.current);
        info!(theme = self.current.as_str(), "theme initialized");
    }

    /// Current preference, read from the store on every call. Absent file or
    /// unrecognized value means `system`.
    pub fn get(&self) -> ThemePreference {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return ThemePreference::System;
        };
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if key == "theme" {
                return ThemePreference::parse(val).unwrap_or_default();
            }
        }
        ThemePreference::System
    }

    /// Persist the preference, then apply it.
    pub fn set(&mut self, pref: ThemePreference) {
        let mut buf = String::new();
        buf.push_str("# usradmin-tui theme configuration\n");
        buf.push_str("# theme: light | dark | system\n\n");
        buf.push_str(&format!("theme = {}\n", pref.as_str()));
        if let Err(e) = fs::write(&self.path, buf) {
            warn!("failed to persist theme preference: {e}");
        }
        self.store_mtime = self.mtime();
        self.current = pref;
        self.apply(pref);
    }

    /// Advance light → dark → system → light and persist.
    pub fn cycle(&mut self) -> ThemePreference {
        let next = self.get().next();
        self.set(next);
        next
    }

    /// Resolve the preference into an active presentation. `System` consults
    /// the dark signal at call time; the result is never cached across calls.
    pub fn apply(&mut self, pref: ThemePreference) {
        self.dark_active = match pref {
            ThemePreference::Dark => true,
            ThemePreference::Light => false,
            ThemePreference::System => self.signal.prefers_dark(),
        };
    }

    /// Observe external store edits and signal changes. Signal changes only
    /// re-apply while the stored preference is `system`; an explicit choice
    /// is never overridden.
    pub fn poll(&mut self) {
        let mtime = self.mtime();
        if mtime != self.store_mtime {
            self.store_mtime = mtime;
            let pref = self.get();
            if pref != self.current {
                info!(theme = pref.as_str(), "theme changed externally");
                self.current = pref;
                self.apply(pref);
            }
        }
        let dark = self.signal.prefers_dark();
        if dark != self.last_signal {
            self.last_signal = dark;
            if self.current == ThemePreference::System {
                self.apply(ThemePreference::System);
            }
        }
    }

    /// The preference label shown in the status bar.
    pub fn label(&self) -> &'static str {
        self.current.label()
    }

    pub fn dark_active(&self) -> bool {
        self.dark_active
    }

    pub fn palette(&self) -> Palette {
        if self.dark_active { Palette::dark() } else { Palette::light() }
    }

    fn mtime(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok().and_then(|m| m.modified().ok())
    }
}

/// Color palette for the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
    pub success: Color,
}

impl Palette {
    /// Catppuccin Mocha.
    pub fn dark() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            muted: Color::Rgb(0x7f, 0x84, 0x9c),
            title: Color::Rgb(0xcb, 0xa6, 0xf7),
            border: Color::Rgb(0x58, 0x5b, 0x70),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf),
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a),
            error: Color::Rgb(0xf3, 0x8b, 0xa8),
            success: Color::Rgb(0xa6, 0xe3, 0xa1),
        }
    }

    /// Catppuccin Latte.
    pub fn light() -> Self {
        Self {
            text: Color::Rgb(0x4c, 0x4f, 0x69),
            muted: Color::Rgb(0x8c, 0x8f, 0xa1),
            title: Color::Rgb(0x88, 0x39, 0xef),
            border: Color::Rgb(0xac, 0xb0, 0xbe),
            header_bg: Color::Rgb(0xcc, 0xd0, 0xda),
            header_fg: Color::Rgb(0x72, 0x87, 0xfd),
            status_bg: Color::Rgb(0xbc, 0xc0, 0xcc),
            status_fg: Color::Rgb(0x4c, 0x4f, 0x69),
            highlight_fg: Color::Rgb(0xdf, 0x8e, 0x1d),
            highlight_bg: Color::Rgb(0xbc, 0xc0, 0xcc),
            error: Color::Rgb(0xd2, 0x0f, 0x39),
            success: Color::Rgb(0x40, 0xa0, 0x2b),
        }
    }
}
