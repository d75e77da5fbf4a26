//! HUD state machine
//!
//! Tracks whether the overlay chrome is showing and drives the host status
//! bar while it is. The host's own status bar style and visibility are saved
//! once when an override starts and restored exactly once when it ends.

use doc_model::{DeviceIdiom, StatusBarStyle, StatusBarStyleSetting, ViewMode, ViewerSettings};

use crate::host::SystemChrome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SavedStatusBar {
    style: StatusBarStyle,
    hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    visible: bool,
    style_setting: StatusBarStyleSetting,
    idiom: DeviceIdiom,
    saved: Option<SavedStatusBar>,
    /// The current show left status bar visibility to the host.
    inherited: bool,
    view_mode: ViewMode,
    scrobble_bar_enabled: bool,
    toolbar_enabled: bool,
}

impl Hud {
    /// Creates a hidden HUD configured from `settings`.
    pub fn new(settings: &ViewerSettings) -> Self {
        Self {
            visible: false,
            style_setting: settings.status_bar_style_setting,
            idiom: settings.device_idiom,
            saved: None,
            inherited: false,
            view_mode: settings.view_mode,
            scrobble_bar_enabled: settings.scrobble_bar_enabled,
            toolbar_enabled: settings.toolbar_enabled,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True while the host status bar is overridden and awaiting restore.
    pub fn has_pending_restore(&self) -> bool {
        self.saved.is_some()
    }

    pub fn style_setting(&self) -> StatusBarStyleSetting {
        self.style_setting
    }

    /// Applies from the next `show`; an active override is still restored as saved.
    pub fn set_style_setting(&mut self, setting: StatusBarStyleSetting) {
        self.style_setting = setting;
    }

    pub fn set_device_idiom(&mut self, idiom: DeviceIdiom) {
        self.idiom = idiom;
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn set_scrobble_bar_enabled(&mut self, enabled: bool) {
        self.scrobble_bar_enabled = enabled;
    }

    pub fn set_toolbar_enabled(&mut self, enabled: bool) {
        self.toolbar_enabled = enabled;
    }

    /// The scrobble bar never shows together with the thumbnail grid.
    pub fn scrobble_bar_visible(&self) -> bool {
        self.visible && self.scrobble_bar_enabled && self.view_mode == ViewMode::Document
    }

    pub fn toolbar_visible(&self) -> bool {
        self.visible && self.toolbar_enabled
    }

    /// Shows the HUD. Returns false when it was already visible.
    pub fn show(&mut self, chrome: &mut dyn SystemChrome, animated: bool) -> bool {
        if self.visible {
            return false;
        }
        self.visible = true;

        match self.style_setting {
            StatusBarStyleSetting::Inherit => {
                self.inherited = true;
                if chrome.is_status_bar_hidden() {
                    chrome.set_status_bar_hidden(false, animated);
                }
            }
            StatusBarStyleSetting::Disable => {
                self.save(chrome);
                chrome.set_status_bar_hidden(true, animated);
            }
            setting => {
                self.save(chrome);
                if let Some(style) = setting.override_style(self.idiom) {
                    chrome.set_status_bar_style(style, animated);
                }
                chrome.set_status_bar_hidden(false, animated);
            }
        }

        tracing::debug!(setting = ?self.style_setting, "hud shown");
        true
    }

    /// Hides the HUD. Returns false when it was already hidden.
    pub fn hide(&mut self, chrome: &mut dyn SystemChrome, animated: bool) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;

        let inherited = std::mem::take(&mut self.inherited);
        if !self.restore(chrome, animated) && inherited {
            chrome.set_status_bar_hidden(true, animated);
        }

        tracing::debug!("hud hidden");
        true
    }

    /// Flips visibility and returns the new state.
    pub fn toggle(&mut self, chrome: &mut dyn SystemChrome, animated: bool) -> bool {
        if self.visible {
            self.hide(chrome, animated);
        } else {
            self.show(chrome, animated);
        }
        self.visible
    }

    /// Returns true when visibility changed.
    pub fn set_visible(&mut self, chrome: &mut dyn SystemChrome, visible: bool, animated: bool) -> bool {
        if visible {
            self.show(chrome, animated)
        } else {
            self.hide(chrome, animated)
        }
    }

    /// Restores any pending override without animation. Returns true when
    /// the HUD was visible.
    pub fn teardown(&mut self, chrome: &mut dyn SystemChrome) -> bool {
        let was_visible = std::mem::replace(&mut self.visible, false);
        self.inherited = false;
        self.restore(chrome, false);
        was_visible
    }

    fn save(&mut self, chrome: &dyn SystemChrome) {
        if self.saved.is_none() {
            self.saved = Some(SavedStatusBar {
                style: chrome.status_bar_style(),
                hidden: chrome.is_status_bar_hidden(),
            });
        }
    }

    fn restore(&mut self, chrome: &mut dyn SystemChrome, animated: bool) -> bool {
        match self.saved.take() {
            Some(saved) => {
                chrome.set_status_bar_style(saved.style, animated);
                chrome.set_status_bar_hidden(saved.hidden, animated);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ChromeCall, RecordingChrome};

    fn hud(setting: StatusBarStyleSetting) -> Hud {
        Hud::new(&ViewerSettings { status_bar_style_setting: setting, ..ViewerSettings::default() })
    }

    #[test]
    fn black_opaque_round_trip_restores_host_state() {
        let chrome = RecordingChrome::new(StatusBarStyle::Default, true);
        let mut handle = chrome.clone();
        let mut hud = hud(StatusBarStyleSetting::BlackOpaque);

        assert!(hud.show(&mut handle, false));
        assert_eq!(chrome.style(), StatusBarStyle::BlackOpaque);
        assert!(!chrome.hidden());

        assert!(hud.hide(&mut handle, false));
        assert_eq!(chrome.style(), StatusBarStyle::Default);
        assert!(chrome.hidden());
        assert!(!hud.has_pending_restore());
    }

    #[test]
    fn repeated_show_and_hide_are_no_ops() {
        let chrome = RecordingChrome::new(StatusBarStyle::BlackTranslucent, false);
        let mut handle = chrome.clone();
        let mut hud = hud(StatusBarStyleSetting::DefaultWhite);

        assert!(hud.show(&mut handle, true));
        assert!(!hud.show(&mut handle, true));
        let calls_after_show = chrome.calls().len();

        assert!(hud.hide(&mut handle, true));
        assert!(!hud.hide(&mut handle, true));

        // One style + one visibility call to restore, nothing for the repeated hide.
        assert_eq!(chrome.calls().len(), calls_after_show + 2);
        assert_eq!(chrome.style(), StatusBarStyle::BlackTranslucent);
    }

    #[test]
    fn smart_black_uses_idiom() {
        let chrome = RecordingChrome::new(StatusBarStyle::Default, false);
        let mut handle = chrome.clone();
        let mut hud = hud(StatusBarStyleSetting::SmartBlack);
        hud.set_device_idiom(DeviceIdiom::Phone);

        hud.show(&mut handle, false);

        assert_eq!(chrome.style(), StatusBarStyle::BlackTranslucent);
    }

    #[test]
    fn inherit_only_toggles_visibility() {
        let chrome = RecordingChrome::new(StatusBarStyle::BlackOpaque, true);
        let mut handle = chrome.clone();
        let mut hud = hud(StatusBarStyleSetting::Inherit);

        hud.show(&mut handle, false);
        assert!(!chrome.hidden());
        assert!(!hud.has_pending_restore());

        hud.hide(&mut handle, false);
        assert!(chrome.hidden());
        assert_eq!(chrome.calls(), vec![ChromeCall::Hidden(false), ChromeCall::Hidden(true)]);
    }

    #[test]
    fn disable_keeps_status_bar_hidden_while_visible() {
        let chrome = RecordingChrome::new(StatusBarStyle::Default, false);
        let mut handle = chrome.clone();
        let mut hud = hud(StatusBarStyleSetting::Disable);

        hud.show(&mut handle, false);
        assert!(chrome.hidden());
        assert_eq!(chrome.style(), StatusBarStyle::Default);

        hud.hide(&mut handle, false);
        assert!(!chrome.hidden());
    }

    #[test]
    fn teardown_restores_pending_override_once() {
        let chrome = RecordingChrome::new(StatusBarStyle::Default, false);
        let mut handle = chrome.clone();
        let mut hud = hud(StatusBarStyleSetting::BlackOpaque);

        hud.show(&mut handle, false);
        assert!(hud.teardown(&mut handle));
        assert_eq!(chrome.style(), StatusBarStyle::Default);

        let calls = chrome.calls().len();
        assert!(!hud.teardown(&mut handle));
        assert_eq!(chrome.calls().len(), calls);
    }

    #[test]
    fn thumbnails_hide_the_scrobble_bar() {
        let mut handle = RecordingChrome::default();
        let mut hud = hud(StatusBarStyleSetting::Inherit);
        hud.show(&mut handle, false);

        assert!(hud.scrobble_bar_visible());
        hud.set_view_mode(ViewMode::Thumbnails);
        assert!(!hud.scrobble_bar_visible());
        assert!(hud.toolbar_visible());

        hud.set_toolbar_enabled(false);
        assert!(!hud.toolbar_visible());
    }

    #[test]
    fn setting_change_applies_on_next_show() {
        let chrome = RecordingChrome::new(StatusBarStyle::Default, false);
        let mut handle = chrome.clone();
        let mut hud = hud(StatusBarStyleSetting::BlackOpaque);

        hud.show(&mut handle, false);
        hud.set_style_setting(StatusBarStyleSetting::DefaultWhite);
        assert_eq!(chrome.style(), StatusBarStyle::BlackOpaque);

        hud.hide(&mut handle, false);
        assert_eq!(chrome.style(), StatusBarStyle::Default);
    }

    #[test]
    fn leaving_inherit_while_visible_still_hides_on_hide() {
        let chrome = RecordingChrome::new(StatusBarStyle::Default, true);
        let mut handle = chrome.clone();
        let mut hud = hud(StatusBarStyleSetting::Inherit);

        hud.show(&mut handle, false);
        assert!(!chrome.hidden());

        hud.set_style_setting(StatusBarStyleSetting::BlackOpaque);
        hud.hide(&mut handle, false);
        assert!(chrome.hidden());
        assert_eq!(chrome.style(), StatusBarStyle::Default);

        hud.show(&mut handle, false);
        assert_eq!(chrome.style(), StatusBarStyle::BlackOpaque);
        hud.hide(&mut handle, false);
        assert!(chrome.hidden());
    }
}
