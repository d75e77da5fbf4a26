//! Host-side system chrome (the status bar).

use std::cell::RefCell;
use std::rc::Rc;

use doc_model::StatusBarStyle;

/// Status bar owned by the host application.
///
/// The HUD reads the current style before overriding it so it can restore
/// the host's configuration when it hides.
pub trait SystemChrome {
    fn status_bar_style(&self) -> StatusBarStyle;
    fn is_status_bar_hidden(&self) -> bool;
    fn set_status_bar_style(&mut self, style: StatusBarStyle, animated: bool);
    fn set_status_bar_hidden(&mut self, hidden: bool, animated: bool);
}

/// Chrome for hosts without a status bar. Setters are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChrome;

impl SystemChrome for NoChrome {
    fn status_bar_style(&self) -> StatusBarStyle {
        StatusBarStyle::Default
    }

    fn is_status_bar_hidden(&self) -> bool {
        false
    }

    fn set_status_bar_style(&mut self, _style: StatusBarStyle, _animated: bool) {}

    fn set_status_bar_hidden(&mut self, _hidden: bool, _animated: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeCall {
    Style(StatusBarStyle),
    Hidden(bool),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChromeState {
    pub style: StatusBarStyle,
    pub hidden: bool,
    pub calls: Vec<ChromeCall>,
}

/// In-memory chrome that keeps its state behind a shared handle, so a test
/// or a headless host can inspect it after handing a clone to the viewer.
#[derive(Debug, Default, Clone)]
pub struct RecordingChrome {
    state: Rc<RefCell<ChromeState>>,
}

impl RecordingChrome {
    pub fn new(style: StatusBarStyle, hidden: bool) -> Self {
        Self { state: Rc::new(RefCell::new(ChromeState { style, hidden, calls: Vec::new() })) }
    }

    pub fn state(&self) -> ChromeState {
        self.state.borrow().clone()
    }

    pub fn style(&self) -> StatusBarStyle {
        self.state.borrow().style
    }

    pub fn hidden(&self) -> bool {
        self.state.borrow().hidden
    }

    pub fn calls(&self) -> Vec<ChromeCall> {
        self.state.borrow().calls.clone()
    }
}

impl SystemChrome for RecordingChrome {
    fn status_bar_style(&self) -> StatusBarStyle {
        self.state.borrow().style
    }

    fn is_status_bar_hidden(&self) -> bool {
        self.state.borrow().hidden
    }

    fn set_status_bar_style(&mut self, style: StatusBarStyle, _animated: bool) {
        let mut state = self.state.borrow_mut();
        state.style = style;
        state.calls.push(ChromeCall::Style(style));
    }

    fn set_status_bar_hidden(&mut self, hidden: bool, _animated: bool) {
        let mut state = self.state.borrow_mut();
        state.hidden = hidden;
        state.calls.push(ChromeCall::Hidden(hidden));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_chrome_shares_state_between_clones() {
        let chrome = RecordingChrome::new(StatusBarStyle::Default, false);
        let mut handle = chrome.clone();

        handle.set_status_bar_style(StatusBarStyle::BlackOpaque, true);
        handle.set_status_bar_hidden(true, false);

        assert_eq!(chrome.style(), StatusBarStyle::BlackOpaque);
        assert!(chrome.hidden());
        assert_eq!(
            chrome.calls(),
            vec![ChromeCall::Style(StatusBarStyle::BlackOpaque), ChromeCall::Hidden(true)]
        );
    }
}
