//! Navigation menu state and section scrolling.

use crate::config::NavConfig;
use crate::scroll::ScrollSignals;

/// Mobile navigation menu.
#[derive(Debug, Clone)]
pub struct NavMenu {
    config: NavConfig,
    open: bool,
}

impl NavMenu {
    pub fn new(config: NavConfig) -> Self {
        Self {
            config,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens or closes the menu. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Scroll offset that brings a section into view below the fixed chrome.
    ///
    /// `section_top` is the section's position in document coordinates.
    pub fn scroll_target(&self, section_top: f64, viewport_width: f64) -> f64 {
        let offset = if viewport_width < self.config.mobile_breakpoint {
            self.config.mobile_offset
        } else {
            self.config.desktop_offset
        };
        (section_top - offset).max(0.0)
    }

    /// Follows a navigation link: closes the menu and returns the target offset.
    pub fn navigate(&mut self, section_top: f64, viewport_width: f64) -> f64 {
        self.close();
        self.scroll_target(section_top, viewport_width)
    }

    /// Chrome is solid when scrolled past the threshold or while the menu is open.
    pub fn solid_chrome(&self, signals: ScrollSignals) -> bool {
        signals.chrome_solid() || self.open
    }
}

impl Default for NavMenu {
    fn default() -> Self {
        Self::new(NavConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_target_by_breakpoint() {
        let nav = NavMenu::default();
        assert_eq!(nav.scroll_target(1000.0, 375.0), 930.0);
        assert_eq!(nav.scroll_target(1000.0, 768.0), 900.0);
        assert_eq!(nav.scroll_target(40.0, 1440.0), 0.0);
    }

    #[test]
    fn test_navigate_closes_menu() {
        let mut nav = NavMenu::default();
        assert!(nav.toggle());
        assert!(nav.solid_chrome(ScrollSignals::default()));

        nav.navigate(500.0, 375.0);
        assert!(!nav.is_open());
        assert!(!nav.solid_chrome(ScrollSignals::default()));
    }
}
