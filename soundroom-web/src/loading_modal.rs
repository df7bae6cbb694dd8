/// Message shown in place of the progress bar when the room fails to load.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load the room. Please refresh the page.";

/// State of the optional loading dialog: progress bar, close button, error text.
///
/// The browser facade mirrors this onto the DOM; everything else only
/// reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadingModal {
    visible: bool,
    progress_percent: f32,
    error: Option<String>,
}

impl LoadingModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.progress_percent = 0.0;
        self.error = None;
    }

    /// Update the bar from a byte count. Unknown or zero totals are ignored.
    pub fn on_progress(&mut self, loaded: u64, total: Option<u64>) {
        if self.error.is_some() {
            return;
        }
        let Some(total) = total.filter(|t| *t > 0) else {
            return;
        };
        let percent = (loaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
        self.progress_percent = percent as f32;
    }

    pub fn on_complete(&mut self) {
        if self.error.is_none() {
            self.progress_percent = 100.0;
            self.visible = false;
        }
    }

    /// Replace the dialog content with the failure message. The dialog stays up.
    pub fn on_error(&mut self) {
        self.visible = true;
        self.error = Some(LOAD_FAILED_MESSAGE.to_string());
    }

    /// The close button.
    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn progress_percent(&self) -> f32 {
        self.progress_percent
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_percentage() {
        let mut modal = LoadingModal::new();
        modal.show();
        modal.on_progress(250, Some(1000));
        assert_eq!(modal.progress_percent(), 25.0);
        modal.on_progress(5000, Some(1000));
        assert_eq!(modal.progress_percent(), 100.0);
    }

    #[test]
    fn test_unknown_total_is_ignored() {
        let mut modal = LoadingModal::new();
        modal.show();
        modal.on_progress(100, None);
        modal.on_progress(100, Some(0));
        assert_eq!(modal.progress_percent(), 0.0);
    }

    #[test]
    fn test_complete_hides() {
        let mut modal = LoadingModal::new();
        modal.show();
        modal.on_complete();
        assert!(!modal.is_visible());
        assert!(modal.error().is_none());
    }

    #[test]
    fn test_error_replaces_content_and_sticks() {
        let mut modal = LoadingModal::new();
        modal.show();
        modal.on_error();
        modal.on_progress(10, Some(10));
        modal.on_complete();
        assert!(modal.is_visible());
        assert_eq!(modal.error(), Some(LOAD_FAILED_MESSAGE));
        modal.close();
        assert!(!modal.is_visible());
    }
}
