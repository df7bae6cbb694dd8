/// Element id of the session button on the page.
pub const SESSION_BUTTON_ID: &str = "vr-button";

/// A page element that can show the button label.
pub trait ButtonElement {
    fn set_label(&self, label: &str);
}

/// The page the session button lives on.
pub trait ButtonHost {
    type Element: ButtonElement;

    fn find(&self, id: &str) -> Option<Self::Element>;

    /// Create a button with `id` and append it to the page body.
    fn append_button(&self, id: &str) -> Result<Self::Element, String>;
}

/// State of the page's "enter VR" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionButtonState {
    NotSupported,
    EnterVr,
    ExitVr,
}

/// What the host should do after a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    Start,
    End,
}

/// The immersive-session toggle appended to the page.
#[derive(Debug, Clone)]
pub struct SessionButton {
    state: SessionButtonState,
}

impl SessionButton {
    pub fn new(supported: bool) -> Self {
        Self {
            state: if supported {
                SessionButtonState::EnterVr
            } else {
                SessionButtonState::NotSupported
            },
        }
    }

    pub fn state(&self) -> SessionButtonState {
        self.state
    }

    pub fn label(&self) -> &'static str {
        match self.state {
            SessionButtonState::NotSupported => "VR NOT SUPPORTED",
            SessionButtonState::EnterVr => "ENTER VR",
            SessionButtonState::ExitVr => "EXIT VR",
        }
    }

    /// A click asks for a session change; the state only flips once the
    /// host confirms via [`session_started`](Self::session_started) or
    /// [`session_ended`](Self::session_ended).
    pub fn click(&self) -> Option<SessionRequest> {
        match self.state {
            SessionButtonState::NotSupported => None,
            SessionButtonState::EnterVr => Some(SessionRequest::Start),
            SessionButtonState::ExitVr => Some(SessionRequest::End),
        }
    }

    /// Show the current label on the page's button, appending the button
    /// first if the page does not have one.
    pub fn mount<H: ButtonHost>(&self, host: &H) -> Result<H::Element, String> {
        let element = match host.find(SESSION_BUTTON_ID) {
            Some(element) => element,
            None => {
                log::info!("Appending #{SESSION_BUTTON_ID} to the page");
                host.append_button(SESSION_BUTTON_ID)?
            }
        };
        element.set_label(self.label());
        Ok(element)
    }

    pub fn session_started(&mut self) {
        if self.state != SessionButtonState::NotSupported {
            self.state = SessionButtonState::ExitVr;
        }
    }

    pub fn session_ended(&mut self) {
        if self.state != SessionButtonState::NotSupported {
            self.state = SessionButtonState::EnterVr;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct FakeButton(Rc<RefCell<String>>);

    impl ButtonElement for FakeButton {
        fn set_label(&self, label: &str) {
            *self.0.borrow_mut() = label.to_string();
        }
    }

    #[derive(Default)]
    struct FakePage {
        buttons: RefCell<Vec<(String, FakeButton)>>,
    }

    impl ButtonHost for FakePage {
        type Element = FakeButton;

        fn find(&self, id: &str) -> Option<FakeButton> {
            self.buttons.borrow().iter().find(|(i, _)| i == id).map(|(_, b)| b.clone())
        }

        fn append_button(&self, id: &str) -> Result<FakeButton, String> {
            let button = FakeButton::default();
            self.buttons.borrow_mut().push((id.to_string(), button.clone()));
            Ok(button)
        }
    }

    #[test]
    fn test_mount_appends_button_once() {
        let page = FakePage::default();
        let mut button = SessionButton::new(true);

        let element = button.mount(&page).unwrap();
        assert_eq!(*element.0.borrow(), "ENTER VR");
        assert_eq!(page.buttons.borrow().len(), 1);
        assert_eq!(page.buttons.borrow()[0].0, SESSION_BUTTON_ID);

        button.session_started();
        button.mount(&page).unwrap();
        assert_eq!(page.buttons.borrow().len(), 1);
        assert_eq!(*element.0.borrow(), "EXIT VR");
    }

    #[test]
    fn test_mount_reuses_existing_button() {
        let page = FakePage::default();
        let existing = page.append_button(SESSION_BUTTON_ID).unwrap();
        SessionButton::new(false).mount(&page).unwrap();
        assert_eq!(page.buttons.borrow().len(), 1);
        assert_eq!(*existing.0.borrow(), "VR NOT SUPPORTED");
    }

    #[test]
    fn test_toggle_cycle() {
        let mut button = SessionButton::new(true);
        assert_eq!(button.label(), "ENTER VR");
        assert_eq!(button.click(), Some(SessionRequest::Start));
        // nothing changes until the session actually starts
        assert_eq!(button.state(), SessionButtonState::EnterVr);

        button.session_started();
        assert_eq!(button.label(), "EXIT VR");
        assert_eq!(button.click(), Some(SessionRequest::End));

        button.session_ended();
        assert_eq!(button.state(), SessionButtonState::EnterVr);
    }

    #[test]
    fn test_unsupported_never_requests() {
        let mut button = SessionButton::new(false);
        assert_eq!(button.label(), "VR NOT SUPPORTED");
        assert_eq!(button.click(), None);
        button.session_started();
        assert_eq!(button.state(), SessionButtonState::NotSupported);
    }
}
