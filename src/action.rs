use crate::intake::CorrelationId;

/// Keys the page forwards to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }
}

/// UI events, one variant per action kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Click on a panel header.
    Toggle(CorrelationId),
    OpenModal(CorrelationId),
    /// Explicit close control of the modal.
    CloseModal,
    /// Click on the modal backdrop.
    OutsideClick,
    Key(Key),
    /// Click on the drop zone or the "Add more" row.
    OpenFilePicker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownPanel,
    /// The spinner is still showing.
    StillLoading,
    /// Error panels have nothing to expand.
    NothingToShow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Expanded(CorrelationId),
    Collapsed(CorrelationId),
    ModalOpened(CorrelationId),
    ModalClosed,
    FilePickerRequested,
    Rejected(RejectReason),
    /// The action does not apply to the current state or layout.
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::Key;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("Escape"), Key::Escape);
        assert_eq!(Key::from_name("Esc"), Key::Escape);
        assert_eq!(Key::from_name("Enter"), Key::Other("Enter".to_string()));
    }
}
