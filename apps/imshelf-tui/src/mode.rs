//! Input modes for the imshelf UI.

/// Which modal state the UI is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Browsing the table
    Normal,
    /// Typing into the search filter
    Search,
    /// Filling an add/edit form
    Form,
    /// Entering a checkout due date
    CheckOut,
    /// Confirming a delete
    ConfirmDelete,
    /// Viewing details for the selection
    Details,
}

impl Mode {
    /// Short code for the status bar.
    pub fn short_code(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Search => "SEARCH",
            Mode::Form => "FORM",
            Mode::CheckOut => "CHECKOUT",
            Mode::ConfirmDelete => "CONFIRM",
            Mode::Details => "DETAILS",
        }
    }
}
