/// Inline keyboard: rows of buttons, top to bottom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    /// Opaque callback data, echoed back on press.
    Callback(String),
    Url(String),
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl ToString) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.to_string()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match &self.action {
            ButtonAction::Callback(d) => Some(d),
            ButtonAction::Url(_) => None,
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Appends a row, skipping empty ones.
    pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
        if !buttons.is_empty() {
            self.rows.push(buttons);
        }
        self
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }

    /// All callback payloads, in layout order.
    pub fn callback_data(&self) -> Vec<&str> {
        self.buttons().filter_map(|b| b.callback_data()).collect()
    }
}
