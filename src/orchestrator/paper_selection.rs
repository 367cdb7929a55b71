use crate::models::internal::PaperReference;

/// Paper shown in the detail view, independent of the conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaperSelectionState {
    selected: Option<PaperReference>,
    visible: bool,
}

impl PaperSelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, paper: PaperReference) {
        self.selected = Some(paper);
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.visible = false;
    }

    pub fn selected(&self) -> Option<&PaperReference> {
        self.selected.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
