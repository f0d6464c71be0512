use std::str::FromStr;

use crate::action::{ActionOutcome, Key, RejectReason, UiAction};
use crate::analytics::AnalyzeEntry;
use crate::correlation::CorrelationMap;
use crate::intake::{CandidateFile, CorrelationId, UploadBatch, accept_files};
use crate::panel::{Panel, Resolution};

/// How processed emails are opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Panels expand in place; at most one is expanded at a time.
    Accordion,
    /// Headers carry inline badges and open the email in an overlay.
    #[default]
    Modal,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accordion" => Ok(Layout::Accordion),
            "modal" => Ok(Layout::Modal),
            other => Err(format!("unknown layout '{}', expected accordion or modal", other)),
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Accordion => f.write_str("accordion"),
            Layout::Modal => f.write_str("modal"),
        }
    }
}

/// Counts of what a batch response did to the panels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub rendered: usize,
    pub failed: usize,
    /// Rows naming a file this batch never sent.
    pub unknown: usize,
    /// Rows for panels that were already resolved.
    pub duplicate: usize,
}

/// Owns the results area: the ordered panels, the drop zone, the
/// "Add more" row and the open modal.
#[derive(Debug)]
pub struct ResultsController {
    layout: Layout,
    panels: Vec<Panel>,
    drop_zone_visible: bool,
    add_more_row: bool,
    modal: Option<CorrelationId>,
    /// Batches accepted at intake whose request has not finished yet.
    in_flight: usize,
}

impl ResultsController {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            panels: Vec::new(),
            drop_zone_visible: true,
            add_more_row: false,
            modal: None,
            in_flight: 0,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, id: &CorrelationId) -> Option<&Panel> {
        self.panels.iter().find(|p| &p.id == id)
    }

    fn panel_mut(&mut self, id: &CorrelationId) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| &p.id == id)
    }

    pub fn drop_zone_visible(&self) -> bool {
        self.drop_zone_visible
    }

    pub fn has_add_more_row(&self) -> bool {
        self.add_more_row
    }

    /// Panel currently shown in the overlay, if any.
    pub fn modal_panel(&self) -> Option<&Panel> {
        self.modal.as_ref().and_then(|id| self.panel(id))
    }

    pub fn expanded_count(&self) -> usize {
        self.panels.iter().filter(|p| p.expanded).count()
    }

    pub fn pending_batches(&self) -> usize {
        self.in_flight
    }

    /// True while a batch request is still outstanding. Placeholders of a
    /// failed batch stay loading but no longer count.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Marks a batch whose request failed as finished without touching its panels.
    pub fn abandon_batch(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Accepts a file selection and registers one loading placeholder per
    /// accepted file. Returns the batch to submit, or `None` (with no state
    /// change at all) when no `.eml` file was offered.
    pub fn intake(&mut self, candidates: Vec<CandidateFile>) -> Option<UploadBatch> {
        let offered = candidates.len();
        let batch = accept_files(candidates)?;

        for file in &batch.files {
            self.panels.push(Panel::placeholder(file.id.clone(), &file.name));
        }
        self.drop_zone_visible = false;
        self.add_more_row = true;
        self.in_flight += 1;

        log::info!(
            "Accepted {} of {} offered file(s) into a new batch",
            batch.len(),
            offered
        );
        Some(batch)
    }

    /// Applies a successful batch response and marks the batch finished. Rows
    /// are matched by filename through the batch's own correlation map, so
    /// response order is irrelevant.
    pub fn reconcile(
        &mut self,
        correlation: &CorrelationMap,
        entries: Vec<AnalyzeEntry>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        self.in_flight = self.in_flight.saturating_sub(1);

        for entry in entries {
            let Some(id) = correlation.lookup(entry.filename()).cloned() else {
                log::debug!("Ignoring result for unknown file {}", entry.filename());
                report.unknown += 1;
                continue;
            };
            let Some(panel) = self.panel_mut(&id) else {
                report.unknown += 1;
                continue;
            };

            match panel.resolve(entry) {
                Resolution::Rendered => report.rendered += 1,
                Resolution::Failed => report.failed += 1,
                Resolution::AlreadyResolved => {
                    log::debug!("Panel {} already resolved, ignoring row", id);
                    report.duplicate += 1;
                }
            }
        }

        report
    }

    /// Dispatch table for UI actions.
    pub fn dispatch(&mut self, action: UiAction) -> ActionOutcome {
        match (self.layout, action) {
            (_, UiAction::OpenFilePicker) => ActionOutcome::FilePickerRequested,
            (Layout::Accordion, UiAction::Toggle(id)) => self.toggle(&id),
            (Layout::Modal, UiAction::Toggle(id) | UiAction::OpenModal(id)) => self.open_modal(id),
            (Layout::Modal, UiAction::CloseModal | UiAction::OutsideClick) => self.close_modal(),
            (Layout::Modal, UiAction::Key(Key::Escape)) => self.close_modal(),
            _ => ActionOutcome::Ignored,
        }
    }

    fn check_openable(&self, id: &CorrelationId) -> Result<(), RejectReason> {
        let panel = self.panel(id).ok_or(RejectReason::UnknownPanel)?;
        if panel.is_loading() {
            return Err(RejectReason::StillLoading);
        }
        if !panel.is_openable() {
            return Err(RejectReason::NothingToShow);
        }
        Ok(())
    }

    fn toggle(&mut self, id: &CorrelationId) -> ActionOutcome {
        if let Err(reason) = self.check_openable(id) {
            return ActionOutcome::Rejected(reason);
        }

        let was_expanded = self.panel(id).is_some_and(|p| p.expanded);
        for panel in &mut self.panels {
            panel.expanded = false;
        }
        if was_expanded {
            return ActionOutcome::Collapsed(id.clone());
        }
        if let Some(panel) = self.panel_mut(id) {
            panel.expanded = true;
        }
        ActionOutcome::Expanded(id.clone())
    }

    fn open_modal(&mut self, id: CorrelationId) -> ActionOutcome {
        if let Err(reason) = self.check_openable(&id) {
            return ActionOutcome::Rejected(reason);
        }
        self.modal = Some(id.clone());
        ActionOutcome::ModalOpened(id)
    }

    fn close_modal(&mut self) -> ActionOutcome {
        match self.modal.take() {
            Some(_) => ActionOutcome::ModalClosed,
            None => ActionOutcome::Ignored,
        }
    }
}

impl Default for ResultsController {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}
