use std::collections::BTreeMap;

use crate::archive::SelectionArchive;
use crate::canvas::{OverlayCanvas, SelectionStyle};
use crate::config::ViewerConfig;
use crate::events::StateChangeEmitter;
use crate::selection::{RectSelection, SliceSelection};
use crate::transform::{TransformError, TransformHandle};
use crate::{normalize_point, Point, SliceIndex};

/// Pointer-driven ROI selection over a stack of slices. One implementation
/// per selection shape; all of them are driven the same way by the viewer.
pub trait Selector {
    type Selection: SliceSelection;

    fn on_pointer_down(&mut self, point: Point);
    fn on_pointer_move(&mut self, point: Point);
    fn on_pointer_up(&mut self, point: Point);

    fn current_selection(&self) -> Option<&Self::Selection>;
    fn add_current_selection(&mut self);
    fn remove_current_selection(&mut self);

    /// Copies `selections`, or every per-slice selection when `None`, into the
    /// archive. The per-slice map is left as it is.
    fn archive_selections(&mut self, selections: Option<Vec<Self::Selection>>);
    fn archive(&self) -> &SelectionArchive<Self::Selection>;
    fn restore_archive(&mut self, selections: Vec<Self::Selection>);
    fn remove_archived_selection(
        &mut self,
        slice_index: SliceIndex,
        index: usize,
    ) -> Option<Self::Selection>;
    fn clear_archive(&mut self);

    /// Per-slice (not archived) selections in ascending slice order.
    fn selections(&self) -> Vec<Self::Selection>;
    fn clear_selections(&mut self);

    fn clear_canvas_selection(&mut self);
    fn clear_data(&mut self);

    fn current_slice(&self) -> SliceIndex;
    /// Switches the active slice and abandons any drag in progress. Does not
    /// redraw.
    fn update_current_slice(&mut self, slice_index: SliceIndex);
    fn draw_previous_selections(&mut self);

    fn has_archived_selections(&self) -> bool;
    fn has_slice_selection(&self) -> bool;
    fn has_valid_selection(&self, flags: &[bool]) -> bool;

    fn translation_matrix(&self) -> [f64; 6];
    fn update_translation_matrix(&mut self, matrix: [f64; 6]) -> Result<(), TransformError>;

    fn state_change_emitter(&mut self) -> &mut StateChangeEmitter;
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum DragState {
    Idle,
    Dragging { anchor: Point },
}

pub struct RectSelector<C: OverlayCanvas> {
    canvas: C,
    transform: TransformHandle,
    min_size: f64,
    active_style: SelectionStyle,
    archived_style: SelectionStyle,
    current_slice: SliceIndex,
    drag: DragState,
    current_selection: Option<RectSelection>,
    selections_by_slice: BTreeMap<SliceIndex, RectSelection>,
    archive: SelectionArchive<RectSelection>,
    emitter: StateChangeEmitter,
}

impl<C: OverlayCanvas> RectSelector<C> {
    pub fn new(canvas: C, transform: TransformHandle, config: &ViewerConfig) -> Self {
        Self {
            canvas,
            transform,
            min_size: config.min_selection_size,
            active_style: config.active_style(),
            archived_style: config.archived_style(),
            current_slice: 0,
            drag: DragState::Idle,
            current_selection: None,
            selections_by_slice: BTreeMap::new(),
            archive: SelectionArchive::new(),
            emitter: StateChangeEmitter::new(),
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn transform(&self) -> &TransformHandle {
        &self.transform
    }

    /// Drops a drag in progress without committing it and redraws.
    pub fn cancel_drag(&mut self) {
        if !self.is_dragging() {
            return;
        }
        self.abandon_drag();
        self.redraw();
    }

    /// Pointer position on the overlay mapped into slice coordinates.
    fn to_slice_space(&self, point: Point) -> Option<Point> {
        let point = normalize_point(point)?;
        normalize_point(self.transform.get().apply_inverse(point))
    }

    fn redraw(&mut self) {
        self.canvas.clear();
        self.draw_previous_selections();
        if self.is_dragging() {
            if let Some(selection) = &self.current_selection {
                selection.draw(&mut self.canvas, &self.active_style);
            }
        }
    }

    /// Drops entries that did not come from a real drag: inverted, non-finite
    /// or below the minimum size.
    fn keep_valid(&self, selections: Vec<RectSelection>) -> Vec<RectSelection> {
        let total = selections.len();
        let kept: Vec<RectSelection> = selections
            .into_iter()
            .filter(|selection| selection.is_valid(self.min_size))
            .collect();
        if kept.len() != total {
            log::warn!(
                "selector: dropped {} invalid selection(s) of {total}",
                total - kept.len()
            );
        }
        kept
    }

    fn abandon_drag(&mut self) {
        if self.is_dragging() {
            log::debug!("selector: drag on slice {} abandoned", self.current_slice);
        }
        self.drag = DragState::Idle;
        self.current_selection = self.selections_by_slice.get(&self.current_slice).copied();
    }
}

impl<C: OverlayCanvas> Selector for RectSelector<C> {
    type Selection = RectSelection;

    fn on_pointer_down(&mut self, point: Point) {
        if self.is_dragging() {
            return;
        }
        let Some(anchor) = self.to_slice_space(point) else {
            return;
        };
        self.drag = DragState::Dragging { anchor };
        self.current_selection = Some(RectSelection::from_drag(
            self.current_slice,
            anchor,
            anchor,
        ));
        log::debug!(
            "selector: drag started on slice {} at ({:.1}, {:.1})",
            self.current_slice,
            anchor.x,
            anchor.y
        );
    }

    fn on_pointer_move(&mut self, point: Point) {
        let DragState::Dragging { anchor } = self.drag else {
            return;
        };
        let Some(current) = self.to_slice_space(point) else {
            return;
        };
        self.current_selection = Some(RectSelection::from_drag(
            self.current_slice,
            anchor,
            current,
        ));
        self.redraw();
    }

    fn on_pointer_up(&mut self, point: Point) {
        let DragState::Dragging { anchor } = self.drag else {
            return;
        };
        let release = self.to_slice_space(point);
        self.drag = DragState::Idle;
        let selection = release
            .map(|release| RectSelection::from_drag(self.current_slice, anchor, release))
            .filter(|selection| selection.is_valid(self.min_size));
        match selection {
            Some(selection) => {
                log::debug!("selector: committed {selection:?}");
                self.current_selection = Some(selection);
                self.add_current_selection();
            }
            None => {
                log::debug!(
                    "selector: drag on slice {} below {} px, discarded",
                    self.current_slice,
                    self.min_size
                );
                self.abandon_drag();
            }
        }
        self.redraw();
    }

    fn current_selection(&self) -> Option<&RectSelection> {
        self.current_selection.as_ref()
    }

    fn add_current_selection(&mut self) {
        if self.is_dragging() {
            return;
        }
        let Some(selection) = self.current_selection else {
            return;
        };
        if !selection.is_valid(self.min_size) {
            return;
        }
        self.selections_by_slice
            .insert(selection.slice_index, selection);
        self.emitter.emit();
    }

    fn remove_current_selection(&mut self) {
        self.drag = DragState::Idle;
        self.current_selection = None;
        let removed = self.selections_by_slice.remove(&self.current_slice);
        self.redraw();
        if removed.is_some() {
            log::debug!("selector: removed selection on slice {}", self.current_slice);
        }
        self.emitter.emit();
    }

    fn archive_selections(&mut self, selections: Option<Vec<RectSelection>>) {
        let selections = match selections {
            Some(selections) => self.keep_valid(selections),
            None => self.selections_by_slice.values().copied().collect(),
        };
        if selections.is_empty() {
            return;
        }
        log::debug!("selector: archiving {} selection(s)", selections.len());
        self.archive.extend(selections);
        self.emitter.emit();
    }

    fn archive(&self) -> &SelectionArchive<RectSelection> {
        &self.archive
    }

    fn restore_archive(&mut self, selections: Vec<RectSelection>) {
        let selections = self.keep_valid(selections);
        self.archive.clear();
        self.archive.extend(selections);
        log::debug!("selector: archive restored with {} entries", self.archive.len());
        self.redraw();
        self.emitter.emit();
    }

    fn remove_archived_selection(
        &mut self,
        slice_index: SliceIndex,
        index: usize,
    ) -> Option<RectSelection> {
        let removed = self.archive.remove(slice_index, index)?;
        self.redraw();
        self.emitter.emit();
        Some(removed)
    }

    fn clear_archive(&mut self) {
        if self.archive.is_empty() {
            return;
        }
        self.archive.clear();
        self.redraw();
        self.emitter.emit();
    }

    fn selections(&self) -> Vec<RectSelection> {
        self.selections_by_slice.values().copied().collect()
    }

    fn clear_selections(&mut self) {
        self.selections_by_slice.clear();
        if !self.is_dragging() {
            self.current_selection = None;
        }
        self.emitter.emit();
    }

    fn clear_canvas_selection(&mut self) {
        self.canvas.clear();
    }

    fn clear_data(&mut self) {
        self.drag = DragState::Idle;
        self.current_selection = None;
        self.selections_by_slice.clear();
        self.archive.clear();
        self.canvas.clear();
        log::debug!("selector: data cleared");
        self.emitter.emit();
    }

    fn current_slice(&self) -> SliceIndex {
        self.current_slice
    }

    fn update_current_slice(&mut self, slice_index: SliceIndex) {
        self.abandon_drag();
        self.current_slice = slice_index;
        self.current_selection = self.selections_by_slice.get(&slice_index).copied();
    }

    fn draw_previous_selections(&mut self) {
        self.canvas.set_transform(&self.transform.get());
        for selection in self.archive.for_slice(self.current_slice) {
            selection.draw(&mut self.canvas, &self.archived_style);
        }
        if let Some(selection) = self.selections_by_slice.get(&self.current_slice) {
            selection.draw(&mut self.canvas, &self.active_style);
        }
    }

    fn has_archived_selections(&self) -> bool {
        !self.archive.is_empty()
    }

    fn has_slice_selection(&self) -> bool {
        self.selections_by_slice.contains_key(&self.current_slice)
    }

    fn has_valid_selection(&self, flags: &[bool]) -> bool {
        flags.iter().all(|flag| *flag)
            && (self.has_slice_selection() || self.has_archived_selections())
    }

    fn translation_matrix(&self) -> [f64; 6] {
        self.transform.get().get()
    }

    fn update_translation_matrix(&mut self, matrix: [f64; 6]) -> Result<(), TransformError> {
        self.transform.set(matrix)
    }

    fn state_change_emitter(&mut self) -> &mut StateChangeEmitter {
        &mut self.emitter
    }
}
