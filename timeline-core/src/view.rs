//! Điểm nối giữa tập làm việc và widget hiển thị bên ngoài.

use crate::{ActiveCategories, RenderItem, TimelineError, Tooltip, WorkingSet};

/// Widget timeline bên ngoài. Chỉ cần khả năng thay toàn bộ nội dung.
pub trait TimelineRenderer {
    /// Xóa các mục hiện có rồi thêm `items` theo lô.
    fn replace_items(&mut self, items: Vec<RenderItem>);
}

/// Giữ tập làm việc bất biến, bộ lọc hiện tại và renderer.
pub struct TimelineView<R: TimelineRenderer> {
    working_set: WorkingSet,
    active: ActiveCategories,
    renderer: R,
    hovered: Option<String>,
}

impl<R: TimelineRenderer> TimelineView<R> {
    /// Gắn tập làm việc vào renderer; mọi loại đều bật ban đầu.
    pub fn mount(working_set: WorkingSet, container: Option<R>) -> Result<Self, TimelineError> {
        let Some(renderer) = container else {
            tracing::error!("timeline container not found, aborting initialization");
            return Err(TimelineError::MissingContainer);
        };

        let active = ActiveCategories::all(working_set.palette());
        let mut view = Self {
            working_set,
            active,
            renderer,
            hovered: None,
        };
        view.refresh();
        Ok(view)
    }

    pub fn set_category(&mut self, category: &str, enabled: bool) {
        self.active.set(category, enabled);
        self.refresh();
    }

    pub fn toggle_category(&mut self, category: &str) -> bool {
        let enabled = self.active.toggle(category);
        self.refresh();
        enabled
    }

    pub fn hover_enter(&mut self, id: &str) -> Option<Tooltip> {
        let tooltip = self.working_set.tooltip(id)?;
        self.hovered = Some(id.to_string());
        Some(tooltip)
    }

    pub fn hover_exit(&mut self) {
        self.hovered = None;
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn active(&self) -> &ActiveCategories {
        &self.active
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn refresh(&mut self) {
        let items = self.working_set.render_items(&self.active);
        tracing::debug!(visible = items.len(), total = self.working_set.len(), "refresh timeline");
        self.renderer.replace_items(items);
    }
}
