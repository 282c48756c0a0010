use costscope_analysis::{ChartSpec, GroupedRecords, Highlights, SortColumn};
use costscope_config::CostscopeConfig;
use costscope_core::{AggregateSummary, DateRange, EntityRecord};
use costscope_source::DataSource;

use crate::derive::{DerivedView, ViewContext, derive_view};
use crate::page::{PageData, PageKind, PageLoad, PageQuery, load_page, sort_hint_for};
use crate::selection::SelectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Idle,
    Loading,
    /// `stale_pending` is set while a newer load is outstanding and the
    /// previous data is still on display.
    Ready { stale_pending: bool },
}

/// Identifies one issued load. Only the newest ticket may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket {
    seq: u64,
}

impl LoadTicket {
    pub fn seq(self) -> u64 {
        self.seq
    }
}

/// Owns the selection of one page and the view derived from its data.
#[derive(Debug, Clone)]
pub struct ViewCoordinator {
    page: PageKind,
    context: ViewContext,
    selection: SelectionState,
    phase: ViewPhase,
    issued: u64,
    data: Option<PageData>,
    view: DerivedView,
    last_error: Option<String>,
}

impl ViewCoordinator {
    pub fn new(page: PageKind, context: ViewContext, date_range: DateRange) -> Self {
        let selection = SelectionState::for_universe(&context.universe, date_range);
        Self {
            page,
            context,
            selection,
            phase: ViewPhase::Idle,
            issued: 0,
            data: None,
            view: DerivedView::default(),
            last_error: None,
        }
    }

    pub fn from_config(page: PageKind, config: &CostscopeConfig) -> Self {
        Self::new(
            page,
            ViewContext::for_page(page, config),
            config.view.default_range,
        )
    }

    pub fn page(&self) -> PageKind {
        self.page
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn context(&self) -> &ViewContext {
        &self.context
    }

    pub fn data(&self) -> Option<&PageData> {
        self.data.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            date_range: self.selection.date_range,
            sort_hint: sort_hint_for(self.selection.sort),
        }
    }

    pub fn mount(&mut self) -> LoadTicket {
        self.begin_load()
    }

    /// Issues a new ticket; any ticket issued earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.phase = match self.phase {
            ViewPhase::Idle | ViewPhase::Loading => ViewPhase::Loading,
            ViewPhase::Ready { .. } => ViewPhase::Ready {
                stale_pending: true,
            },
        };
        LoadTicket { seq: self.issued }
    }

    /// Applies `load` if `ticket` is the newest one issued. Returns whether it did.
    pub fn complete_load(&mut self, ticket: LoadTicket, load: PageLoad) -> bool {
        if ticket.seq != self.issued {
            tracing::debug!(
                page = %self.page,
                ticket = ticket.seq,
                newest = self.issued,
                "discarding stale load"
            );
            return false;
        }

        self.last_error = load.error_message();
        match self.data.take() {
            Some(previous) => {
                if self.last_error.is_some() {
                    tracing::warn!(
                        page = %self.page,
                        error = self.last_error.as_deref().unwrap_or_default(),
                        "refresh failed in part; keeping previous data for failed parts"
                    );
                }
                self.data = Some(load.merged_over(previous));
            }
            None if load.all_failed() => {
                tracing::warn!(
                    page = %self.page,
                    error = self.last_error.as_deref().unwrap_or_default(),
                    "first load failed; page has no data yet"
                );
                self.phase = ViewPhase::Loading;
                return true;
            }
            None => self.data = Some(load.data),
        }

        self.phase = ViewPhase::Ready {
            stale_pending: false,
        };
        self.recompute();
        true
    }

    /// Loads the current query from `source` and applies it.
    pub async fn refresh(&mut self, source: &dyn DataSource) -> bool {
        let ticket = self.begin_load();
        let query = self.query();
        let load = load_page(source, &query).await;
        self.complete_load(ticket, load)
    }

    pub fn set_selected_platforms<I, S>(&mut self, keys: I) -> Option<LoadTicket>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let next = self
            .selection
            .with_selected_keys(keys, &self.context.universe);
        self.apply(next)
    }

    pub fn toggle_platform(&mut self, key: &str) -> Option<LoadTicket> {
        let next = self.selection.toggled(key, &self.context.universe);
        self.apply(next)
    }

    pub fn set_date_range(&mut self, date_range: DateRange) -> Option<LoadTicket> {
        let next = self.selection.with_date_range(date_range);
        self.apply(next)
    }

    pub fn sort_by(&mut self, column: SortColumn) {
        let next = self.selection.sorted_by(column);
        self.apply(next);
    }

    pub fn set_grouped(&mut self, grouped: bool) {
        let next = self.selection.with_grouped(grouped);
        self.apply(next);
    }

    pub fn set_search(&mut self, search: &str) {
        let next = self.selection.with_search(search);
        self.apply(next);
    }

    /// `None` until some load has produced data.
    pub fn current_view(&self) -> Option<&DerivedView> {
        self.data.as_ref().map(|_| &self.view)
    }

    pub fn current_summary(&self) -> Option<AggregateSummary> {
        self.current_view().map(|view| view.summary)
    }

    pub fn current_ordered_rows(&self) -> &[EntityRecord] {
        &self.view.rows
    }

    pub fn current_groups(&self) -> Option<&GroupedRecords> {
        self.view.groups.as_ref()
    }

    pub fn current_chart_spec(&self) -> Option<&ChartSpec> {
        self.view.chart.as_ref()
    }

    pub fn current_highlights(&self) -> &Highlights {
        &self.view.highlights
    }

    fn apply(&mut self, next: SelectionState) -> Option<LoadTicket> {
        if next == self.selection {
            return None;
        }

        let reload = next.needs_reload_from(&self.selection);
        self.selection = next;
        self.recompute();

        // Before mount there is nothing to refresh.
        (reload && self.phase != ViewPhase::Idle).then(|| self.begin_load())
    }

    fn recompute(&mut self) {
        if let Some(data) = &self.data {
            self.view = derive_view(data, &self.selection, &self.context);
            tracing::debug!(
                page = %self.page,
                rows = self.view.rows.len(),
                "recomputed view"
            );
        }
    }
}
