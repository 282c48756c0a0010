mod coordinator;
mod derive;
mod page;
mod selection;

pub use coordinator::{LoadTicket, ViewCoordinator, ViewPhase};
pub use derive::{DerivedView, ViewContext, derive_view};
pub use page::{
    LoadFailure, PageData, PageKind, PageLoad, PageOverview, PageQuery, load_page, sort_hint_for,
};
pub use selection::SelectionState;
