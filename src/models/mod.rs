mod visit;

pub use visit::{utc_date, VisitEvent};
