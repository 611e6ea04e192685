pub mod completion;
pub mod day_index;
pub mod filter;
pub mod month_grid;

pub use completion::is_route_completed;
pub use day_index::{DaySummary, RouteDayIndex};
pub use filter::filter_routes;
pub use month_grid::{CalendarDay, GRID_CELLS, add_months, month_grid, month_label};
