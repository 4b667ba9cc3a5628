pub mod grid_controls;
pub mod leaderboard;
pub mod modal;
pub mod navbar;
pub mod pixel_details;
pub mod pixel_grid;
pub mod purchase_panel;

pub use grid_controls::GridControls;
pub use leaderboard::Leaderboard;
pub use modal::Modal;
pub use navbar::Navbar;
pub use pixel_details::PixelDetails;
pub use pixel_grid::PixelGrid;
pub use purchase_panel::PurchasePanel;
