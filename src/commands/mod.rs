pub mod bills;
pub mod cart;
pub mod feedback;
pub mod menu;
pub mod orders;
pub mod reports;
