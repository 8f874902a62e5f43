pub mod comedor;
pub mod fetcher;
pub mod menu;
pub mod metrics;
pub mod servings;
pub mod users;
