pub mod product_actions;
pub mod synchronizer;
