pub mod metrics_bar;
pub mod results_panel;
pub mod selector;
pub mod typing_area;
