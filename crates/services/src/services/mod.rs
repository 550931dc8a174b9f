pub mod assistant;
pub mod claude_api;
pub mod database_validator;
pub mod sortable_view;
