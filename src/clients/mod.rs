pub mod api_football;
pub mod web_push;
