pub mod evaluation_routes;
pub mod evaluation_tag_routes;
