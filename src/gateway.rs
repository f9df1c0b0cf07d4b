pub mod api_gateway;
pub mod http_gateway;

#[cfg(test)]
pub(crate) mod fake_gateway;

pub use api_gateway::{ApiGateway, ApiRequest, HttpMethod};
pub use http_gateway::HttpGateway;
