pub mod client;
pub mod events;
pub mod oauth;
pub mod routes;
pub mod verification;
