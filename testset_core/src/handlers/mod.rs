pub mod evaluators;
pub mod health;
pub mod routes;
pub mod session;
pub mod testsets;
