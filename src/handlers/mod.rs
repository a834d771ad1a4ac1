pub mod consultations;
pub mod health;
pub mod metrics;
