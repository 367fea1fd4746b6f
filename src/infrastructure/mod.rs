pub mod classifiers;
pub mod http;
pub mod persistence;
pub mod providers;
