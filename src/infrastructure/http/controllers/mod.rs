pub mod corner_cases;
pub mod tickets;
