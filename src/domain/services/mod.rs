pub mod corner_case;
pub mod escalation;
pub mod merge_policy;
