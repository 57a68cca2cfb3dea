pub mod assessment;
pub mod care_plan;
pub mod diagnosis;
pub mod explanation;
pub mod transaction;
pub mod usage;
pub mod user;
