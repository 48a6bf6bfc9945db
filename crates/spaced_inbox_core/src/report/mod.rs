//! Outputs produced for the user outside the database.

pub mod locations;
pub mod review_load;
