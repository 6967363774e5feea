pub mod criteria;
pub mod dataset;
pub mod observation;
pub mod reference;
pub mod station;
