pub mod capabilities;
pub mod onboard;
pub mod run;
